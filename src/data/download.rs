// ============================================================
// Layer 4 — Corpus Download
// ============================================================
// Fetches a corpus file over HTTP when it is missing locally.
// Only the LiveQA judgments have a public URL; InsuranceQA must
// be provided on disk.
//
// The body is streamed into a `.part` file and renamed once
// complete, so an interrupted download never leaves a truncated
// corpus behind that would later fail the record-count check.

use std::{fs, path::Path, time::Duration};

use crate::data::error::CorpusError;

/// Download `url` into `dest`, creating parent directories as needed.
pub fn download_to_file(url: &str, dest: &Path) -> Result<u64, CorpusError> {
    let fail = |reason: String| CorpusError::Download { url: url.to_string(), reason };

    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| CorpusError::io(parent, e))?;
        }
    }

    tracing::info!("Downloading '{}' to '{}'", url, dest.display());

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(300))
        .build()
        .map_err(|e| fail(e.to_string()))?;

    let mut response = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(|e| fail(e.to_string()))?;

    let partial = dest.with_extension("part");
    let mut file = fs::File::create(&partial).map_err(|e| CorpusError::io(&partial, e))?;
    let copied = response.copy_to(&mut file);
    drop(file);

    let bytes = match copied {
        Ok(bytes) => bytes,
        Err(e) => {
            if let Err(rm) = fs::remove_file(&partial) {
                tracing::warn!("Could not remove '{}': {}", partial.display(), rm);
            }
            return Err(fail(e.to_string()));
        }
    };

    fs::rename(&partial, dest).map_err(|e| CorpusError::io(dest, e))?;
    tracing::info!("Downloaded {} bytes", bytes);
    Ok(bytes)
}
