// ============================================================
// Layer 2 — Text Encoder
// ============================================================
// Rebuilds the encoder a checkpoint was trained with, straight
// from its saved TrainConfig:
//
//   LiveQA      → Dictionary at cfg.vocabulary_path, pad = [PAD]
//   InsuranceQA → EmbeddingTable at cfg.embeddings_path, pad = OOV row

use anyhow::{Context, Result};
use std::path::Path;

use crate::application::train_use_case::TrainConfig;
use crate::data::{padding::pad_sequence, CorpusFormat};
use crate::domain::traits::{Persistable, SequenceEncoder};
use crate::infra::{dictionary::Dictionary, embeddings::EmbeddingTable};

pub enum TextEncoder {
    Dictionary(Dictionary),
    Embeddings(EmbeddingTable),
}

impl TextEncoder {
    pub fn from_config(cfg: &TrainConfig) -> Result<Self> {
        match cfg.format {
            CorpusFormat::LiveQa => {
                let path = cfg.resolved_vocabulary_path();
                let dictionary = Dictionary::load(&path.to_string_lossy())
                    .with_context(|| format!("Cannot load vocabulary '{}'", path.display()))?;
                Ok(Self::Dictionary(dictionary))
            }
            CorpusFormat::InsuranceQa => {
                let path = cfg
                    .embeddings_path
                    .as_deref()
                    .context("Checkpoint config has no embeddings_path")?;
                Ok(Self::Embeddings(EmbeddingTable::load(Path::new(path))?))
            }
        }
    }

    /// Encode then post-pad / post-truncate to `max_len`.
    pub fn encode_padded(&self, text: &str, max_len: usize) -> Result<Vec<u32>> {
        Ok(pad_sequence(&self.encode(text)?, max_len, self.pad_value()))
    }

    /// Readable text for logging; unknown ids render as `X`.
    pub fn decode(&self, ids: &[u32]) -> String {
        match self {
            Self::Dictionary(d) => d.decode(ids),
            Self::Embeddings(e) => e.revert(ids),
        }
    }
}

impl SequenceEncoder for TextEncoder {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        match self {
            Self::Dictionary(d) => d.encode(text),
            Self::Embeddings(e) => e.encode(text),
        }
    }

    fn pad_value(&self) -> u32 {
        match self {
            Self::Dictionary(d) => d.pad_value(),
            Self::Embeddings(e) => e.pad_value(),
        }
    }
}
