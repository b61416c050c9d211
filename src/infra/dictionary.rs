// ============================================================
// Layer 6 — Dictionary (Vocabulary Store)
// ============================================================
// Word-level vocabulary built by streaming the corpus text through
// the same cleaning + pre-tokenisation used at encode time.
//
// Reserved ids:
//   0 → [PAD]  fill value for padded sequences
//   1 → [UNK]  any token never seen by add()
// Real tokens are numbered from 2 upward in the
// order they are first seen.
//
// Persistence reuses the HuggingFace tokenizer.json layout with a
// WordLevel model, so a saved dictionary can also be opened with
// `tokenizers::Tokenizer::from_file`. Ids are only stable within
// one saved file: rebuilding from a different corpus reassigns them
// and invalidates anything encoded with the old file.

use anyhow::{Context, Result};
use std::{
    collections::HashMap,
    path::Path,
};
use tokenizers::{
    pre_tokenizers::whitespace::Whitespace,
    OffsetReferential, OffsetType, PreTokenizedString, PreTokenizer, Tokenizer,
};

use crate::data::preprocessor::Preprocessor;
use crate::domain::traits::{Persistable, SequenceEncoder};

pub const PAD_TOKEN: &str = "[PAD]";
pub const UNK_TOKEN: &str = "[UNK]";

pub const PAD_ID: u32 = 0;
pub const UNK_ID: u32 = 1;

/// Clean `text` and split it into lowercase word / punctuation tokens.
pub fn tokenize(text: &str) -> Result<Vec<String>> {
    let cleaned = Preprocessor::new().clean(text);
    let mut pre = PreTokenizedString::from(cleaned.as_str());
    Whitespace::default()
        .pre_tokenize(&mut pre)
        .map_err(|e| anyhow::anyhow!("Pre-tokenisation failed: {e}"))?;

    Ok(pre
        .get_splits(OffsetReferential::Original, OffsetType::Byte)
        .into_iter()
        .map(|(s, _, _)| s.to_string())
        .collect())
}

#[derive(Debug, Clone)]
pub struct Dictionary {
    token_to_id: HashMap<String, u32>,
    id_to_token: Vec<String>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self {
            token_to_id: HashMap::from([
                (PAD_TOKEN.to_string(), PAD_ID),
                (UNK_TOKEN.to_string(), UNK_ID),
            ]),
            id_to_token: vec![PAD_TOKEN.to_string(), UNK_TOKEN.to_string()],
        }
    }

    /// Build from a list of texts in one pass.
    pub fn from_texts<S: AsRef<str>>(texts: &[S]) -> Result<Self> {
        let mut dic = Self::new();
        for text in texts {
            dic.add(text.as_ref())?;
        }
        Ok(dic)
    }

    /// Load the dictionary at `path`, or build it from `texts` and save it there.
    pub fn load_or_build<S: AsRef<str>>(path: &Path, texts: &[S]) -> Result<Self> {
        let path_str = path.to_string_lossy();
        if path.exists() {
            tracing::info!("Loading existing vocabulary from '{}'", path.display());
            Self::load(&path_str)
        } else {
            tracing::info!("Building new vocabulary from {} texts", texts.len());
            let dic = Self::from_texts(texts)?;
            dic.save(&path_str)?;
            Ok(dic)
        }
    }

    /// Register every unseen token in `text`.
    pub fn add(&mut self, text: &str) -> Result<()> {
        for token in tokenize(text)? {
            if !self.token_to_id.contains_key(&token) {
                let id = self.id_to_token.len() as u32;
                self.token_to_id.insert(token.clone(), id);
                self.id_to_token.push(token);
            }
        }
        Ok(())
    }

    /// Map `text` to ids; unseen tokens become UNK_ID.
    pub fn convert(&self, text: &str) -> Result<Vec<u32>> {
        Ok(tokenize(text)?
            .iter()
            .map(|t| self.id(t).unwrap_or(UNK_ID))
            .collect())
    }

    pub fn id(&self, token: &str) -> Option<u32> {
        self.token_to_id.get(token).copied()
    }

    pub fn token(&self, id: u32) -> Option<&str> {
        self.id_to_token.get(id as usize).map(String::as_str)
    }

    /// Reverse mapping for logging. Padding is skipped, unknown ids print as `X`.
    pub fn decode(&self, ids: &[u32]) -> String {
        ids.iter()
            .filter(|&&id| id != PAD_ID)
            .map(|&id| self.token(id).unwrap_or("X"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Vocabulary size including the reserved tokens.
    pub fn len(&self) -> usize {
        self.id_to_token.len()
    }

    fn from_vocab(vocab: HashMap<String, u32>) -> Result<Self> {
        anyhow::ensure!(
            vocab.get(PAD_TOKEN) == Some(&PAD_ID) && vocab.get(UNK_TOKEN) == Some(&UNK_ID),
            "Vocabulary file must map {PAD_TOKEN} to {PAD_ID} and {UNK_TOKEN} to {UNK_ID}"
        );

        let mut id_to_token = vec![String::new(); vocab.len()];
        for (token, &id) in &vocab {
            let slot = id_to_token
                .get_mut(id as usize)
                .with_context(|| format!("Vocabulary id {id} for '{token}' is out of range"))?;
            anyhow::ensure!(slot.is_empty(), "Vocabulary id {id} is assigned twice");
            *slot = token.clone();
        }

        Ok(Self { token_to_id: vocab, id_to_token })
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceEncoder for Dictionary {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        self.convert(text)
    }

    fn pad_value(&self) -> u32 {
        PAD_ID
    }
}

impl Persistable for Dictionary {
    /// Write the vocabulary as a WordLevel tokenizer.json.
    fn save(&self, path: &str) -> Result<()> {
        let path = Path::new(path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create vocabulary directory '{}'", parent.display()))?;
        }

        let vocab: serde_json::Map<String, serde_json::Value> = self
            .id_to_token
            .iter()
            .enumerate()
            .map(|(id, token)| (token.clone(), serde_json::json!(id)))
            .collect();

        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [
                {"id": PAD_ID, "content": PAD_TOKEN, "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
                {"id": UNK_ID, "content": UNK_TOKEN, "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}
            ],
            "normalizer": {
                "type": "Lowercase"
            },
            "pre_tokenizer": {
                "type": "Whitespace"
            },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": UNK_TOKEN
            }
        });

        std::fs::write(path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| format!("Cannot write vocabulary to '{}'", path.display()))?;

        tracing::info!("Vocabulary of {} tokens saved to '{}'", self.len(), path.display());
        Ok(())
    }

    fn load(path: &str) -> Result<Self> {
        let tokenizer = Tokenizer::from_file(path)
            .map_err(|e| anyhow::anyhow!("Cannot load vocabulary from '{}': {}", path, e))?;
        let dic = Self::from_vocab(tokenizer.get_vocab(true))?;
        tracing::debug!("Loaded vocabulary of {} tokens from '{}'", dic.len(), path);
        Ok(dic)
    }
}
