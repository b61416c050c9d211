// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between the raw corpus files and tensor batches.
//
//   liveqa / insuranceqa files
//       │
//       ▼
//   LiveQaLoader / InsuranceQaCorpus → records, answer pool
//       │
//       ▼
//   Preprocessor + Dictionary        → token ids (infra layer)
//       │
//       ▼
//   sampler + padding                → fixed-length triples / pools
//       │
//       ▼
//   TripleDataset → TripleBatcher    → Burn DataLoader
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub mod error;

/// HTTP fallback for the LiveQA judgments
pub mod download;

/// TREC LiveQA judgments parser
pub mod liveqa;

/// InsuranceQA token-id files
pub mod insuranceqa;

/// Cleans raw question / answer text
pub mod preprocessor;

/// Post-padding / post-truncating to max_len
pub mod padding;

/// Balanced pairs, negative sampling, evaluation pools
pub mod sampler;

/// Implements Burn's Dataset trait for ranking triples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Holds out the trailing fraction as the validation set
pub mod splitter;

pub use error::CorpusError;

/// Which corpus a run trains on. Each format has its own loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CorpusFormat {
    /// TREC LiveQA 2015 relevance judgments
    #[value(name = "liveqa")]
    LiveQa,
    /// InsuranceQA token-id files
    #[value(name = "insuranceqa")]
    InsuranceQa,
}

impl CorpusFormat {
    /// Token length used when `--max-len` is not given.
    pub fn default_max_len(self) -> usize {
        match self {
            CorpusFormat::LiveQa      => 100,
            CorpusFormat::InsuranceQa => 40,
        }
    }
}
