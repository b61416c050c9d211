// ============================================================
// Layer 3 — Encoded Samples
// ============================================================
// Index-encoded, fixed-length examples handed to the model.
//
// Every sequence here has already been padded or truncated to
// the configured max_len, so samples can be stacked into a
// [batch, max_len] tensor without any further work.

use serde::{Deserialize, Serialize};

/// (question, good answer, bad answer) fed to the hinge-loss graph.
///
/// `label` is a constant placeholder. The loss is computed from the
/// two similarity scores, never against the label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingTriple {
    pub question: Vec<u32>,
    pub good:     Vec<u32>,
    pub bad:      Vec<u32>,
    pub label:    u8,
}

impl RankingTriple {
    pub fn new(question: Vec<u32>, good: Vec<u32>, bad: Vec<u32>) -> Self {
        Self { question, good, bad, label: 0 }
    }
}

/// A single (question, answer) pair with a binary relevance target.
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledPair {
    pub question: Vec<u32>,
    pub answer:   Vec<u32>,
    /// 1 = good answer, 0 = bad answer
    pub label:    u8,
}

#[allow(dead_code)]
impl LabeledPair {
    pub fn is_good(&self) -> bool {
        self.label == 1
    }
}

/// A question with an ordered list of candidates, one of them correct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationPool {
    pub question:      Vec<u32>,
    pub candidates:    Vec<Vec<u32>>,
    pub correct_index: usize,
}

impl EvaluationPool {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }
}
