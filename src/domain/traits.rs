// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams between the layers. The application layer works
// against these traits so LiveQA (dictionary ids) and InsuranceQA
// (embedding ids) can share the same rank / evaluate workflow.

use anyhow::Result;

// ─── SequenceEncoder ─────────────────────────────────────────────────────────
/// Anything that can turn raw text into vocabulary indices.
///
/// Implementations:
///   - Dictionary     → ids assigned while reading the LiveQA corpus
///   - EmbeddingTable → ids of the pretrained word vectors
pub trait SequenceEncoder {
    /// Map text to indices, one per token. No padding is applied.
    fn encode(&self, text: &str) -> Result<Vec<u32>>;

    /// The value used to pad encoded sequences to a fixed length.
    fn pad_value(&self) -> u32;
}

// ─── AnswerRanker ────────────────────────────────────────────────────────────
/// Any component that can order candidate answers for a question.
pub trait AnswerRanker {
    /// Returns `(candidate index, score)` sorted best first.
    fn rank(&self, question: &str, candidates: &[String]) -> Result<Vec<(usize, f32)>>;
}

// ─── Persistable ─────────────────────────────────────────────────────────────
/// Any component whose state can be saved and restored from disk.
///
/// Implementations:
///   - Dictionary → saves/loads the token ↔ index mapping
pub trait Persistable: Sized {
    fn save(&self, path: &str) -> Result<()>;

    fn load(path: &str) -> Result<Self>;
}
