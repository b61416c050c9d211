// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns shared by training, evaluation and
// ranking:
//
//   checkpoint.rs  — weights via Burn's CompactRecorder, plus the
//                    TrainConfig JSON needed to rebuild the model
//
//   dictionary.rs  — word ↔ id vocabulary, persisted as a
//                    HuggingFace WordLevel tokenizer.json
//
//   embeddings.rs  — word2vec-format pretrained vectors, the OOV
//                    row, and alignment to a dictionary
//
//   metrics.rs     — per-epoch CSV log
//
// Reference: Rust Book §7 (Modules)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Vocabulary building, saving, and loading
pub mod dictionary;

/// Pretrained word vectors
pub mod embeddings;

/// Training metrics CSV logger
pub mod metrics;
