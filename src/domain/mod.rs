// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, traits and pure functions describing
// the ranking problem:
//
//   question.rs — question / answer records read from a corpus
//   sample.rs   — index-encoded triples, pairs and pools
//   ranking.rs  — accuracy and reciprocal-rank metrics
//   traits.rs   — encoder / ranker / persistence seams
//
// No Burn types, no file I/O in here.

pub mod question;

pub mod sample;

pub mod ranking;

pub mod traits;
