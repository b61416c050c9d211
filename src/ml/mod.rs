// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn model code lives here.
//
//   attention_lstm.rs — LSTM whose hidden state is gated by the
//                       question encoding at every step
//
//   model.rs          — the ranking network: shared embedding,
//                       biLSTM question encoder, attentive biLSTM
//                       answer encoder, cosine score, hinge loss
//
//   trainer.rs        — RMSProp training loop with validation,
//                       per-epoch checkpoints and metrics
//
//   scorer.rs         — loads a checkpoint and scores
//                       (question, answer) pairs in batches
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Tan et al. (2016) Improved Representation Learning
//            for Question Answer Matching

/// Attention-gated recurrent layer
pub mod attention_lstm;

/// Attention LSTM ranking model
pub mod model;

/// Full training loop with validation and checkpointing
pub mod trainer;

/// Checkpoint-backed pair scoring
pub mod scorer;
