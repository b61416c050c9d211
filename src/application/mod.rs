// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one goal each:
// training, evaluating, or ranking answers.
//
// Rules for this layer:
//   - No model math here (Layer 5)
//   - No printing here (Layer 1)
//   - No file formats here (Layers 4 and 6)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The training workflow
pub mod train_use_case;

// Accuracy and MRR for a trained checkpoint
pub mod evaluate_use_case;

// Ranks free-text candidates for one question
pub mod rank_use_case;

// Rebuilds a checkpoint's text encoder
pub mod text_encoder;
