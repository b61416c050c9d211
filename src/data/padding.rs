// ============================================================
// Layer 4 — Sequence Padding
// ============================================================
// Every sequence the model sees has exactly `max_len` entries.
//
//   shorter → the fill value is appended   (post-padding)
//   longer  → the tail is cut off          (post-truncating)
//
// Example with max_len = 5, value = 0:
//   [7, 8]             → [7, 8, 0, 0, 0]
//   [1, 2, 3, 4, 5, 6] → [1, 2, 3, 4, 5]

/// Pad or truncate one sequence to exactly `max_len` entries.
pub fn pad_sequence(seq: &[u32], max_len: usize, value: u32) -> Vec<u32> {
    let mut out = Vec::with_capacity(max_len);
    out.extend(seq.iter().take(max_len).copied());
    out.resize(max_len, value);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_sequence_is_post_padded() {
        assert_eq!(pad_sequence(&[7, 8], 5, 0), vec![7, 8, 0, 0, 0]);
    }

    #[test]
    fn test_long_sequence_is_post_truncated() {
        assert_eq!(pad_sequence(&[1, 2, 3, 4, 5, 6], 5, 0), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_custom_fill_value() {
        assert_eq!(pad_sequence(&[], 3, 22295), vec![22295, 22295, 22295]);
    }

    #[test]
    fn test_every_output_has_max_len() {
        let seqs = vec![vec![], vec![1], vec![1, 2, 3, 4, 5, 6, 7, 8, 9]];
        for seq in &seqs {
            assert_eq!(pad_sequence(seq, 4, 0).len(), 4);
        }
    }
}
