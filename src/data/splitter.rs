// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Holds out the trailing fraction of a sequence as the
// validation set (default 80% / 20%), without reordering.
//
// The held-out tail depends only on the input order and the
// fraction, so `evaluate` can rebuild exactly the rows that
// training never saw. Training order is shuffled later by the
// DataLoader.
//
// Reference: Keras `validation_split` (last fraction, unshuffled)

/// Split `items` into (head, tail) where the tail is the last
/// `round(len * val_fraction)` items.
pub fn hold_out_tail<T>(mut items: Vec<T>, val_fraction: f64) -> (Vec<T>, Vec<T>) {
    let total    = items.len();
    let held     = ((total as f64) * val_fraction).round() as usize;
    let split_at = total - held.min(total);

    let val = items.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} validation ({}% / {}%)",
        items.len(),
        val.len(),
        (items.len() * 100) / total.max(1),
        (val.len()   * 100) / total.max(1),
    );

    (items, val)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let (train, val)      = hold_out_tail(items, 0.2);
        assert_eq!(train.len(), 80);
        assert_eq!(val.len(),   20);
    }

    #[test]
    fn test_tail_is_held_out_in_order() {
        let (train, val) = hold_out_tail((0..10).collect::<Vec<usize>>(), 0.3);
        assert_eq!(train, (0..7).collect::<Vec<_>>());
        assert_eq!(val, vec![7, 8, 9]);
    }

    #[test]
    fn test_split_is_reproducible() {
        let (_, a) = hold_out_tail((0..30).collect::<Vec<usize>>(), 0.5);
        let (_, b) = hold_out_tail((0..30).collect::<Vec<usize>>(), 0.5);
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_fraction_holds_out_nothing() {
        let (train, val) = hold_out_tail(vec![1, 2, 3], 0.0);
        assert_eq!(train, vec![1, 2, 3]);
        assert!(val.is_empty());
    }

    #[test]
    fn test_empty_dataset() {
        let items: Vec<usize> = Vec::new();
        let (train, val)      = hold_out_tail(items, 0.2);
        assert!(train.is_empty());
        assert!(val.is_empty());
    }
}
