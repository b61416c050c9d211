// ============================================================
// Layer 3 — Ranking Metrics
// ============================================================
// Pure functions over similarity scores. No model code here:
// the evaluate use case runs the scorer and hands the numbers in.
//
//   accuracy_by_margin   — how often good beats bad
//   average_ranks        — 1-based ranks, ties share the average
//   reciprocal_rank      — 1 / (max(r) - r[correct] + 1)
//   mean_reciprocal_rank — average over all pools
//
// With no ties, max(r) is the pool size and the formula equals
// the usual "position from the top" reciprocal rank. With ties
// the averaged ranks make it a fractional value.

/// Fraction of examples where the good score strictly exceeds the bad score.
/// Scores are paired by position; extra entries on either side are ignored.
pub fn accuracy_by_margin(good: &[f32], bad: &[f32]) -> f64 {
    let total = good.len().min(bad.len());
    if total == 0 {
        return 0.0;
    }
    let correct = good
        .iter()
        .zip(bad)
        .filter(|(g, b)| g > b)
        .count();
    correct as f64 / total as f64
}

/// Rank scores in ascending order starting at 1. Tied scores all receive
/// the mean of the ranks they span.
pub fn average_ranks(scores: &[f32]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut ranks = vec![0.0f64; scores.len()];
    let mut i = 0usize;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // positions i..=j share ranks (i+1)..=(j+1)
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg;
        }
        i = j + 1;
    }
    ranks
}

/// Reciprocal rank of the candidate at `correct` within one pool.
pub fn reciprocal_rank(scores: &[f32], correct: usize) -> f64 {
    if correct >= scores.len() {
        return 0.0;
    }
    let ranks = average_ranks(scores);
    let max_rank = ranks.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    1.0 / (max_rank - ranks[correct] + 1.0)
}

/// Mean reciprocal rank over `(scores, correct_index)` pools.
pub fn mean_reciprocal_rank<'a, I>(pools: I) -> f64
where
    I: IntoIterator<Item = (&'a [f32], usize)>,
{
    let mut sum   = 0.0f64;
    let mut count = 0usize;
    for (scores, correct) in pools {
        sum   += reciprocal_rank(scores, correct);
        count += 1;
    }
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// The trailing `n` items, or everything when `n` is `None`.
pub fn last_n<T>(items: &[T], n: Option<usize>) -> &[T] {
    match n {
        Some(n) if n < items.len() => &items[items.len() - n..],
        _ => items,
    }
}
