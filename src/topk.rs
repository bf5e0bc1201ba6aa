//! Ranking utilities.

use ordered_float::NotNan;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// The `k` highest finite scores as `(vertex, score)`, best first.
///
/// Ties go to the lower vertex id. Relatedness scores may be negative, so unlike a
/// centrality ranking nothing is dropped for being `<= 0`.
pub fn top_k(scores: &[f64], k: usize) -> Vec<(usize, f64)> {
    top_k_filtered(scores, k, |_| true)
}

/// [`top_k`] restricted to vertices for which `keep(vertex)` holds.
pub fn top_k_filtered<F>(scores: &[f64], k: usize, keep: F) -> Vec<(usize, f64)>
where
    F: Fn(usize) -> bool,
{
    if k == 0 || scores.is_empty() { return Vec::new(); }
    let mut heap = BinaryHeap::with_capacity(k + 1);
    for (i, &score) in scores.iter().enumerate() {
        if !score.is_finite() || !keep(i) { continue; }
        let Ok(s) = NotNan::new(score) else { continue };
        // Min-heap on (score, Reverse(id)): the smallest score, then the largest id, goes first.
        let entry = Reverse((s, Reverse(i)));
        if heap.len() < k {
            heap.push(entry);
        } else if let Some(min) = heap.peek() {
            if entry < *min {
                heap.pop();
                heap.push(entry);
            }
        }
    }
    let mut results: Vec<(usize, f64)> =
        heap.into_iter().map(|Reverse((s, Reverse(i)))| (i, s.into_inner())).collect();
    results.sort_unstable_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    results
}
