//! Offline ranking metrics over a recommended list and a relevant set
use std::collections::HashSet;
use std::hash::Hash;

fn hits<T: Eq + Hash>(recommended: &[T], relevant: &HashSet<T>, k: usize) -> usize {
    recommended
        .iter()
        .take(k)
        .filter(|item| relevant.contains(*item))
        .collect::<HashSet<_>>()
        .len()
}

/// Distinct relevant items among the first `k`, divided by `k`
pub fn precision_at_k<T: Eq + Hash>(recommended: &[T], relevant: &HashSet<T>, k: usize) -> f64 {
    if k == 0 {
        return 0.0;
    }
    hits(recommended, relevant, k) as f64 / k as f64
}

/// Distinct relevant items among the first `k`, divided by the relevant set size
pub fn recall_at_k<T: Eq + Hash>(recommended: &[T], relevant: &HashSet<T>, k: usize) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }
    hits(recommended, relevant, k) as f64 / relevant.len() as f64
}

/// Normalized discounted cumulative gain with binary gains
pub fn ndcg_at_k<T: Eq + Hash>(recommended: &[T], relevant: &HashSet<T>, k: usize) -> f64 {
    let gains: Vec<f64> = recommended
        .iter()
        .take(k)
        .map(|item| if relevant.contains(item) { 1.0 } else { 0.0 })
        .collect();

    let mut ideal = gains.clone();
    ideal.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

    let idcg = discounted(&ideal);
    if idcg == 0.0 {
        return 0.0;
    }
    discounted(&gains) / idcg
}

fn discounted(gains: &[f64]) -> f64 {
    gains
        .iter()
        .enumerate()
        .map(|(i, gain)| gain / (i as f64 + 2.0).log2())
        .sum()
}
