/// Sparse vector as (term index, weight) pairs sorted by index
pub type SparseVector = Vec<(usize, f64)>;

/// Cosine similarity between two dense vectors of equal length.
///
/// A zero-norm operand yields 0.0.
pub fn cosine_dense(a: &[f64], b: &[f64]) -> f64 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Cosine similarity between two index-sorted sparse vectors
pub fn cosine_sparse(a: &[(usize, f64)], b: &[(usize, f64)]) -> f64 {
    let norm_a = sparse_norm(a);
    let norm_b = sparse_norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    sparse_dot(a, b) / (norm_a * norm_b)
}

fn sparse_dot(a: &[(usize, f64)], b: &[(usize, f64)]) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut dot = 0.0;
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                dot += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    dot
}

fn sparse_norm(v: &[(usize, f64)]) -> f64 {
    v.iter().map(|(_, w)| w * w).sum::<f64>().sqrt()
}
