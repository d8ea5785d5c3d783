//! Cosine similarity over embedding vectors

/// Cosine similarity `dot(a, b) / (|a| |b|)`.
///
/// `None` when the lengths differ or either norm is zero or non-finite;
/// callers decide whether that excludes the pair or aborts.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);

    let usable = |n: f32| n.is_finite() && n > 0.0;
    if usable(norm_a) && usable(norm_b) && dot.is_finite() {
        Some((dot / (norm_a * norm_b)).clamp(-1.0, 1.0))
    } else {
        None
    }
}

pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}
