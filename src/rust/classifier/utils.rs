use ndarray::{Array1, ArrayView1};

pub(crate) fn normalize_vector(vec: ArrayView1<f32>) -> Array1<f32> {
    let norm: f32 = vec.iter().map(|&x| x * x).sum::<f32>().sqrt();
    if norm > 1e-10 {
        vec.to_owned() / norm
    } else {
        Array1::zeros(vec.len())
    }
}

pub(crate) fn euclidean_distance(a: ArrayView1<f32>, b: ArrayView1<f32>) -> f32 {
    let diff = &a - &b;
    diff.dot(&diff).sqrt()
}

/// `1 - cos(a, b)`; zero vectors are treated as maximally distant from everything.
pub(crate) fn cosine_distance(a: ArrayView1<f32>, b: ArrayView1<f32>) -> f32 {
    let a = normalize_vector(a);
    let b = normalize_vector(b);
    1.0 - a.dot(&b)
}
