use std::cmp::Ordering;
use serde::{Deserialize, Serialize};
use log::debug;

use super::error::ClassifierError;
use super::store::{ExampleStore, FeatureVector};
use super::utils::{cosine_distance, euclidean_distance};

/// Number of neighbors consulted when no `k` is configured
pub const DEFAULT_K: usize = 3;

/// Metric used to rank stored examples against a query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distance {
    #[default]
    Euclidean,
    /// `1 - cosine similarity`, insensitive to vector magnitude
    Cosine,
}

impl Distance {
    pub(crate) fn between(&self, a: &FeatureVector, b: &FeatureVector) -> f32 {
        match self {
            Self::Euclidean => euclidean_distance(a.view(), b.view()),
            Self::Cosine => cosine_distance(a.view(), b.view()),
        }
    }
}

/// Outcome of a single classification.
///
/// Every label known to the store has an entry, in the store's enumeration
/// order; weights are vote fractions and sum to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfidenceResult {
    /// The label with the highest confidence
    pub label: String,
    /// `(label, confidence)` for every known label
    pub confidences: Vec<(String, f32)>,
}

impl ConfidenceResult {
    /// Confidence for `label`, 0 for labels the classifier has never seen
    pub fn confidence(&self, label: &str) -> f32 {
        self.confidences
            .iter()
            .find(|(l, _)| l == label)
            .map_or(0.0, |(_, c)| *c)
    }

    /// Confidence of the predicted label
    pub fn top_confidence(&self) -> f32 {
        self.confidence(&self.label)
    }
}

/// A k-nearest-neighbors classifier over the examples of an [`ExampleStore`].
///
/// The classifier holds only its parameters; the examples are read from the
/// store passed to [`predict`](Self::predict), so training and inference can
/// never disagree about the data.
///
/// ```
/// use emoji_knn::{ExampleStore, KnnClassifier};
///
/// let mut store = ExampleStore::new();
/// store.add_example("Smile", vec![1.0, 0.0])?;
/// store.add_example("Smile", vec![0.9, 0.1])?;
/// store.add_example("Sunglasses", vec![0.0, 1.0])?;
///
/// let classifier = KnnClassifier::builder().with_k(3)?.build();
/// let result = classifier.predict(&vec![0.95, 0.05].into(), &store)?;
/// assert_eq!(result.label, "Smile");
/// # Ok::<(), emoji_knn::ClassifierError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct KnnClassifier {
    pub(crate) k: usize,
    pub(crate) distance: Distance,
}

impl Default for KnnClassifier {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            distance: Distance::default(),
        }
    }
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<KnnClassifier>();
        assert_send_sync::<ExampleStore>();
    }
};

impl KnnClassifier {
    /// Creates a new KnnClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::KnnClassifierBuilder {
        super::builder::KnnClassifierBuilder::new()
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn distance(&self) -> Distance {
        self.distance
    }

    /// Classifies `query` against `store` using the configured `k`
    pub fn predict(
        &self,
        query: &FeatureVector,
        store: &ExampleStore,
    ) -> Result<ConfidenceResult, ClassifierError> {
        self.predict_with_k(query, store, self.k)
    }

    /// Classifies `query` by majority vote among its `k` nearest examples.
    ///
    /// When the store holds fewer than `k` examples all of them vote. Equal
    /// distances and equal vote counts are both resolved in the store's
    /// enumeration order.
    ///
    /// # Errors
    /// - `NoExamples` if the store is empty
    /// - `InvalidInput` if `k` is 0 or the query is malformed or of the
    ///   wrong dimensionality
    pub fn predict_with_k(
        &self,
        query: &FeatureVector,
        store: &ExampleStore,
        k: usize,
    ) -> Result<ConfidenceResult, ClassifierError> {
        if store.is_empty() {
            return Err(ClassifierError::NoExamples);
        }
        if k == 0 {
            return Err(ClassifierError::InvalidInput("k must be at least 1".into()));
        }
        query.check(store.dimension()).map_err(ClassifierError::InvalidInput)?;

        // (label index, distance) in enumeration order; the stable sort keeps
        // that order among equal distances
        let mut neighbors: Vec<(usize, f32)> = store
            .iter()
            .enumerate()
            .flat_map(|(idx, (_, examples))| {
                examples.iter().map(move |e| (idx, self.distance.between(query, e)))
            })
            .collect();
        neighbors.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        neighbors.truncate(k);

        let mut votes = vec![0usize; store.num_labels()];
        for (idx, _) in &neighbors {
            votes[*idx] += 1;
        }
        let voters = neighbors.len() as f32;

        let confidences: Vec<(String, f32)> = store
            .labels()
            .zip(&votes)
            .map(|(label, &v)| (label.to_string(), v as f32 / voters))
            .collect();

        // First maximum wins
        let mut best = 0;
        for (idx, &v) in votes.iter().enumerate() {
            if v > votes[best] {
                best = idx;
            }
        }
        let label = confidences[best].0.clone();
        debug!("Predicted '{}' from {} neighbors", label, neighbors.len());

        Ok(ConfidenceResult { label, confidences })
    }
}
