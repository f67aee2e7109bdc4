use log::info;

use super::classifier::{Distance, KnnClassifier, DEFAULT_K};
use super::error::ClassifierError;

/// Largest neighborhood accepted by [`KnnClassifierBuilder::with_k`]
pub const MAX_K: usize = 100;

/// A builder for constructing a KnnClassifier with a fluent interface.
#[derive(Debug, Clone)]
pub struct KnnClassifierBuilder {
    k: usize,
    distance: Distance,
}

impl Default for KnnClassifierBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl KnnClassifierBuilder {
    /// Creates a builder with `k = 3` and Euclidean distance
    ///
    /// # Example
    /// ```
    /// use emoji_knn::KnnClassifierBuilder;
    ///
    /// let classifier = KnnClassifierBuilder::new().build();
    /// assert_eq!(classifier.k(), 3);
    /// ```
    pub fn new() -> Self {
        Self {
            k: DEFAULT_K,
            distance: Distance::default(),
        }
    }

    /// Sets the number of neighbors that vote on a prediction
    ///
    /// # Arguments
    /// * `k` - Neighborhood size, between 1 and 100
    ///
    /// # Returns
    /// * `Result<Self, ClassifierError>` - The builder instance if successful, or
    ///   `InvalidInput` if `k` is 0 or larger than 100
    ///
    /// # Example
    /// ```
    /// use emoji_knn::KnnClassifierBuilder;
    ///
    /// assert!(KnnClassifierBuilder::new().with_k(5).is_ok());
    /// assert!(KnnClassifierBuilder::new().with_k(0).is_err());
    /// ```
    pub fn with_k(mut self, k: usize) -> Result<Self, ClassifierError> {
        if k == 0 {
            return Err(ClassifierError::InvalidInput("k must be at least 1".into()));
        }
        if k > MAX_K {
            return Err(ClassifierError::InvalidInput(format!(
                "k is too large ({}, max is {})",
                k, MAX_K
            )));
        }
        self.k = k;
        Ok(self)
    }

    /// Sets the distance metric used to rank neighbors
    pub fn with_distance(mut self, distance: Distance) -> Self {
        self.distance = distance;
        self
    }

    /// Builds the final KnnClassifier
    pub fn build(self) -> KnnClassifier {
        info!("Building KNN classifier (k = {}, distance = {:?})", self.k, self.distance);
        KnnClassifier {
            k: self.k,
            distance: self.distance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let classifier = KnnClassifierBuilder::new().build();
        assert_eq!(classifier.k(), DEFAULT_K);
        assert_eq!(classifier.distance(), Distance::Euclidean);
    }

    #[test]
    fn test_k_validation() {
        assert!(matches!(
            KnnClassifierBuilder::new().with_k(0),
            Err(ClassifierError::InvalidInput(_))
        ));
        assert!(KnnClassifierBuilder::new().with_k(MAX_K + 1).is_err());
        let classifier = KnnClassifierBuilder::new()
            .with_k(MAX_K)
            .unwrap()
            .with_distance(Distance::Cosine)
            .build();
        assert_eq!(classifier.k(), MAX_K);
        assert_eq!(classifier.distance(), Distance::Cosine);
    }
}
