use std::ops::Index;
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use log::{debug, info};

use super::error::ClassifierError;

/// Version written into every [`DatasetSnapshot`]; snapshots with any other
/// version are rejected.
pub const SNAPSHOT_VERSION: u32 = 1;

/// A fixed-length feature vector produced by a [`FeatureSource`](crate::FeatureSource).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Borrows the values as an ndarray view for distance computations
    pub fn view(&self) -> ArrayView1<'_, f32> {
        ArrayView1::from(&self.0[..])
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }

    /// Checks that the vector is non-empty, finite and, when a dimensionality
    /// has been established, of that length. Returns a description of the
    /// first problem found.
    pub(crate) fn check(&self, dimension: Option<usize>) -> Result<(), String> {
        if self.0.is_empty() {
            return Err("feature vector is empty".into());
        }
        if let Some(pos) = self.0.iter().position(|v| !v.is_finite()) {
            return Err(format!("feature {} is not a finite number", pos));
        }
        match dimension {
            Some(expected) if expected != self.0.len() => Err(format!(
                "feature vector has {} values, expected {}",
                self.0.len(),
                expected
            )),
            _ => Ok(()),
        }
    }
}

impl From<Vec<f32>> for FeatureVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

impl From<Array1<f32>> for FeatureVector {
    fn from(values: Array1<f32>) -> Self {
        Self(values.to_vec())
    }
}

/// Persisted form of an [`ExampleStore`].
///
/// ```json
/// {
///   "version": 1,
///   "dimension": 4,
///   "classes": [
///     { "label": "Smile", "examples": [[0.1, 0.2, 0.3, 0.4]] }
///   ]
/// }
/// ```
///
/// `classes` follows the store's label order and each class keeps its
/// examples in insertion order. An empty store has `"dimension": null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSnapshot {
    pub version: u32,
    pub dimension: Option<usize>,
    pub classes: Vec<ClassSnapshot>,
}

/// All examples of one label inside a [`DatasetSnapshot`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSnapshot {
    pub label: String,
    pub examples: Vec<FeatureVector>,
}

/// Example counts per label, in the store's enumeration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelCounts(Vec<(String, usize)>);

impl LabelCounts {
    pub fn get(&self, label: &str) -> Option<&usize> {
        self.0.iter().find(|(l, _)| l == label).map(|(_, n)| n)
    }

    pub fn contains_key(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `(label, count)` pairs in enumeration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(l, n)| (l.as_str(), *n))
    }
}

impl Index<&str> for LabelCounts {
    type Output = usize;

    fn index(&self, label: &str) -> &usize {
        self.get(label)
            .unwrap_or_else(|| panic!("no examples for label '{}'", label))
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ClassExamples {
    label: String,
    examples: Vec<FeatureVector>,
}

/// Labeled feature vectors, grouped by label.
///
/// Labels are enumerated in the order they were first added. A label only
/// exists while it has at least one example: [`clear_class`](Self::clear_class)
/// removes the entry entirely. The dimensionality is fixed by the first
/// example and forgotten again once the store is empty.
///
/// ```
/// use emoji_knn::ExampleStore;
///
/// let mut store = ExampleStore::new();
/// store.add_example("Smile", vec![0.1, 0.9])?;
/// store.add_example("Smile", vec![0.2, 0.8])?;
/// assert_eq!(store.count("Smile"), 2);
/// assert_eq!(store.count("Tongue"), 0);
/// # Ok::<(), emoji_knn::ClassifierError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExampleStore {
    classes: Vec<ClassExamples>,
    dimension: Option<usize>,
}

impl ExampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `features` under `label`.
    ///
    /// # Errors
    /// - `InvalidInput` if the label is empty
    /// - `InvalidInput` if the vector is empty, contains NaN or infinity, or
    ///   its length differs from the store's dimensionality
    pub fn add_example(
        &mut self,
        label: impl Into<String>,
        features: impl Into<FeatureVector>,
    ) -> Result<(), ClassifierError> {
        let label = label.into();
        let features = features.into();

        if label.is_empty() {
            return Err(ClassifierError::InvalidInput("Class label cannot be empty".into()));
        }
        features.check(self.dimension).map_err(ClassifierError::InvalidInput)?;

        self.dimension.get_or_insert(features.len());
        match self.classes.iter_mut().find(|c| c.label == label) {
            Some(class) => class.examples.push(features),
            None => {
                debug!("Adding new class '{}'", label);
                self.classes.push(ClassExamples {
                    label,
                    examples: vec![features],
                });
            }
        }
        Ok(())
    }

    /// Returns the number of examples for every label present, in
    /// enumeration order. Labels never added (or cleared) are absent.
    pub fn count_by_label(&self) -> LabelCounts {
        LabelCounts(
            self.classes
                .iter()
                .map(|c| (c.label.clone(), c.examples.len()))
                .collect(),
        )
    }

    /// Number of examples for `label`, 0 when the label is absent
    pub fn count(&self, label: &str) -> usize {
        self.examples(label).map_or(0, <[FeatureVector]>::len)
    }

    pub fn examples(&self, label: &str) -> Option<&[FeatureVector]> {
        self.classes
            .iter()
            .find(|c| c.label == label)
            .map(|c| c.examples.as_slice())
    }

    /// Labels in enumeration (first-added) order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(|c| c.label.as_str())
    }

    /// Iterates over `(label, examples)` in enumeration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[FeatureVector])> {
        self.classes
            .iter()
            .map(|c| (c.label.as_str(), c.examples.as_slice()))
    }

    pub fn num_labels(&self) -> usize {
        self.classes.len()
    }

    pub fn total_examples(&self) -> usize {
        self.classes.iter().map(|c| c.examples.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Removes every example of `label`. Clearing an absent label is a no-op.
    pub fn clear_class(&mut self, label: &str) {
        let before = self.classes.len();
        self.classes.retain(|c| c.label != label);
        if self.classes.len() != before {
            debug!("Cleared class '{}'", label);
        }
        if self.classes.is_empty() {
            self.dimension = None;
        }
    }

    pub fn clear_all(&mut self) {
        self.classes.clear();
        self.dimension = None;
    }

    /// Produces a persistable snapshot of the whole store
    pub fn serialize(&self) -> DatasetSnapshot {
        DatasetSnapshot {
            version: SNAPSHOT_VERSION,
            dimension: self.dimension,
            classes: self
                .classes
                .iter()
                .map(|c| ClassSnapshot {
                    label: c.label.clone(),
                    examples: c.examples.clone(),
                })
                .collect(),
        }
    }

    /// Replaces the contents of the store with `snapshot`.
    ///
    /// The snapshot is validated completely before anything is replaced, so
    /// on error the store is left exactly as it was.
    ///
    /// # Errors
    /// `Format` if the version is unsupported, a label is empty or repeated,
    /// a class has no examples, or any vector is empty, non-finite or of a
    /// different length than the others.
    pub fn deserialize(&mut self, snapshot: DatasetSnapshot) -> Result<(), ClassifierError> {
        let restored = Self::from_snapshot(snapshot)?;
        info!(
            "Loaded dataset with {} classes and {} examples",
            restored.num_labels(),
            restored.total_examples()
        );
        *self = restored;
        Ok(())
    }

    fn from_snapshot(snapshot: DatasetSnapshot) -> Result<Self, ClassifierError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(ClassifierError::Format(format!(
                "Unsupported dataset version {} (expected {})",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }

        let mut dimension = snapshot.dimension;
        let mut classes: Vec<ClassExamples> = Vec::with_capacity(snapshot.classes.len());
        for class in snapshot.classes {
            if class.label.is_empty() {
                return Err(ClassifierError::Format("Class label cannot be empty".into()));
            }
            if classes.iter().any(|c| c.label == class.label) {
                return Err(ClassifierError::Format(format!(
                    "Class '{}' appears more than once",
                    class.label
                )));
            }
            if class.examples.is_empty() {
                return Err(ClassifierError::Format(format!(
                    "Class '{}' has no examples",
                    class.label
                )));
            }
            for (i, example) in class.examples.iter().enumerate() {
                example.check(dimension).map_err(|msg| {
                    ClassifierError::Format(format!(
                        "Example {} of class '{}': {}",
                        i + 1,
                        class.label,
                        msg
                    ))
                })?;
                dimension.get_or_insert(example.len());
            }
            classes.push(ClassExamples {
                label: class.label,
                examples: class.examples,
            });
        }

        if classes.is_empty() {
            dimension = None;
        }
        Ok(Self { classes, dimension })
    }

    /// Serializes the store as pretty-printed JSON
    pub fn to_json(&self) -> Result<String, ClassifierError> {
        Ok(serde_json::to_string_pretty(&self.serialize())?)
    }

    /// Replaces the store with the dataset encoded in `json`
    pub fn load_json(&mut self, json: &str) -> Result<(), ClassifierError> {
        let snapshot: DatasetSnapshot = serde_json::from_str(json)?;
        self.deserialize(snapshot)
    }
}
