//! The training and classification session behind the emoji UI.
//!
//! A [`SessionController`] owns the example store and runs one user action at
//! a time. Every action takes `&mut self`, so an action can never observe a
//! store that another action is halfway through updating.

use std::fmt;
use std::path::{Path, PathBuf};
use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::classifier::{ClassifierError, ConfidenceResult, ExampleStore, FeatureSource, FeatureVector, KnnClassifier, LabelCounts};
use crate::frame::FrameSource;
use crate::storage::DatasetStorage;

/// Default name the dataset is saved under
pub const DEFAULT_DATASET_NAME: &str = "myKNNDataset";

/// A class label shown in the UI and the emoji it types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmojiLabel {
    pub label: String,
    pub emoji: String,
}

impl EmojiLabel {
    pub fn new(label: impl Into<String>, emoji: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            emoji: emoji.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Labels always shown, in display order
    pub labels: Vec<EmojiLabel>,
    /// Name passed to the storage on save
    pub dataset_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            labels: vec![
                EmojiLabel::new("Smile", "😀"),
                EmojiLabel::new("Sunglasses", "😎"),
                EmojiLabel::new("Thinking", "🤔"),
                EmojiLabel::new("Tongue", "😛"),
            ],
            dataset_name: DEFAULT_DATASET_NAME.to_string(),
        }
    }
}

impl SessionConfig {
    pub fn emoji_for(&self, label: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|l| l.label == label)
            .map(|l| l.emoji.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the next action
    Idle,
    /// A frame is being read and turned into features
    Capturing,
}

/// A user action, as triggered by a UI control
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    AddExample(String),
    Predict,
    TypeEmoji,
    ClearClass(String),
    ClearAll,
    Save,
    Load(PathBuf),
}

/// One row of the UI: a label's counter and confidence bar
#[derive(Debug, Clone, PartialEq)]
pub struct LabelView {
    pub label: String,
    pub emoji: Option<String>,
    pub examples: usize,
    pub confidence_percent: f32,
}

/// Everything the UI surface displays
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub labels: Vec<LabelView>,
    pub predicted: Option<String>,
    pub confidence_percent: Option<f32>,
    pub message: String,
}

impl fmt::Display for SessionView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.labels {
            writeln!(
                f,
                "  {} {:<12} examples: {:>4}  confidence: {:>5.1} %",
                row.emoji.as_deref().unwrap_or(" "),
                row.label,
                row.examples,
                row.confidence_percent
            )?;
        }
        if let (Some(label), Some(confidence)) = (&self.predicted, self.confidence_percent) {
            writeln!(f, "  Predicted: {} ({:.1} %)", label, confidence)?;
        }
        if !self.message.is_empty() {
            writeln!(f, "  Message: {}", self.message)?;
        }
        Ok(())
    }
}

/// Orchestrates training and classification over injected collaborators.
///
/// * `C` supplies camera frames
/// * `F` turns frames into feature vectors
/// * `S` persists datasets
pub struct SessionController<C, F, S> {
    store: ExampleStore,
    classifier: KnnClassifier,
    frames: C,
    features: F,
    storage: S,
    config: SessionConfig,
    state: SessionState,
    counts: LabelCounts,
    last_result: Option<ConfidenceResult>,
    message: String,
}

impl<C, F, S> SessionController<C, F, S>
where
    C: FrameSource,
    F: FeatureSource,
    S: DatasetStorage,
{
    pub fn new(store: ExampleStore, frames: C, features: F, storage: S) -> Self {
        let counts = store.count_by_label();
        Self {
            store,
            classifier: KnnClassifier::default(),
            frames,
            features,
            storage,
            config: SessionConfig::default(),
            state: SessionState::Idle,
            counts,
            last_result: None,
            message: String::new(),
        }
    }

    pub fn with_classifier(mut self, classifier: KnnClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn store(&self) -> &ExampleStore {
        &self.store
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Displayed example counts in label order; labels without examples
    /// are absent
    pub fn counts(&self) -> &LabelCounts {
        &self.counts
    }

    pub fn last_result(&self) -> Option<&ConfidenceResult> {
        self.last_result.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn clear_message(&mut self) {
        self.message.clear();
    }

    /// Runs a single action; the dispatch point for UI events
    pub fn handle(&mut self, action: SessionAction) -> Result<(), ClassifierError> {
        match action {
            SessionAction::AddExample(label) => self.add_example(&label).map(|_| ()),
            SessionAction::Predict => self.predict().map(|_| ()),
            SessionAction::TypeEmoji => self.type_emoji().map(|_| ()),
            SessionAction::ClearClass(label) => {
                self.clear_class(&label);
                Ok(())
            }
            SessionAction::ClearAll => {
                self.clear_all();
                Ok(())
            }
            SessionAction::Save => self.save().map(|_| ()),
            SessionAction::Load(path) => self.load(&path),
        }
    }

    /// Adds the current frame as an example of `label` and returns the
    /// label's new count
    pub fn add_example(&mut self, label: &str) -> Result<usize, ClassifierError> {
        if label.is_empty() {
            return report("add example", Err(ClassifierError::InvalidInput("Class label cannot be empty".into())));
        }
        let result = self
            .capture_features()
            .and_then(|features| self.store.add_example(label, features));
        report("add example", result)?;

        self.refresh_counts();
        let count = self.store.count(label);
        info!("Added example to '{}' ({} total)", label, count);
        Ok(count)
    }

    /// Classifies the current frame.
    ///
    /// With an empty store this fails with `NoExamples` before any frame is
    /// captured.
    pub fn predict(&mut self) -> Result<ConfidenceResult, ClassifierError> {
        if self.store.is_empty() {
            return report("predict", Err(ClassifierError::NoExamples));
        }
        let result = self
            .capture_features()
            .and_then(|query| self.classifier.predict(&query, &self.store));
        let result = report("predict", result)?;

        info!(
            "Predicted '{}' ({:.1} %)",
            result.label,
            result.top_confidence() * 100.0
        );
        self.last_result = Some(result.clone());
        Ok(result)
    }

    /// Classifies the current frame and appends the predicted label's emoji
    /// to the message. Returns the emoji typed, if the label has one.
    pub fn type_emoji(&mut self) -> Result<Option<String>, ClassifierError> {
        let result = self.predict()?;
        let emoji = self.config.emoji_for(&result.label).map(str::to_string);
        if let Some(emoji) = &emoji {
            self.message.push_str(emoji);
        }
        Ok(emoji)
    }

    /// Removes every example of `label` and drops the last prediction
    pub fn clear_class(&mut self, label: &str) {
        self.store.clear_class(label);
        self.last_result = None;
        self.refresh_counts();
        info!("Cleared examples of '{}'", label);
    }

    pub fn clear_all(&mut self) {
        self.store.clear_all();
        self.last_result = None;
        self.refresh_counts();
        info!("Cleared all examples");
    }

    /// Hands the serialized store to the storage under the configured name
    pub fn save(&mut self) -> Result<PathBuf, ClassifierError> {
        let snapshot = self.store.serialize();
        report("save", self.storage.save(&self.config.dataset_name, &snapshot))
    }

    /// Replaces the store with the dataset at `path`. On failure the store
    /// and counts are unchanged.
    pub fn load(&mut self, path: &Path) -> Result<(), ClassifierError> {
        let result = self
            .storage
            .load(path)
            .and_then(|snapshot| self.store.deserialize(snapshot));
        report("load", result)?;

        self.last_result = None;
        self.refresh_counts();
        Ok(())
    }

    /// Snapshot of what the UI shows: configured labels first, then any
    /// other label present in the store
    pub fn view(&self) -> SessionView {
        let extra = self
            .store
            .labels()
            .filter(|label| self.config.emoji_for(label).is_none())
            .map(str::to_string);
        let labels = self
            .config
            .labels
            .iter()
            .map(|l| l.label.clone())
            .chain(extra)
            .map(|label| LabelView {
                emoji: self.config.emoji_for(&label).map(str::to_string),
                examples: self.counts.get(&label).copied().unwrap_or(0),
                confidence_percent: self
                    .last_result
                    .as_ref()
                    .map_or(0.0, |r| r.confidence(&label) * 100.0),
                label,
            })
            .collect();

        SessionView {
            labels,
            predicted: self.last_result.as_ref().map(|r| r.label.clone()),
            confidence_percent: self.last_result.as_ref().map(|r| r.top_confidence() * 100.0),
            message: self.message.clone(),
        }
    }

    fn capture_features(&mut self) -> Result<FeatureVector, ClassifierError> {
        self.state = SessionState::Capturing;
        let result = self
            .frames
            .current_frame()
            .and_then(|frame| self.features.infer(&frame));
        self.state = SessionState::Idle;
        result
    }

    fn refresh_counts(&mut self) {
        self.counts = self.store.count_by_label();
    }
}

fn report<T>(action: &str, result: Result<T, ClassifierError>) -> Result<T, ClassifierError> {
    if let Err(e) = &result {
        error!("Failed to {}: {}", action, e);
    }
    result
}
