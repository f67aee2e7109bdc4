//! Train an emoji classifier from camera frames.
//!
//! Frames are turned into feature vectors by a pretrained image model
//! ([`OnnxFeatureExtractor`]), stored per label in an [`ExampleStore`], and
//! classified by majority vote among their k nearest neighbors
//! ([`KnnClassifier`]). A [`SessionController`] ties these together behind the
//! actions of the emoji UI: add example, predict, clear, save and load.
//!
//! # Basic Usage
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use emoji_knn::{ExampleStore, KnnClassifier};
//!
//! let mut store = ExampleStore::new();
//! store.add_example("Smile", vec![0.9, 0.1, 0.0])?;
//! store.add_example("Smile", vec![0.8, 0.2, 0.0])?;
//! store.add_example("Sunglasses", vec![0.0, 0.1, 0.9])?;
//!
//! let classifier = KnnClassifier::builder().with_k(3)?.build();
//! let result = classifier.predict(&vec![0.85, 0.15, 0.0].into(), &store)?;
//! println!("Predicted class: {} ({:.0} %)", result.label, result.top_confidence() * 100.0);
//! # Ok(())
//! # }
//! ```
//!
//! # Persistence
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use emoji_knn::ExampleStore;
//!
//! let mut store = ExampleStore::new();
//! store.add_example("Thinking", vec![0.5, 0.5])?;
//!
//! let json = store.to_json()?;
//! let mut restored = ExampleStore::new();
//! restored.load_json(&json)?;
//! assert_eq!(restored.count("Thinking"), 1);
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod frame;
mod runtime;
pub mod model_manager;
pub mod models;
pub mod session;
pub mod storage;

pub use classifier::{
    ClassSnapshot, ClassifierError, ConfidenceResult, DatasetSnapshot, Distance, ExampleStore,
    FeatureSource, FeatureVector, KnnClassifier, KnnClassifierBuilder, LabelCounts, OnnxFeatureExtractor,
};
pub use frame::{Frame, FrameSource, StillFrames};
pub use runtime::{RuntimeConfig, create_session_builder};
pub use model_manager::{ModelManager, ModelError};
pub use models::{BuiltinModel, ModelCharacteristics, ModelInfo};
pub use session::{EmojiLabel, LabelView, SessionAction, SessionConfig, SessionController, SessionState, SessionView};
pub use storage::{DatasetStorage, JsonFileStorage};

pub fn init_logger() {
    env_logger::init();
}
