mod error;
mod embedding;
mod classifier;
mod store;
pub mod builder;
mod utils;

pub use error::ClassifierError;
pub use embedding::{FeatureSource, OnnxFeatureExtractor, DEFAULT_INPUT_SIZE};
pub use classifier::{ConfidenceResult, Distance, KnnClassifier, DEFAULT_K};
pub use store::{ClassSnapshot, DatasetSnapshot, ExampleStore, FeatureVector, LabelCounts, SNAPSHOT_VERSION};
pub use builder::KnnClassifierBuilder;
