use std::collections::HashMap;
use std::path::Path;
use image::imageops::{self, FilterType};
use log::{error, info};
use ndarray::Array4;
use ort::session::Session;
use ort::value::Tensor;

use super::error::ClassifierError;
use super::store::FeatureVector;
use crate::frame::Frame;
use crate::runtime::{create_session_builder, RuntimeConfig};
use crate::{BuiltinModel, ModelCharacteristics, ModelManager};

/// ImageNet channel means, RGB
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet channel standard deviations, RGB
const STD: [f32; 3] = [0.229, 0.224, 0.225];
/// Input side length assumed for custom models
pub const DEFAULT_INPUT_SIZE: u32 = 224;

/// Turns a frame into a fixed-length feature vector.
///
/// Implementations must return vectors of the same length for every frame.
pub trait FeatureSource {
    /// Extracts the features of `frame`
    fn infer(&self, frame: &Frame) -> Result<FeatureVector, ClassifierError>;

    /// Length of the vectors produced by [`infer`](Self::infer), if known
    fn feature_size(&self) -> Option<usize> {
        None
    }
}

/// Extracts frame features with a pretrained ONNX image model.
///
/// Frames are resized to the model's square input, normalized with the
/// ImageNet mean and standard deviation, and laid out as a
/// `[1, 3, size, size]` tensor. The first model output, flattened, is the
/// feature vector.
#[derive(Debug)]
pub struct OnnxFeatureExtractor {
    model_path: String,
    session: Session,
    input_name: String,
    characteristics: ModelCharacteristics,
}

impl OnnxFeatureExtractor {
    /// Loads a built-in model from the manager's cache
    ///
    /// # Errors
    /// `Model` if the model has not been downloaded or fails to load
    pub fn with_model(
        model: BuiltinModel,
        manager: &ModelManager,
        config: &RuntimeConfig,
    ) -> Result<Self, ClassifierError> {
        if !manager.is_model_downloaded(model) {
            return Err(ClassifierError::Model(format!(
                "Model '{:?}' is not downloaded. Please download it first using ModelManager::download_model()",
                model
            )));
        }
        let model_path = manager.get_model_path(model);
        let session = Self::load_session(&model_path, config)?;
        let input_name = Self::validate_model(&session)?;

        Ok(Self {
            model_path: model_path.to_string_lossy().to_string(),
            session,
            input_name,
            characteristics: model.characteristics(),
        })
    }

    /// Loads a custom ONNX image model.
    ///
    /// The feature size is inferred by running a blank frame through the
    /// model.
    ///
    /// # Arguments
    /// * `model_path` - Path to the ONNX model file
    /// * `input_size` - Square input side length; defaults to 224
    pub fn with_custom_model(
        model_path: &str,
        input_size: Option<u32>,
        config: &RuntimeConfig,
    ) -> Result<Self, ClassifierError> {
        if model_path.is_empty() {
            return Err(ClassifierError::Model("Model path cannot be empty".into()));
        }
        if !Path::new(model_path).exists() {
            return Err(ClassifierError::Model(format!("Model file not found: {}", model_path)));
        }

        let session = Self::load_session(Path::new(model_path), config)?;
        let input_name = Self::validate_model(&session)?;
        let input_size = input_size.unwrap_or(DEFAULT_INPUT_SIZE);

        let mut extractor = Self {
            model_path: model_path.to_string(),
            session,
            input_name,
            characteristics: ModelCharacteristics {
                input_size,
                feature_size: 0,
                model_size_mb: 0, // Not critical for functionality
            },
        };

        let blank = Frame::try_from(image::RgbImage::new(input_size, input_size))
            .map_err(|_| ClassifierError::Model(format!("Invalid model input size {}", input_size)))?;
        let feature_size = extractor.infer(&blank)?.len();
        info!("Inferred feature size from model: {}", feature_size);
        extractor.characteristics.feature_size = feature_size;

        Ok(extractor)
    }

    pub fn model_path(&self) -> &str {
        &self.model_path
    }

    pub fn characteristics(&self) -> &ModelCharacteristics {
        &self.characteristics
    }

    fn load_session(path: &Path, config: &RuntimeConfig) -> Result<Session, ClassifierError> {
        let session = create_session_builder(config)?
            .commit_from_file(path)
            .map_err(|e| {
                error!("Failed to load model {:?}: {}", path, e);
                ClassifierError::Model(format!("Failed to load model: {}", e))
            })?;
        info!("Model loaded from {:?}", path);
        Ok(session)
    }

    /// Checks the model has an image input and at least one output, and
    /// returns the input's name
    fn validate_model(session: &Session) -> Result<String, ClassifierError> {
        let input = session.inputs.first().ok_or_else(|| {
            ClassifierError::Model("Model must have an image input".to_string())
        })?;
        if session.outputs.is_empty() {
            return Err(ClassifierError::Model(
                "Model must have at least 1 output for features".to_string(),
            ));
        }
        Ok(input.name.clone())
    }

    /// Resizes and normalizes a frame into an NCHW tensor
    pub(crate) fn preprocess(frame: &Frame, size: u32) -> Array4<f32> {
        let resized = imageops::resize(frame.image(), size, size, FilterType::Triangle);
        let side = size as usize;
        Array4::from_shape_fn((1, 3, side, side), |(_, c, y, x)| {
            let value = resized.get_pixel(x as u32, y as u32)[c] as f32 / 255.0;
            (value - MEAN[c]) / STD[c]
        })
    }
}

impl FeatureSource for OnnxFeatureExtractor {
    fn infer(&self, frame: &Frame) -> Result<FeatureVector, ClassifierError> {
        let input_array = Self::preprocess(frame, self.characteristics.input_size);
        let input_dyn = input_array.into_dyn();
        let input = input_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            self.input_name.as_str(),
            Tensor::from_array(&input)
                .map_err(|e| ClassifierError::Model(format!("Failed to create input tensor: {}", e)))?,
        );

        let outputs = self.session.run(input_tensors)
            .map_err(|e| ClassifierError::Model(format!("Failed to run model: {}", e)))?;
        let output_tensor = outputs[0].try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::Model(format!("Failed to extract output tensor: {}", e)))?;

        let features: Vec<f32> = output_tensor.iter().copied().collect();
        if features.is_empty() {
            return Err(ClassifierError::Model("Model produced an empty output".into()));
        }
        Ok(FeatureVector::new(features))
    }

    fn feature_size(&self) -> Option<usize> {
        Some(self.characteristics.feature_size).filter(|&n| n > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprocess_shape_and_normalization() {
        let frame = Frame::from_rgb(2, 2, vec![255; 12]).unwrap();
        let tensor = OnnxFeatureExtractor::preprocess(&frame, 4);
        assert_eq!(tensor.shape(), &[1, 3, 4, 4]);
        let expected_red = (1.0 - MEAN[0]) / STD[0];
        assert!((tensor[[0, 0, 3, 3]] - expected_red).abs() < 1e-5);
    }

    #[test]
    fn test_missing_custom_model() {
        let result = OnnxFeatureExtractor::with_custom_model(
            "/nonexistent/model.onnx",
            None,
            &RuntimeConfig::default(),
        );
        assert!(matches!(result, Err(ClassifierError::Model(_))));
        assert!(OnnxFeatureExtractor::with_custom_model("", None, &RuntimeConfig::default()).is_err());
    }
}
