use serde::{Deserialize, Serialize};

/// Represents the available built-in feature extraction models
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinModel {
    /// MobileNetV2 image classifier from the ONNX model zoo
    ///
    /// Characteristics:
    /// - Input: 224x224 RGB, ImageNet normalization
    /// - Feature size: 1000
    /// - Size: ~14MB
    MobileNetV2,
}

/// Characteristics of a model including its capabilities and requirements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCharacteristics {
    /// Side length of the square input image, in pixels
    pub input_size: u32,
    /// Length of the feature vectors produced by the model
    pub feature_size: usize,
    /// Approximate size of the model file
    pub model_size_mb: usize,
}

/// Where a model can be downloaded from and how to verify it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub model_url: String,
    /// Hex SHA-256 of the model file; verification is skipped when unset
    pub model_hash: Option<String>,
}

impl BuiltinModel {
    pub fn characteristics(&self) -> ModelCharacteristics {
        match self {
            Self::MobileNetV2 => ModelCharacteristics {
                input_size: 224,
                feature_size: 1000,
                model_size_mb: 14,
            },
        }
    }

    pub fn get_model_info(&self) -> ModelInfo {
        match self {
            Self::MobileNetV2 => ModelInfo {
                name: "mobilenetv2".to_string(),
                model_url: "https://github.com/onnx/models/raw/main/validated/vision/classification/mobilenet/model/mobilenetv2-12.onnx".to_string(),
                model_hash: None,
            },
        }
    }
}
