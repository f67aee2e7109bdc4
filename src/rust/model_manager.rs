use std::path::{Path, PathBuf};
use std::fs;
use std::io;
use std::sync::Arc;
use std::env;
use tokio::sync::Mutex;
use sha2::{Sha256, Digest};

use crate::models::{BuiltinModel, ModelInfo};

/// Environment variable overriding the model cache location
pub const CACHE_ENV_VAR: &str = "EMOJI_KNN_CACHE";

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model not downloaded: {0}")]
    NotDownloaded(String),
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("Download failed with HTTP status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Model verification failed")]
    VerificationFailed,
    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch {
        expected: String,
        actual: String,
    },
}

/// Keeps feature extraction models in a local cache directory
#[derive(Debug, Clone)]
pub struct ModelManager {
    models_dir: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

impl ModelManager {
    /// Creates a new ModelManager with the default models directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_models_dir())
    }

    /// Returns the default models directory path
    pub fn get_default_models_dir() -> PathBuf {
        if let Ok(path) = env::var(CACHE_ENV_VAR) {
            return PathBuf::from(path).join("models");
        }
        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("emoji_knn").join("models");
        }
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("emoji_knn").join("models");
        }
        env::temp_dir().join("emoji_knn").join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self {
            models_dir,
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn get_model_path(&self, model: BuiltinModel) -> PathBuf {
        self.model_path_for(&model.get_model_info())
    }

    fn model_path_for(&self, info: &ModelInfo) -> PathBuf {
        self.models_dir.join(&info.name).join("model.onnx")
    }

    pub fn is_model_downloaded(&self, model: BuiltinModel) -> bool {
        let model_path = self.get_model_path(model);
        log::debug!("Model path: {:?} (exists: {})", model_path, model_path.exists());
        model_path.exists()
    }

    pub async fn download_model(&self, model: BuiltinModel) -> Result<(), ModelError> {
        self.download(&model.get_model_info()).await
    }

    /// Downloads the model described by `info`, reusing an existing file when
    /// it verifies. Partially downloaded files are removed on failure.
    pub async fn download(&self, info: &ModelInfo) -> Result<(), ModelError> {
        let _lock = self.download_lock.lock().await;

        let model_dir = self.models_dir.join(&info.name);
        log::info!("Creating model directory at {:?}", model_dir);
        fs::create_dir_all(&model_dir)?;

        let model_path = self.model_path_for(info);
        let result = if model_path.exists() && self.verify_info(info)? {
            log::info!("Existing model file verified successfully");
            Ok(())
        } else {
            log::info!("Downloading model to {:?}", model_path);
            self.download_and_verify_file(&info.model_url, &model_path, info.model_hash.as_deref())
                .await
        };

        if let Err(e) = &result {
            log::error!("Failed to set up model file: {}", e);
            if model_path.exists() {
                let _ = fs::remove_file(&model_path);
            }
        }
        result
    }

    /// Computes the hex SHA-256 digest of a file
    pub fn file_hash(path: &Path) -> Result<String, ModelError> {
        let bytes = fs::read(path)?;
        Ok(hash_bytes(&bytes))
    }

    fn verify_file(&self, path: &Path, expected_hash: Option<&str>) -> Result<bool, ModelError> {
        let Some(expected) = expected_hash else {
            log::debug!("No hash pinned for {:?}, skipping verification", path);
            return Ok(true);
        };
        let hash = Self::file_hash(path)?;
        log::debug!("Calculated hash: {}", hash);
        log::debug!("Expected hash:   {}", expected);
        Ok(hash.eq_ignore_ascii_case(expected))
    }

    fn verify_info(&self, info: &ModelInfo) -> Result<bool, ModelError> {
        let model_path = self.model_path_for(info);
        if !model_path.exists() {
            return Ok(false);
        }
        self.verify_file(&model_path, info.model_hash.as_deref())
    }

    /// Returns whether the cached model exists and matches its pinned hash
    pub fn verify_model(&self, model: BuiltinModel) -> Result<bool, ModelError> {
        self.verify_info(&model.get_model_info())
    }

    async fn download_and_verify_file(
        &self,
        url: &str,
        path: &Path,
        expected_hash: Option<&str>,
    ) -> Result<(), ModelError> {
        log::info!("Downloading model file from {}", url);
        let response = reqwest::get(url).await?;
        if !response.status().is_success() {
            return Err(ModelError::HttpStatus(response.status()));
        }
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());

        if let Some(expected) = expected_hash {
            let hash = hash_bytes(&bytes);
            if !hash.eq_ignore_ascii_case(expected) {
                log::error!("Model hash mismatch: expected {}, got {}", expected, hash);
                return Err(ModelError::HashMismatch {
                    expected: expected.to_string(),
                    actual: hash,
                });
            }
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &bytes)?;

        if !self.verify_file(path, expected_hash)? {
            return Err(ModelError::VerificationFailed);
        }
        log::info!("Model file downloaded and verified successfully");
        Ok(())
    }

    pub fn remove_download(&self, model: BuiltinModel) -> Result<(), ModelError> {
        let model_path = self.get_model_path(model);
        if model_path.exists() {
            fs::remove_file(&model_path)?;
        }
        Ok(())
    }

    /// Ensures that a model is downloaded and verified.
    /// If the model doesn't exist, it will be downloaded.
    /// If verification fails, it will be re-downloaded.
    pub async fn ensure_model_downloaded(&self, model: BuiltinModel) -> Result<(), ModelError> {
        if !self.is_model_downloaded(model) {
            log::info!("Model not found, downloading...");
            self.download_model(model).await?;
        } else if !self.verify_model(model)? {
            log::info!("Model verification failed, re-downloading...");
            self.remove_download(model)?;
            self.download_model(model).await?;
        } else {
            log::info!("Model {:?} is ready", model);
        }

        if !self.is_model_downloaded(model) {
            return Err(ModelError::NotDownloaded(model.get_model_info().name));
        }
        Ok(())
    }
}

fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
