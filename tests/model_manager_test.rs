use emoji_knn::{BuiltinModel, ClassifierError, ModelManager, OnnxFeatureExtractor, RuntimeConfig};
use emoji_knn::model_manager::CACHE_ENV_VAR;
use std::env;

#[test]
fn test_default_models_dir() {
    // Test with environment variable
    env::set_var(CACHE_ENV_VAR, "/tmp/test-cache");
    let path = ModelManager::get_default_models_dir();
    assert!(path.to_str().unwrap().contains("/tmp/test-cache/models"));
    env::remove_var(CACHE_ENV_VAR);

    // Test without environment variable
    let path = ModelManager::get_default_models_dir();
    assert!(path.to_str().unwrap().contains("emoji_knn/models"));
}

#[test]
fn test_extractor_requires_download() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let manager = ModelManager::new(dir.path())?;
    assert!(!manager.is_model_downloaded(BuiltinModel::MobileNetV2));

    let result = OnnxFeatureExtractor::with_model(
        BuiltinModel::MobileNetV2,
        &manager,
        &RuntimeConfig::default(),
    );
    assert!(matches!(result, Err(ClassifierError::Model(_))));
    Ok(())
}

#[test]
fn test_remove_missing_download() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let manager = ModelManager::new(dir.path())?;
    manager.remove_download(BuiltinModel::MobileNetV2)?;

    let path = manager.get_model_path(BuiltinModel::MobileNetV2);
    std::fs::create_dir_all(path.parent().unwrap())?;
    std::fs::write(&path, b"not really a model")?;
    assert!(manager.is_model_downloaded(BuiltinModel::MobileNetV2));
    // No hash is pinned for the built-in model, so presence is enough
    assert!(manager.verify_model(BuiltinModel::MobileNetV2)?);

    manager.remove_download(BuiltinModel::MobileNetV2)?;
    assert!(!manager.is_model_downloaded(BuiltinModel::MobileNetV2));
    Ok(())
}

#[tokio::test]
#[ignore = "downloads the model over the network"]
async fn test_model_download() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let manager = ModelManager::new(dir.path())?;
    manager.ensure_model_downloaded(BuiltinModel::MobileNetV2).await?;
    assert!(manager.is_model_downloaded(BuiltinModel::MobileNetV2));
    Ok(())
}
