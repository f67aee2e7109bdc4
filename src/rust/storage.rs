use std::fs;
use std::path::{Path, PathBuf};
use log::info;

use crate::classifier::{ClassifierError, DatasetSnapshot};

/// Persistence sink and source for dataset snapshots
pub trait DatasetStorage {
    /// Stores `snapshot` under `name` and returns where it went
    fn save(&mut self, name: &str, snapshot: &DatasetSnapshot) -> Result<PathBuf, ClassifierError>;

    /// Reads the snapshot stored at `path`
    fn load(&mut self, path: &Path) -> Result<DatasetSnapshot, ClassifierError>;
}

/// Writes snapshots as `<dir>/<name>.json`
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Splits a dataset path such as `data/myKNNDataset.json` into storage
    /// rooted at its parent directory and the dataset name.
    ///
    /// The file the dataset actually lives in is `path_for(name)`, which
    /// adds the `.json` extension when `path` has none.
    pub fn for_dataset(path: &Path) -> Result<(Self, String), ClassifierError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                ClassifierError::InvalidInput(format!("Dataset path {:?} has no file name", path))
            })?;
        let dir = path.parent().map(PathBuf::from).unwrap_or_default();
        Ok((Self::new(dir), name))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The file a dataset called `name` is saved to
    pub fn path_for(&self, name: &str) -> PathBuf {
        if name.ends_with(".json") {
            self.dir.join(name)
        } else {
            self.dir.join(format!("{}.json", name))
        }
    }
}

impl DatasetStorage for JsonFileStorage {
    fn save(&mut self, name: &str, snapshot: &DatasetSnapshot) -> Result<PathBuf, ClassifierError> {
        if name.is_empty() {
            return Err(ClassifierError::InvalidInput("Dataset name cannot be empty".into()));
        }
        let path = self.path_for(name);
        let json = serde_json::to_string_pretty(snapshot)?;

        fs::create_dir_all(&self.dir)?;
        // An interrupted save leaves the previous file in place
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;

        info!("Saved dataset to {:?}", path);
        Ok(path)
    }

    fn load(&mut self, path: &Path) -> Result<DatasetSnapshot, ClassifierError> {
        let path = if path.is_relative() && !path.exists() {
            self.dir.join(path)
        } else {
            path.to_path_buf()
        };
        let json = fs::read_to_string(&path).map_err(|e| {
            ClassifierError::Persistence(format!("Failed to read dataset {:?}: {}", path, e))
        })?;
        let snapshot = serde_json::from_str(&json)?;
        info!("Read dataset from {:?}", path);
        Ok(snapshot)
    }
}
