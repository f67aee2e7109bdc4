use std::path::PathBuf;
use std::time::Instant;
use clap::{Parser, Subcommand};
use emoji_knn::{
    BuiltinModel, ClassifierError, Distance, ExampleStore, FeatureSource, FeatureVector, Frame,
    JsonFileStorage, KnnClassifier, ModelManager, OnnxFeatureExtractor, RuntimeConfig,
    SessionAction, SessionConfig, SessionController, StillFrames,
};
use log::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Dataset file to load from and save to
    #[arg(long, default_value = "myKNNDataset.json")]
    dataset: PathBuf,

    /// Custom ONNX image model to use instead of the built-in MobileNetV2
    #[arg(long)]
    model: Option<PathBuf>,

    /// Number of neighbors that vote on a prediction
    #[arg(short, default_value_t = emoji_knn::classifier::DEFAULT_K)]
    k: usize,

    /// Rank neighbors by cosine distance instead of Euclidean distance
    #[arg(long)]
    cosine: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download the built-in feature extraction model
    Download {
        /// Force a fresh download of the model file
        #[arg(short, long)]
        fresh: bool,
    },
    /// Add each image as an example of LABEL
    Add { label: String, images: Vec<PathBuf> },
    /// Classify each image
    Predict { images: Vec<PathBuf> },
    /// Classify each image and type the matching emoji
    Type { images: Vec<PathBuf> },
    /// Show the example count of every label
    Counts,
    /// Clear one label, or every label when none is given
    Clear { label: Option<String> },
}

/// The feature extractor, or why it could not be loaded. Commands that never
/// capture a frame work without a model.
enum Extractor {
    Loaded(OnnxFeatureExtractor),
    Unavailable(String),
}

impl FeatureSource for Extractor {
    fn infer(&self, frame: &Frame) -> Result<FeatureVector, ClassifierError> {
        match self {
            Self::Loaded(extractor) => extractor.infer(frame),
            Self::Unavailable(reason) => Err(ClassifierError::Model(reason.clone())),
        }
    }
}

fn load_extractor(model: Option<&PathBuf>) -> Extractor {
    let config = RuntimeConfig::default();
    let result = match model {
        Some(path) => OnnxFeatureExtractor::with_custom_model(&path.to_string_lossy(), None, &config),
        None => ModelManager::new_default()
            .map_err(|e| ClassifierError::Model(format!("Failed to create model manager: {}", e)))
            .and_then(|manager| OnnxFeatureExtractor::with_model(BuiltinModel::MobileNetV2, &manager, &config)),
    };
    match result {
        Ok(extractor) => Extractor::Loaded(extractor),
        Err(e) => Extractor::Unavailable(e.to_string()),
    }
}

async fn ensure_model_downloaded(fresh: bool) -> anyhow::Result<()> {
    let manager = ModelManager::new_default()?;
    let model = BuiltinModel::MobileNetV2;

    if fresh {
        info!("Fresh download requested - removing any existing model file...");
        manager.remove_download(model)?;
    }
    manager.ensure_model_downloaded(model).await?;
    println!("Model ready at {:?}", manager.get_model_path(model));
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let images = match &args.command {
        Command::Download { fresh } => return ensure_model_downloaded(*fresh).await,
        Command::Add { images, .. } | Command::Predict { images } | Command::Type { images } => images.clone(),
        Command::Counts | Command::Clear { .. } => Vec::new(),
    };

    let start_time = Instant::now();
    let extractor = if images.is_empty() {
        Extractor::Unavailable("No model loaded".into())
    } else {
        load_extractor(args.model.as_ref())
    };

    let classifier = KnnClassifier::builder()
        .with_k(args.k)?
        .with_distance(if args.cosine { Distance::Cosine } else { Distance::Euclidean })
        .build();

    let (storage, dataset_name) = JsonFileStorage::for_dataset(&args.dataset)?;
    // Saves go to `path_for(name)`, so loads must read from there too
    let dataset_path = storage.path_for(&dataset_name);
    let config = SessionConfig {
        dataset_name,
        ..SessionConfig::default()
    };

    let frame_count = images.len();
    let mut session = SessionController::new(
        ExampleStore::new(),
        StillFrames::new(images),
        extractor,
        storage,
    )
    .with_classifier(classifier)
    .with_config(config);

    if dataset_path.exists() {
        session.handle(SessionAction::Load(dataset_path))?;
    }

    match args.command {
        Command::Add { label, .. } => {
            for _ in 0..frame_count {
                session.handle(SessionAction::AddExample(label.clone()))?;
            }
            session.handle(SessionAction::Save)?;
        }
        Command::Predict { .. } => {
            for i in 0..frame_count {
                session.handle(SessionAction::Predict)?;
                println!("\nFrame {}/{}:", i + 1, frame_count);
                print!("{}", session.view());
            }
        }
        Command::Type { .. } => {
            for _ in 0..frame_count {
                session.handle(SessionAction::TypeEmoji)?;
            }
            println!("{}", session.message());
        }
        Command::Clear { label } => {
            match label {
                Some(label) => session.handle(SessionAction::ClearClass(label))?,
                None => session.handle(SessionAction::ClearAll)?,
            }
            session.handle(SessionAction::Save)?;
        }
        Command::Counts | Command::Download { .. } => {}
    }

    print!("{}", session.view());
    info!("Done in {:.2?}", start_time.elapsed());
    Ok(())
}
