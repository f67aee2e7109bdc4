use emoji_knn::{ClassSnapshot, ClassifierError, DatasetSnapshot, ExampleStore};

fn sample_store() -> ExampleStore {
    let mut store = ExampleStore::new();
    store.add_example("Smile", vec![0.1, 0.2, 0.3]).unwrap();
    store.add_example("Tongue", vec![0.7, 0.8, 0.9]).unwrap();
    store.add_example("Smile", vec![0.4, 0.5, 0.6]).unwrap();
    store
}

fn assert_format_error(store: &mut ExampleStore, json: &str) {
    let before = store.clone();
    let result = store.load_json(json);
    assert!(
        matches!(result, Err(ClassifierError::Format(_))),
        "expected a format error for {}, got {:?}",
        json,
        result
    );
    assert_eq!(*store, before);
}

#[test]
fn test_round_trip_preserves_examples() -> Result<(), ClassifierError> {
    let store = sample_store();
    let mut restored = ExampleStore::new();
    restored.deserialize(store.serialize())?;

    assert_eq!(restored.count_by_label(), store.count_by_label());
    for (label, examples) in store.iter() {
        assert_eq!(restored.examples(label), Some(examples));
    }
    assert_eq!(restored.labels().collect::<Vec<_>>(), vec!["Smile", "Tongue"]);
    Ok(())
}

#[test]
fn test_json_round_trip() -> Result<(), ClassifierError> {
    let store = sample_store();
    let mut restored = ExampleStore::new();
    restored.load_json(&store.to_json()?)?;
    assert_eq!(restored, store);
    Ok(())
}

#[test]
fn test_mismatched_dimensions() {
    let mut store = sample_store();
    let snapshot = DatasetSnapshot {
        version: 1,
        dimension: None,
        classes: vec![
            ClassSnapshot {
                label: "Smile".into(),
                examples: vec![vec![1.0, 2.0].into()],
            },
            ClassSnapshot {
                label: "Thinking".into(),
                examples: vec![vec![1.0, 2.0, 3.0].into()],
            },
        ],
    };
    let before = store.clone();
    assert!(matches!(store.deserialize(snapshot), Err(ClassifierError::Format(_))));
    assert_eq!(store, before);
}

#[test]
fn test_malformed_snapshots() {
    let mut store = sample_store();

    // Not JSON at all
    assert_format_error(&mut store, "not json");
    // Wrong shape
    assert_format_error(&mut store, r#"{"Smile": [[1.0]]}"#);
    // Non-numeric vector
    assert_format_error(
        &mut store,
        r#"{"version": 1, "dimension": 1, "classes": [{"label": "Smile", "examples": [["a"]]}]}"#,
    );
    // Declared dimension disagrees with the vectors
    assert_format_error(
        &mut store,
        r#"{"version": 1, "dimension": 3, "classes": [{"label": "Smile", "examples": [[1.0, 2.0]]}]}"#,
    );
    // Unsupported version
    assert_format_error(
        &mut store,
        r#"{"version": 2, "dimension": 1, "classes": [{"label": "Smile", "examples": [[1.0]]}]}"#,
    );
    // Duplicate label
    assert_format_error(
        &mut store,
        r#"{"version": 1, "dimension": 1, "classes": [
            {"label": "Smile", "examples": [[1.0]]},
            {"label": "Smile", "examples": [[2.0]]}
        ]}"#,
    );
    // Empty label, empty class, empty vector
    assert_format_error(
        &mut store,
        r#"{"version": 1, "dimension": 1, "classes": [{"label": "", "examples": [[1.0]]}]}"#,
    );
    assert_format_error(
        &mut store,
        r#"{"version": 1, "dimension": 1, "classes": [{"label": "Smile", "examples": []}]}"#,
    );
    assert_format_error(
        &mut store,
        r#"{"version": 1, "dimension": null, "classes": [{"label": "Smile", "examples": [[]]}]}"#,
    );
}

#[test]
fn test_empty_snapshot_clears_store() -> Result<(), ClassifierError> {
    let mut store = sample_store();
    store.load_json(r#"{"version": 1, "dimension": null, "classes": []}"#)?;
    assert!(store.is_empty());
    assert_eq!(store.dimension(), None);
    Ok(())
}

#[test]
fn test_invalid_examples() {
    let mut store = sample_store();
    assert!(matches!(
        store.add_example("Smile", Vec::<f32>::new()),
        Err(ClassifierError::InvalidInput(_))
    ));
    assert!(matches!(
        store.add_example("Smile", vec![1.0, f32::INFINITY, 0.0]),
        Err(ClassifierError::InvalidInput(_))
    ));
    assert!(matches!(
        store.add_example("Smile", vec![1.0]),
        Err(ClassifierError::InvalidInput(_))
    ));
    assert_eq!(store.count("Smile"), 2);
}
