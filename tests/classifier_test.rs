use emoji_knn::{ClassifierError, Distance, ExampleStore, KnnClassifier};
use std::sync::Arc;
use std::thread;

fn setup_test_store() -> ExampleStore {
    let mut store = ExampleStore::new();
    store.add_example("Smile", vec![1.0, 0.0, 0.0]).unwrap();
    store.add_example("Smile", vec![0.9, 0.1, 0.0]).unwrap();
    store.add_example("Sunglasses", vec![0.0, 1.0, 0.0]).unwrap();
    store
}

#[test]
fn test_end_to_end_classification() -> Result<(), Box<dyn std::error::Error>> {
    let store = setup_test_store();
    let counts = store.count_by_label();
    assert_eq!(counts.len(), 2);
    assert_eq!(counts["Smile"], 2);
    assert_eq!(counts["Sunglasses"], 1);

    let classifier = KnnClassifier::builder().with_k(3)?.build();
    let result = classifier.predict(&vec![0.95, 0.05, 0.0].into(), &store)?;

    assert_eq!(result.label, "Smile");
    assert!(result.confidence("Smile") >= 0.5);
    Ok(())
}

#[test]
fn test_confidences_sum_to_one() -> Result<(), Box<dyn std::error::Error>> {
    let mut store = setup_test_store();
    store.add_example("Thinking", vec![0.0, 0.0, 1.0])?;
    store.add_example("Tongue", vec![0.5, 0.5, 0.5])?;

    for k in 1..=6 {
        let result = KnnClassifier::default().predict_with_k(&vec![0.2, 0.3, 0.4].into(), &store, k)?;
        let total: f32 = result.confidences.iter().map(|(_, c)| c).sum();
        assert!((total - 1.0).abs() < 1e-5, "k = {} sums to {}", k, total);
        assert_eq!(result.confidences.len(), 4);
    }
    Ok(())
}

#[test]
fn test_k_larger_than_store_uses_every_example() -> Result<(), Box<dyn std::error::Error>> {
    let store = setup_test_store();
    let classifier = KnnClassifier::builder().with_k(50)?.build();
    let result = classifier.predict(&vec![0.0, 1.0, 0.0].into(), &store)?;
    assert_eq!(result.label, "Smile");
    assert!((result.confidence("Sunglasses") - 1.0 / 3.0).abs() < 1e-6);
    Ok(())
}

#[test]
fn test_empty_store_prediction() {
    let store = ExampleStore::new();
    let result = KnnClassifier::default().predict(&vec![1.0, 2.0].into(), &store);
    assert!(matches!(result, Err(ClassifierError::NoExamples)));
    assert!(store.is_empty());
}

#[test]
fn test_clear_all_then_predict() {
    let mut store = setup_test_store();
    store.clear_all();
    let result = KnnClassifier::default().predict(&vec![1.0, 0.0, 0.0].into(), &store);
    assert!(matches!(result, Err(ClassifierError::NoExamples)));
}

#[test]
fn test_clear_class_counts_zero() {
    let mut store = setup_test_store();
    for label in ["Smile", "Sunglasses", "Thinking"] {
        store.clear_class(label);
        assert_eq!(store.count(label), 0);
        assert!(!store.count_by_label().contains_key(label));
    }
    assert!(store.is_empty());
}

#[test]
fn test_cosine_distance_classification() -> Result<(), Box<dyn std::error::Error>> {
    let store = setup_test_store();
    let classifier = KnnClassifier::builder()
        .with_k(1)?
        .with_distance(Distance::Cosine)
        .build();
    let result = classifier.predict(&vec![0.0, 20.0, 0.0].into(), &store)?;
    assert_eq!(result.label, "Sunglasses");
    assert_eq!(result.top_confidence(), 1.0);
    Ok(())
}

#[test]
fn test_thread_safety() {
    let store = Arc::new(setup_test_store());
    let classifier = Arc::new(KnnClassifier::default());
    let mut handles = vec![];

    for _ in 0..3 {
        let store = Arc::clone(&store);
        let classifier = Arc::clone(&classifier);
        let handle = thread::spawn(move || {
            let result = classifier.predict(&vec![1.0, 0.0, 0.0].into(), &store);
            assert!(result.is_ok());
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }
}
