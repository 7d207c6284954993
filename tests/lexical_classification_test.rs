mod common;

use hybrid_intent::prelude::*;

use common::{init_logger, travel_dataset};

async fn classifier(threshold: f64) -> IntentClassifier {
    init_logger();
    let config = ClassifierConfig {
        threshold,
        ..Default::default()
    };
    IntentClassifier::from_examples(config, travel_dataset(), None)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_travel_end_to_end() {
    let mut classifier = classifier(0.30).await;

    let result = classifier.classify("How do I book a flight?").await.unwrap();
    assert_eq!(result.intent, "book_flight");
    assert_eq!(result.confidence.to_string(), "100.00%");

    let result = classifier.classify("xxxxxxxx?").await.unwrap();
    assert_eq!(result.intent, UNKNOWN_INTENT);
    assert_eq!(result.confidence.to_string(), "0.00%");

    let json = serde_json::to_string(&result).unwrap();
    assert_eq!(json, r#"{"intent":"unknown","confidence":"0.00%"}"#);
}

#[tokio::test]
async fn test_threshold_equality_matches() {
    let query = "book a flight for tomorrow";
    let mut probe = classifier(0.0).await;
    let result = probe.classify(query).await.unwrap();
    assert_eq!(result.intent, "book_flight");
    let similarity = result.confidence.score().unwrap();
    assert!(similarity > 0.0 && similarity < 1.0);

    let mut at_threshold = classifier(similarity).await;
    let result = at_threshold.classify(query).await.unwrap();
    assert_eq!(result.intent, "book_flight");

    let mut above_threshold = classifier(similarity + 1e-9).await;
    let result = above_threshold.classify(query).await.unwrap();
    assert_eq!(result.intent, UNKNOWN_INTENT);
    assert_eq!(result.confidence, Confidence::Score(similarity));
}

#[tokio::test]
async fn test_no_garbage_filter_on_lexical_path() {
    let mut classifier = classifier(0.30).await;
    let result = classifier.classify("zzz").await.unwrap();
    assert!(result.is_unknown());
    assert_eq!(result.confidence, Confidence::Score(0.0));
}

#[tokio::test]
async fn test_add_then_classify() {
    let mut classifier = classifier(0.30).await;
    assert!(classifier.add_intent("Cancel my reservation", "cancel").await.unwrap());
    assert_eq!(classifier.lexical_index().document_count(), 4);

    let result = classifier.classify("Cancel my reservation").await.unwrap();
    assert_eq!(result.intent, "cancel");
    assert_eq!(
        classifier.intents(),
        vec!["book_flight", "weather_query", "cancel"]
    );
}

#[tokio::test]
async fn test_remove_intent() {
    let mut classifier = classifier(0.30).await;
    let before = classifier.classify("I need to reserve a ticket").await.unwrap();
    assert_eq!(before.intent, "book_flight");

    assert_eq!(classifier.remove_intent("book_flight").await.unwrap(), 2);
    assert_eq!(classifier.dataset().len(), 1);
    assert_eq!(classifier.lexical_index().document_count(), 1);

    let after = classifier.classify("I need to reserve a ticket").await.unwrap();
    assert_eq!(after.intent, UNKNOWN_INTENT);
}

#[tokio::test]
async fn test_cache_survives_noop_mutations() {
    let mut classifier = classifier(0.30).await;
    classifier.classify("What's the weather like?").await.unwrap();
    classifier.classify("What's the weather like?").await.unwrap();
    assert_eq!(classifier.cache_len(), 1);

    classifier.remove_intent("no_such_intent").await.unwrap();
    classifier
        .add_intent("What's the weather like?", "weather_query")
        .await
        .unwrap();
    assert_eq!(classifier.cache_len(), 1);

    classifier.invalidate_cache();
    assert_eq!(classifier.cache_len(), 0);
}
