use lexgen_core::{
    AttemptFailure, Flavor, GeneratedItem, LexiconService, ParseError, PipelineConfig,
    PipelineError, ProfileTable, ServiceError, Tier,
};
use lexgen_test_utils::{
    build_service, build_service_with, question_response, ScriptedSource, StubDictionary,
    StubTranslator,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

#[tokio::test]
async fn enriched_word_end_to_end() {
    let source = Arc::new(ScriptedSource::always("Banana"));
    let dictionary = Arc::new(StubDictionary::with_words(&[(
        "banana",
        "An elongated curved tropical fruit.",
    )]));
    let translator = Arc::new(StubTranslator::new());
    let service = build_service(source.clone(), dictionary, translator.clone());

    let item = service.generate_enriched_word('b').await.unwrap();

    assert_eq!(
        item,
        GeneratedItem {
            word: "banana".to_string(),
            definition: Some("An elongated curved tropical fruit.".to_string()),
            translated_definition: Some("[es] An elongated curved tropical fruit.".to_string()),
            options: None,
            correct_answer: None,
        }
    );
    assert_eq!(service.history().snapshot(), vec!["banana".to_string()]);
    assert_eq!(source.calls(), 1);
    assert_eq!(translator.calls(), 1);
    assert_eq!(service.stats().committed, 1);
}

#[tokio::test]
async fn unenriched_row_returns_word_and_definition_only() {
    let mut profiles = ProfileTable::new();
    profiles.row_mut(Flavor::EnrichedWordByLetter).enrich = false;
    let translator = Arc::new(StubTranslator::new());
    let service = LexiconService::new(
        &PipelineConfig::default(),
        profiles,
        Arc::new(ScriptedSource::always("banana")),
        Arc::new(StubDictionary::with_words(&[("banana", "a fruit")])),
        translator.clone(),
    );

    let item = service.generate_enriched_word('b').await.unwrap();

    assert_eq!(
        serde_json::to_value(&item).unwrap(),
        serde_json::json!({"word": "banana", "definition": "a fruit"})
    );
    assert!(service.history().contains("banana"));
    assert_eq!(translator.calls(), 0);
}

#[tokio::test]
async fn plain_word_skips_translation() {
    let translator = Arc::new(StubTranslator::new());
    let service = build_service(
        Arc::new(ScriptedSource::always("Banana")),
        Arc::new(StubDictionary::accept_all("a fruit")),
        translator.clone(),
    );

    let item = service.generate_word('b').await.unwrap();
    assert_eq!(item.word, "banana");
    assert_eq!(item.definition, None);
    assert_eq!(translator.calls(), 0);
}

#[tokio::test]
async fn repeated_word_exhausts_attempts() {
    let source = Arc::new(ScriptedSource::always("Banana"));
    let service = build_service(
        source.clone(),
        Arc::new(StubDictionary::accept_all("a fruit")),
        Arc::new(StubTranslator::new()),
    );

    service.generate_word('b').await.unwrap();
    let err = service.generate_word('b').await.unwrap_err();

    assert_eq!(
        err,
        PipelineError::RetriesExhausted {
            flavor: "word".to_string(),
            attempts: 3,
            last_failure: Some(AttemptFailure::DuplicateCandidate("banana".to_string())),
        }
    );
    assert_eq!(source.calls(), 4);
    assert_eq!(service.history().len(), 1);
    assert_eq!(service.stats().exhausted, 1);
}

#[tokio::test]
async fn invalid_words_are_never_recorded() {
    let dictionary = Arc::new(StubDictionary::reject_all());
    let translator = Arc::new(StubTranslator::new());
    let service = build_service(
        Arc::new(ScriptedSource::always("Zzxqv")),
        dictionary.clone(),
        translator.clone(),
    );

    let err = service.generate_topic_word("space").await.unwrap_err();

    assert!(matches!(
        err,
        PipelineError::RetriesExhausted {
            attempts: 10,
            last_failure: Some(AttemptFailure::InvalidWord { .. }),
            ..
        }
    ));
    assert!(service.history().is_empty());
    assert_eq!(dictionary.lookups(), 10);
    assert_eq!(translator.calls(), 0);
}

#[tokio::test]
async fn dictionary_outage_counts_as_unavailable() {
    let service = build_service(
        Arc::new(ScriptedSource::always("Banana")),
        Arc::new(StubDictionary::failing(ServiceError::Transport(
            "connection reset".to_string(),
        ))),
        Arc::new(StubTranslator::new()),
    );

    let err = service.generate_enriched_word('b').await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::RetriesExhausted {
            last_failure: Some(AttemptFailure::ValidationUnavailable { .. }),
            ..
        }
    ));
    assert!(service.history().is_empty());
}

#[tokio::test]
async fn translation_failure_rejects_enriched_word() {
    let service = build_service(
        Arc::new(ScriptedSource::always("Banana")),
        Arc::new(StubDictionary::accept_all("a fruit")),
        Arc::new(StubTranslator::failing(ServiceError::Status {
            status: 503,
            message: "down".to_string(),
        })),
    );

    assert!(service.generate_enriched_word('b').await.is_err());
    assert!(service.history().is_empty());
}

#[tokio::test]
async fn malformed_question_uses_every_attempt() {
    let source = Arc::new(ScriptedSource::always("Word: Happy, Correct Answer: Joyful"));
    let dictionary = Arc::new(StubDictionary::accept_all("a definition"));
    let service = build_service(
        source.clone(),
        dictionary.clone(),
        Arc::new(StubTranslator::new()),
    );

    let err = service.generate_question(Tier::Easy).await.unwrap_err();

    assert_eq!(
        err,
        PipelineError::RetriesExhausted {
            flavor: "question_easy".to_string(),
            attempts: 20,
            last_failure: Some(AttemptFailure::MalformedCandidate(ParseError::MissingField {
                field: "Options",
            })),
        }
    );
    assert_eq!(source.calls(), 20);
    assert_eq!(dictionary.lookups(), 0);
    assert!(!service.is_busy());
}

#[tokio::test]
async fn question_word_without_letters_is_malformed() {
    let source = Arc::new(ScriptedSource::always(
        "Word: 123, Options: [a, b, c, d], Correct Answer: a",
    ));
    let dictionary = Arc::new(StubDictionary::accept_all("a definition"));
    let service = build_service(
        source.clone(),
        dictionary.clone(),
        Arc::new(StubTranslator::new()),
    );

    let err = service.generate_question(Tier::Medium).await.unwrap_err();

    assert!(matches!(
        err,
        PipelineError::RetriesExhausted {
            last_failure: Some(AttemptFailure::MalformedCandidate(ParseError::NoWord(_))),
            ..
        }
    ));
    assert_eq!(source.calls(), 20);
    assert_eq!(dictionary.lookups(), 0);
    assert!(service.history().is_empty());
}

#[tokio::test]
async fn question_skips_duplicate_and_returns_options() {
    let source = Arc::new(ScriptedSource::new([
        question_response("Happy", ["Sad", "Joyful", "Angry", "Tired"], "Joyful"),
        question_response("Happy", ["Sad", "Glad", "Angry", "Tired"], "Glad"),
        question_response("Brave", ["Bold", "Timid", "Weak", "Slow"], "Bold"),
    ]));
    let service = build_service(
        source.clone(),
        Arc::new(StubDictionary::accept_all("a definition")),
        Arc::new(StubTranslator::new()),
    );

    let first = service.generate_question(Tier::Medium).await.unwrap();
    let second = service.generate_question(Tier::Medium).await.unwrap();

    assert_eq!(first.word, "Happy");
    assert_eq!(first.correct_answer.as_deref(), Some("Joyful"));
    assert_eq!(second.word, "Brave");
    assert_eq!(
        second.options,
        Some([
            "Bold".to_string(),
            "Timid".to_string(),
            "Weak".to_string(),
            "Slow".to_string(),
        ])
    );
    assert_eq!(source.calls(), 3);

    let requests = source.requests();
    assert!(requests[2].user_prompt.contains("Do not use any of these words: happy."));
    assert!(requests[2].user_prompt.contains("moderately difficult"));
}

#[tokio::test]
async fn overflow_clears_history_by_default() {
    let config = PipelineConfig {
        history_capacity: 2,
        ..PipelineConfig::default()
    };
    let service = build_service_with(
        &config,
        Arc::new(ScriptedSource::new(["alpha", "bravo", "charlie"])),
        Arc::new(StubDictionary::accept_all("a word")),
        Arc::new(StubTranslator::new()),
    );

    for letter in ['a', 'b', 'c'] {
        service.generate_word(letter).await.unwrap();
    }

    assert!(service.history().is_empty());
    assert_eq!(service.stats().history.overflows, 1);
}

#[tokio::test]
async fn validate_and_translate_leave_history_alone() {
    let service = build_service(
        Arc::new(ScriptedSource::default()),
        Arc::new(StubDictionary::with_words(&[("cat", "a small feline")])),
        Arc::new(StubTranslator::new()),
    );

    let valid = service.validate_word("Cat").await.unwrap();
    assert!(valid.valid);
    assert_eq!(valid.translated_definition.as_deref(), Some("[es] a small feline"));

    let invalid = service.validate_word("dog").await.unwrap();
    assert!(!invalid.valid);
    assert_eq!(invalid.definition, None);

    let translation = service.translate_word("cat").await.unwrap();
    assert_eq!(translation.translated, "[es] cat");

    assert!(service.history().is_empty());
    assert!(matches!(
        service.validate_word("123").await,
        Err(PipelineError::InvalidRequest(_))
    ));
}

#[tokio::test]
async fn translate_failure_surfaces_as_unavailable() {
    let service = build_service(
        Arc::new(ScriptedSource::default()),
        Arc::new(StubDictionary::reject_all()),
        Arc::new(StubTranslator::failing(ServiceError::Timeout { timeout_ms: 15_000 })),
    );

    let err = service.translate_word("cat").await.unwrap_err();
    assert_eq!(
        err,
        PipelineError::TranslationUnavailable(ServiceError::Timeout { timeout_ms: 15_000 })
    );
    assert_eq!(err.category(), "Translation service unavailable");
}
