use lexgen_core::{LexiconService, PipelineConfig, PipelineError, Tier};
use lexgen_test_utils::{
    build_service, build_service_with, question_response, GatedSource, PanickingSource,
    StubDictionary, StubTranslator,
};
use std::sync::Arc;

fn gated_service(source: Arc<GatedSource>) -> Arc<LexiconService> {
    Arc::new(build_service(
        source,
        Arc::new(StubDictionary::accept_all("a definition")),
        Arc::new(StubTranslator::new()),
    ))
}

#[tokio::test]
async fn concurrent_question_is_rejected_not_queued() {
    let source = Arc::new(GatedSource::new(&question_response(
        "Happy",
        ["Sad", "Joyful", "Angry", "Tired"],
        "Joyful",
    )));
    let service = gated_service(source.clone());

    let first = tokio::spawn({
        let service = service.clone();
        async move { service.generate_question(Tier::Easy).await }
    });
    source.wait_started().await;
    assert!(service.is_busy());

    // Any tier shares the one guard.
    let second = service.generate_question(Tier::Hard).await.unwrap_err();
    assert_eq!(second, PipelineError::PipelineBusy("question_hard".to_string()));

    source.release(1);
    let item = first.await.unwrap().unwrap();
    assert_eq!(item.word, "Happy");
    assert!(!service.is_busy());

    let stats = service.stats();
    assert_eq!(stats.busy_rejections, 1);
    assert_eq!(stats.guard.acquired, 1);
    assert_eq!(stats.guard.released, 1);
}

#[tokio::test]
async fn word_flavors_run_unguarded() {
    let source = Arc::new(GatedSource::new("Banana"));
    let service = gated_service(source.clone());

    let first = tokio::spawn({
        let service = service.clone();
        async move { service.generate_word('b').await }
    });
    source.wait_started().await;
    assert!(!service.is_busy());

    let second = tokio::spawn({
        let service = service.clone();
        async move { service.generate_topic_word("fruit").await }
    });
    source.wait_started().await;

    // Enough for the loser to run out its attempts on duplicates.
    source.release(16);
    let first = first.await.unwrap();
    let second = second.await.unwrap();

    let committed = [first.is_ok(), second.is_ok()]
        .into_iter()
        .filter(|ok| *ok)
        .count();
    assert_eq!(committed, 1);
    assert_eq!(service.history().snapshot(), vec!["banana".to_string()]);
    assert_eq!(service.stats().busy_rejections, 0);
}

#[tokio::test]
async fn guard_released_after_panic() {
    let service = Arc::new(build_service(
        Arc::new(PanickingSource),
        Arc::new(StubDictionary::accept_all("a definition")),
        Arc::new(StubTranslator::new()),
    ));

    let handle = tokio::spawn({
        let service = service.clone();
        async move { service.generate_question(Tier::Easy).await }
    });
    let err = handle.await.unwrap().unwrap_err();
    assert!(matches!(err, PipelineError::Internal(_)));
    assert!(!service.is_busy());

    // Next caller gets through the guard rather than a busy rejection.
    let err = service.generate_question(Tier::Medium).await.unwrap_err();
    assert!(matches!(err, PipelineError::Internal(_)));
    assert_eq!(service.stats().guard.acquired, 2);
}

#[tokio::test]
async fn guard_released_after_timeout() {
    let source = Arc::new(GatedSource::new("never"));
    let config = PipelineConfig {
        request_timeout_secs: 1,
        call_timeout_secs: 30,
        ..PipelineConfig::default()
    };
    let service = build_service_with(
        &config,
        source,
        Arc::new(StubDictionary::accept_all("a definition")),
        Arc::new(StubTranslator::new()),
    );

    let err = service.generate_question(Tier::Easy).await.unwrap_err();
    assert_eq!(err, PipelineError::Timeout { duration_secs: 1 });
    assert!(!service.is_busy());
    assert!(service.history().is_empty());
    assert_eq!(service.stats().timeouts, 1);
}
