/*!
 * End-to-end tests for the background translation job pipeline
 */

use decktrans::app_config::TranslationConfig;
use decktrans::document::{PptxDocument, extract_units};
use decktrans::providers::mock::{MockBehavior, MockProvider};
use decktrans::translation::{
    JobRequest, JobRunner, JobState, ProgressEvent, TranslationService,
};
use std::path::Path;

use crate::common;

/// Config tuned for fast tests: tiny backoff, no inter-request delay
fn fast_config(retry_count: u32) -> TranslationConfig {
    let mut config = TranslationConfig::default();
    config.common.retry_count = retry_count;
    config.common.retry_backoff_ms = 1;
    config.common.rate_limit_delay_ms = 0;
    for provider in &mut config.available_providers {
        provider.rate_limit = None;
    }
    config
}

fn job_request(input: &Path, output: &Path) -> JobRequest {
    JobRequest {
        input_path: input.to_path_buf(),
        output_path: output.to_path_buf(),
        source_language: "auto".to_string(),
        target_language: "ja".to_string(),
    }
}

/// Run a job to completion and collect every progress event
async fn run_and_collect(mock: MockProvider, retry_count: u32, request: JobRequest) -> (Vec<ProgressEvent>, JobState) {
    let service = TranslationService::with_mock(mock, fast_config(retry_count));
    let mut handle = JobRunner::spawn(service, request);

    let mut events = Vec::new();
    while let Some(event) = handle.events.recv().await {
        events.push(event);
    }

    let state = handle.join().await;
    (events, state)
}

#[tokio::test]
async fn test_job_shouldTranslateEveryUnitAndSaveCopy() {
    let temp = common::create_temp_dir().unwrap();
    let slide1 = common::slide_xml(&[&["Hello ", "world"]]);
    let slide2 = common::slide_xml(&[&["Second slide"]]);
    let input = common::write_pptx(temp.path(), "deck.pptx", &[&slide1, &slide2]);
    let output = temp.path().join("deck_ja.pptx");

    let mock = MockProvider::working().with_custom_response(|req| {
        req.text
            .replace("Hello ", "こんにちは ")
            .replace("world", "世界")
            .replace("Second slide", "二枚目のスライド")
    });

    let (events, state) = run_and_collect(mock, 0, job_request(&input, &output)).await;

    assert_eq!(state, JobState::Completed);
    assert!(output.exists());

    let summary = events
        .iter()
        .find_map(|e| match e {
            ProgressEvent::Completed { summary } => Some(summary.clone()),
            _ => None,
        })
        .expect("job should complete");

    assert_eq!(summary.total_units, 2);
    assert_eq!(summary.translated_units, 2);
    assert_eq!(summary.failed_units, 0);
    assert_eq!(summary.warnings, 0);

    // Translated text landed in the copy with run structure intact
    let doc = PptxDocument::open(&output).unwrap();
    let units = extract_units(&doc).unwrap();
    assert_eq!(units[0].run_texts(), vec!["こんにちは".to_string(), "世界".to_string()]);
    assert_eq!(units[1].plain_text(), "二枚目のスライド");

    // The input file is untouched
    let original = PptxDocument::open(&input).unwrap();
    let original_units = extract_units(&original).unwrap();
    assert_eq!(original_units[0].plain_text(), "Hello world");
}

#[tokio::test]
async fn test_job_withIdentityProvider_shouldPreserveAllText() {
    let temp = common::create_temp_dir().unwrap();
    let slide = common::slide_xml(&[&["Alpha ", "beta"], &["Gamma delta"]]);
    let input = common::write_pptx(temp.path(), "deck.pptx", &[&slide]);
    let output = temp.path().join("deck_ja.pptx");

    // A provider that returns its input verbatim makes the job an identity
    let mock = MockProvider::working().with_custom_response(|req| req.text.clone());

    let (_, state) = run_and_collect(mock, 0, job_request(&input, &output)).await;
    assert_eq!(state, JobState::Completed);

    let before = extract_units(&PptxDocument::open(&input).unwrap()).unwrap();
    let after = extract_units(&PptxDocument::open(&output).unwrap()).unwrap();

    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(after.iter()) {
        assert_eq!(b.segments, a.segments);
        assert_eq!(b.location, a.location);
    }
}

#[tokio::test]
async fn test_job_shouldSkipFooterAndNumericUnits() {
    let temp = common::create_temp_dir().unwrap();
    let content = common::slide_xml(&[&["Real content"], &["42"]]);
    let footer = common::footer_slide_xml("Confidential");
    let input = common::write_pptx(temp.path(), "deck.pptx", &[&content, &footer]);
    let output = temp.path().join("deck_ja.pptx");

    let (events, state) =
        run_and_collect(MockProvider::working(), 0, job_request(&input, &output)).await;

    assert_eq!(state, JobState::Completed);

    let started = events
        .iter()
        .find_map(|e| match e {
            ProgressEvent::Started { total_units, slide_count } => Some((*total_units, *slide_count)),
            _ => None,
        })
        .unwrap();

    // Only "Real content" is translatable; the number and footer are skipped
    assert_eq!(started, (1, 2));

    let doc = PptxDocument::open(&output).unwrap();
    let units = extract_units(&doc).unwrap();
    assert_eq!(units.len(), 1);
}

#[tokio::test]
async fn test_job_withNotes_shouldNotRepeatSlideAnnouncements() {
    let temp = common::create_temp_dir().unwrap();
    let slide1 = common::slide_xml(&[&["First slide"]]);
    let slide2 = common::slide_xml(&[&["Second slide"]]);
    let notes = common::wrap_in_notes_slide(
        "<p:sp><p:txBody><a:p><a:r><a:t>Speaker reminder</a:t></a:r></a:p></p:txBody></p:sp>",
    );
    let input = common::write_pptx_with_notes(
        temp.path(),
        "deck.pptx",
        &[&slide1, &slide2],
        &[&notes],
    );
    let output = temp.path().join("deck_ja.pptx");

    let (events, state) =
        run_and_collect(MockProvider::working(), 0, job_request(&input, &output)).await;

    assert_eq!(state, JobState::Completed);

    // Notes for slide 1 are translated after slide 2, but the slide
    // announcements never go backwards
    let slides: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::SlideStarted { slide } => Some(*slide),
            _ => None,
        })
        .collect();
    assert_eq!(slides, vec![1, 2]);
}

#[tokio::test]
async fn test_job_withFailingProvider_shouldCompleteKeepingOriginalText() {
    let temp = common::create_temp_dir().unwrap();
    let slide = common::slide_xml(&[&["Keep me"], &["And me"]]);
    let input = common::write_pptx(temp.path(), "deck.pptx", &[&slide]);
    let output = temp.path().join("deck_ja.pptx");

    let mock = MockProvider::failing();
    let counter = mock.clone();

    let (events, state) = run_and_collect(mock, 1, job_request(&input, &output)).await;

    // Unit failures are not job failures: the copy is still written
    assert_eq!(state, JobState::Completed);
    assert!(output.exists());

    let summary = events
        .iter()
        .find_map(|e| match e {
            ProgressEvent::Completed { summary } => Some(summary.clone()),
            _ => None,
        })
        .unwrap();

    assert_eq!(summary.failed_units, 2);
    assert_eq!(summary.translated_units, 0);

    // Each unit got its initial attempt plus one retry
    assert_eq!(counter.request_count(), 4);

    let doc = PptxDocument::open(&output).unwrap();
    let units = extract_units(&doc).unwrap();
    assert_eq!(units[0].plain_text(), "Keep me");
    assert_eq!(units[1].plain_text(), "And me");
}

#[tokio::test]
async fn test_job_withTransientFailures_shouldRecoverThroughRetries() {
    let temp = common::create_temp_dir().unwrap();
    let slide = common::slide_xml(&[&["Eventually translated"]]);
    let input = common::write_pptx(temp.path(), "deck.pptx", &[&slide]);
    let output = temp.path().join("deck_ja.pptx");

    let mock = MockProvider::fail_times(2);
    let counter = mock.clone();

    let (events, state) = run_and_collect(mock, 2, job_request(&input, &output)).await;

    assert_eq!(state, JobState::Completed);
    assert_eq!(counter.request_count(), 3);
    assert!(events.iter().any(|e| matches!(e, ProgressEvent::UnitTranslated { .. })));
}

#[tokio::test]
async fn test_job_withTokenDroppingProvider_shouldWarnAndKeepOriginalRuns() {
    let temp = common::create_temp_dir().unwrap();
    let slide = common::slide_xml(&[&["Hello ", "world"]]);
    let input = common::write_pptx(temp.path(), "deck.pptx", &[&slide]);
    let output = temp.path().join("deck_ja.pptx");

    let (events, state) =
        run_and_collect(MockProvider::dropping_tokens(), 0, job_request(&input, &output)).await;

    assert_eq!(state, JobState::Completed);
    assert!(output.exists());

    let warnings = events
        .iter()
        .filter(|e| matches!(e, ProgressEvent::Warning { .. }))
        .count();
    assert!(warnings > 0);

    // With every token dropped, the runs fall back to their original text
    let doc = PptxDocument::open(&output).unwrap();
    let units = extract_units(&doc).unwrap();
    assert_eq!(units[0].run_texts(), vec!["Hello ".to_string(), "world".to_string()]);
}

#[tokio::test]
async fn test_job_withAuthFailure_shouldAbortWithoutOutput() {
    let temp = common::create_temp_dir().unwrap();
    let slide = common::slide_xml(&[&["Never sent"]]);
    let input = common::write_pptx(temp.path(), "deck.pptx", &[&slide]);
    let output = temp.path().join("deck_ja.pptx");

    let (events, state) =
        run_and_collect(MockProvider::auth_failing(), 5, job_request(&input, &output)).await;

    assert_eq!(state, JobState::Failed);
    assert!(!output.exists());
    assert!(events.iter().any(|e| matches!(e, ProgressEvent::Failed { .. })));
}

#[tokio::test]
async fn test_job_withMissingInput_shouldFail() {
    let temp = common::create_temp_dir().unwrap();
    let input = temp.path().join("missing.pptx");
    let output = temp.path().join("missing_ja.pptx");

    let (events, state) =
        run_and_collect(MockProvider::working(), 0, job_request(&input, &output)).await;

    assert_eq!(state, JobState::Failed);
    assert!(!output.exists());
    assert!(matches!(events.first(), Some(ProgressEvent::Failed { .. })));
}

#[tokio::test]
async fn test_cancelledJob_shouldNotWriteOutputFile() {
    let temp = common::create_temp_dir().unwrap();
    let slide = common::slide_xml(&[&["First unit"], &["Second unit"], &["Third unit"]]);
    let input = common::write_pptx(temp.path(), "deck.pptx", &[&slide]);
    let output = temp.path().join("deck_ja.pptx");

    let service = TranslationService::with_mock(
        MockProvider::new(MockBehavior::Slow { delay_ms: 100 }),
        fast_config(0),
    );
    let mut handle = JobRunner::spawn(service, job_request(&input, &output));
    let canceller = handle.canceller();

    let mut saw_cancelled = false;
    while let Some(event) = handle.events.recv().await {
        match event {
            // Cancel as soon as the job reports it has started
            ProgressEvent::Started { .. } => canceller.cancel(),
            ProgressEvent::Cancelled { .. } => saw_cancelled = true,
            ProgressEvent::Completed { .. } => panic!("cancelled job must not complete"),
            _ => {}
        }
    }

    let state = handle.join().await;

    assert!(saw_cancelled);
    assert_eq!(state, JobState::Cancelled);
    assert!(!output.exists());
}
