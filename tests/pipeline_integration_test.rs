//! End-to-end tests of the export pipeline over snapshot pages.

mod common;

use std::sync::Arc;

use common::*;
use gemini_md_export::domain::models::{OperationRequest, OperationResult, ProgressEvent};
use gemini_md_export::domain::ports::HostDocument;
use gemini_md_export::infrastructure::host::SnapshotPage;
use gemini_md_export::services::ExportService;
use tokio::sync::broadcast;

fn drain(rx: &mut broadcast::Receiver<ProgressEvent>) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_export_two_turns_in_order() {
    let html = conversation_page(
        Some("Math"),
        &[("What is 2+2?", "<p>Four.</p>"), ("And 3+3?", "<p>Six.</p>")],
    );
    let h = harness(snapshot(&html), fast_config());

    let result = h.service.run(OperationRequest::export(true)).await;

    assert_eq!(
        result,
        OperationResult::Success {
            segment_count: 4,
            artifact_name: Some("Gemini-Math-2025-01-05.md".to_string()),
        }
    );
    let saved = h.files.saved();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].filename, "Gemini-Math-2025-01-05.md");
    assert_eq!(saved[0].mime_type, "text/markdown;charset=utf-8");
    assert_eq!(
        saved[0].content,
        "# Math\n\n\
         ## User\n\nWhat is 2+2?\n\n---\n\n\
         ## Gemini\n\nFour.\n\n---\n\n\
         ## User\n\nAnd 3+3?\n\n---\n\n\
         ## Gemini\n\nSix.\n\n---\n\n"
    );
    assert!(h.clipboard.writes().is_empty());
}

#[tokio::test]
async fn test_empty_page_fails_without_delivery() {
    let html = conversation_page(Some("Empty"), &[]);
    let h = harness(snapshot(&html), fast_config());

    let result = h.service.run(OperationRequest::export(true)).await;

    assert_eq!(result, OperationResult::failure("No conversation content found"));
    assert!(h.files.saved().is_empty());
    assert!(!h.service.is_in_progress());
}

#[tokio::test]
async fn test_without_full_load_extracts_current_tree() {
    let host = paginated(&numbered_page(5), 2);
    let h = harness(host.clone(), fast_config());
    let mut rx = h.service.subscribe();

    let result = h.service.run(OperationRequest::copy(false)).await;

    assert_eq!(
        result,
        OperationResult::Success {
            segment_count: 2,
            artifact_name: None,
        }
    );
    assert_eq!(host.loads(), 0);

    let copied = h.clipboard.writes();
    assert_eq!(copied.len(), 1);
    assert!(copied[0].contains("question 4"));
    assert!(!copied[0].contains("question 3"));

    let percents: Vec<u8> = drain(&mut rx).iter().map(|e| e.percent).collect();
    assert_eq!(percents, vec![95, 100]);
}

#[tokio::test]
async fn test_full_load_materializes_whole_history() {
    let host = paginated(&numbered_page(10), 4);
    let h = harness(host.clone(), fast_config());

    let result = h.service.run(OperationRequest::export(true)).await;

    assert!(matches!(
        result,
        OperationResult::Success {
            segment_count: 20,
            ..
        }
    ));
    assert_eq!(host.visible_segments(), 20);
    let content = &h.files.saved()[0].content;
    let first = content.find("question 0").unwrap();
    let last = content.find("answer 9").unwrap();
    assert!(first < last);
}

#[tokio::test]
async fn test_progress_is_monotonic_and_bracketed() {
    let host = paginated(&numbered_page(6), 2);
    let h = harness(host, fast_config());
    let mut rx = h.service.subscribe();

    let result = h.service.run(OperationRequest::export(true)).await;
    assert!(result.is_success());

    let events = drain(&mut rx);
    assert_eq!(events.first().map(|e| e.percent), Some(5));
    assert_eq!(events.last().map(|e| e.percent), Some(100));
    assert_eq!(events.last().unwrap().message, "Download complete!");
    assert!(events.iter().any(|e| e.percent == 95));
    assert!(events.windows(2).all(|w| w[0].percent <= w[1].percent));
}

#[tokio::test]
async fn test_extraction_is_idempotent() {
    let html = conversation_page(
        Some("Twice"),
        &[("q", "<ul><li>one</li><li>two</li></ul><p><strong>bold</strong></p>")],
    );
    let h = harness(snapshot(&html), fast_config());

    assert!(h.service.run(OperationRequest::export(true)).await.is_success());
    assert!(h.service.run(OperationRequest::export(true)).await.is_success());

    let saved = h.files.saved();
    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0].content, saved[1].content);
}

#[tokio::test]
async fn test_title_sanitized_into_filename() {
    let html = conversation_page(Some("A/B: Test?"), &[("q", "<p>a</p>")]);
    let h = harness(snapshot(&html), fast_config());

    let result = h.service.run(OperationRequest::export(false)).await;

    assert_eq!(
        result,
        OperationResult::Success {
            segment_count: 2,
            artifact_name: Some("Gemini-A_B_ Test_-2025-01-05.md".to_string()),
        }
    );
    assert!(h.files.saved()[0].content.starts_with("# A/B: Test?\n\n"));
}

#[tokio::test]
async fn test_missing_title_uses_default_heading() {
    let html = conversation_page(None, &[("q", "<p>a</p>")]);
    let h = harness(snapshot(&html), fast_config());

    let result = h.service.run(OperationRequest::export(false)).await;

    assert!(matches!(
        result,
        OperationResult::Success { artifact_name: Some(ref name), .. }
            if name == "Gemini-Gemini Conversation-2025-01-05.md"
    ));
    assert!(h.files.saved()[0]
        .content
        .starts_with("# Gemini Conversation\n\n"));
}

#[tokio::test]
async fn test_unrecognized_role_is_skipped_but_counted() {
    let html = "<html><body><main>\
        <user-query><p class=\"query-text\">first</p></user-query>\
        <system-note><div class=\"markdown\"><p>internal</p></div></system-note>\
        <model-response><div class=\"markdown\"><p>second</p></div></model-response>\
        </main></body></html>";
    let mut config = fast_config();
    config.extraction.segment_selector =
        "user-query, system-note, model-response".to_string();
    let host = Arc::new(
        SnapshotPage::from_html(html, &config.extraction.segment_selector).unwrap(),
    );
    let h = harness(host, config);

    let result = h.service.run(OperationRequest::copy(false)).await;

    assert!(matches!(result, OperationResult::Success { segment_count: 3, .. }));
    let copied = &h.clipboard.writes()[0];
    assert!(!copied.contains("internal"));
    assert!(copied.find("first").unwrap() < copied.find("second").unwrap());
}

#[tokio::test]
async fn test_response_without_rich_content_is_skipped() {
    let html = "<html><body><main>\
        <user-query><p class=\"query-text\">hello</p></user-query>\
        <model-response><div class=\"thinking\">...</div></model-response>\
        </main></body></html>";
    let h = harness(snapshot(html), fast_config());

    let result = h.service.run(OperationRequest::copy(false)).await;

    assert!(matches!(result, OperationResult::Success { segment_count: 2, .. }));
    let copied = &h.clipboard.writes()[0];
    assert!(copied.contains("## User"));
    assert!(!copied.contains("## Gemini"));
}

#[tokio::test]
async fn test_render_failure_becomes_failure_result() {
    let html = conversation_page(Some("x"), &[("q", "<p>a</p>")]);
    let files = Arc::new(RecordingFileSink::default());
    let service = ExportService::new(
        snapshot(&html),
        Arc::new(BrokenRenderer),
        files.clone(),
        Arc::new(RecordingClipboard::default()),
        fast_config(),
    );

    match service.run(OperationRequest::export(false)).await {
        OperationResult::Failure { reason } => assert!(reason.contains("malformed fragment")),
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(files.saved().is_empty());
}

#[tokio::test]
async fn test_clipboard_denial_becomes_failure_result() {
    let html = conversation_page(Some("x"), &[("q", "<p>a</p>")]);
    let service = ExportService::new(
        snapshot(&html),
        Arc::new(gemini_md_export::infrastructure::render::MarkdownRenderer::default()),
        Arc::new(RecordingFileSink::default()),
        Arc::new(DeniedClipboard),
        fast_config(),
    );

    match service.run(OperationRequest::copy(false)).await {
        OperationResult::Failure { reason } => assert!(reason.contains("permission denied")),
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(!service.is_in_progress());
}

#[tokio::test]
async fn test_exhaustion_proceeds_by_default() {
    let mut config = fast_config();
    config.poller.max_attempts = 3;
    let host = paginated(&numbered_page(10), 2);
    let h = harness(host, config);

    let result = h.service.run(OperationRequest::export(true)).await;

    // 2 visible, then 2 more per attempt
    assert!(matches!(result, OperationResult::Success { segment_count: 8, .. }));
}

#[tokio::test]
async fn test_exhaustion_can_be_a_failure() {
    let mut config = fast_config();
    config.poller.max_attempts = 3;
    config.poller.fail_on_exhaustion = true;
    let host = paginated(&numbered_page(10), 2);
    let h = harness(host, config);

    let result = h.service.run(OperationRequest::export(true)).await;

    match result {
        OperationResult::Failure { reason } => {
            assert!(reason.starts_with("Conversation only partially loaded after 3 attempts"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(h.files.saved().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_load() {
    let mut config = fast_config();
    config.poller.settle_delay_ms = 500;
    config.poller.retry_delay_ms = 300;
    let host = paginated(&numbered_page(30), 2);
    let h = harness(host.clone(), config);
    let mut rx = h.service.subscribe();

    let service = h.service.clone();
    let task = tokio::spawn(async move { service.run(OperationRequest::export(true)).await });

    loop {
        let event = rx.recv().await.unwrap();
        if event.message.starts_with("Loading conversation") {
            break;
        }
    }
    h.service.cancel();

    let result = task.await.unwrap();
    assert_eq!(result, OperationResult::Cancelled);
    assert!(drain(&mut rx).is_empty(), "no progress after cancellation");
    assert!(h.files.saved().is_empty());
    assert!(host.visible_segments() < host.total_segments());
    assert!(!h.service.is_in_progress());
}

#[tokio::test(start_paused = true)]
async fn test_second_operation_is_rejected_while_busy() {
    let mut config = fast_config();
    config.poller.settle_delay_ms = 500;
    let host = paginated(&numbered_page(30), 2);
    let h = harness(host, config);
    let mut rx = h.service.subscribe();

    let service = h.service.clone();
    let first = tokio::spawn(async move { service.run(OperationRequest::export(true)).await });
    rx.recv().await.unwrap();
    assert!(h.service.is_in_progress());

    let second = h.service.run(OperationRequest::copy(false)).await;
    assert_eq!(
        second,
        OperationResult::failure("Another export is already in progress")
    );

    h.service.cancel();
    assert_eq!(first.await.unwrap(), OperationResult::Cancelled);

    // the flag is released, so a new operation runs
    let third = h.service.run(OperationRequest::copy(false)).await;
    assert!(third.is_success());
}

#[tokio::test]
async fn test_cancel_before_run_does_not_leak_into_next_operation() {
    let h = harness(snapshot(&numbered_page(2)), fast_config());
    h.service.cancel();
    assert!(h.service.run(OperationRequest::export(true)).await.is_success());
}

#[test]
fn test_snapshot_host_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SnapshotPage>();
    let host: Arc<dyn HostDocument> = snapshot(&numbered_page(1));
    assert_eq!(host.count_matching(SEGMENTS).unwrap(), 2);
}

#[tokio::test]
async fn test_rendered_markdown_survives_assembly() {
    let html = conversation_page(
        Some("Links"),
        &[
            (
                "first?",
                "<p>See <a href=\"https://x.dev/a\">docs</a>.</p>\
                 <pre><code>fn main() {}</code></pre>",
            ),
            ("second?", "<p>Try <a href=\"https://x.dev/b\">api</a>.</p>"),
        ],
    );
    let h = harness(snapshot(&html), fast_config());

    assert!(h.service.run(OperationRequest::copy(false)).await.is_success());

    let copied = &h.clipboard.writes()[0];
    assert!(copied.contains("[docs](https://x.dev/a)"), "{copied}");
    assert!(copied.contains("[api](https://x.dev/b)"), "{copied}");
    assert!(!copied.contains("[1]:"), "{copied}");
    assert!(copied.contains("```\nfn main() {}\n```"), "{copied}");
}

#[tokio::test]
async fn test_table_support_setting_reaches_renderer() {
    let table = "<table><thead><tr><th>k</th><th>v</th></tr></thead>\
                 <tbody><tr><td>a</td><td>1</td></tr></tbody></table>";
    let html = conversation_page(Some("Table"), &[("q", table)]);

    let h = harness(snapshot(&html), fast_config());
    assert!(h.service.run(OperationRequest::copy(false)).await.is_success());
    assert!(h.clipboard.writes()[0].contains("| k"));

    let mut config = fast_config();
    config.render.table_support = false;
    let h = harness(snapshot(&html), config);
    assert!(h.service.run(OperationRequest::copy(false)).await.is_success());
    let copied = &h.clipboard.writes()[0];
    assert!(copied.contains("k v\na 1"), "{copied}");
    assert!(!copied.contains('|'), "{copied}");
}
