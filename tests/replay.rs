use rebuild_hook::cli::{replay, ReplayReport};
use rebuild_hook_core::config::SkipReason;
use rebuild_hook_core::contract::{MockNotificationHandler, TriggerOutcome};
use rebuild_hook_core::dispatch::{DispatchReport, EventBus};
use rebuild_hook_core::event::ContentEvent;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncReadExt, BufReader, ReadBuf};

/// Reader that fails every read, like a stdin pipe torn down mid-stream.
struct BrokenPipe;

impl AsyncRead for BrokenPipe {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "stdin went away",
        )))
    }
}

fn bus_expecting(times: usize) -> EventBus {
    let mut handler = MockNotificationHandler::new();
    handler.expect_handle().times(times).returning(|_| TriggerOutcome::Skipped {
        reason: SkipReason::Disabled,
    });
    let mut bus = EventBus::new();
    bus.subscribe_all(Arc::new(handler));
    bus
}

#[tokio::test]
async fn undecodable_and_unknown_lines_are_skipped_and_reported() {
    let input: &[u8] = b"publish a\nmove \xff\xfe\n# note\nrename Foo\n\nunpublish\n";

    let report = replay(bus_expecting(2), 4, input).await.expect("replay runs");

    assert_eq!(
        report,
        ReplayReport {
            dispatch: DispatchReport {
                processed: 2,
                triggered: 0,
                skipped: 2,
                failed: 0,
            },
            rejected_lines: vec![2, 4],
        }
    );
}

#[tokio::test]
async fn read_error_still_delivers_what_was_queued() {
    let input = BufReader::new((&b"publish a\ndelete b\n"[..]).chain(BrokenPipe));

    let err = replay(bus_expecting(2), 1, input)
        .await
        .expect_err("read error is surfaced");

    assert!(
        err.to_string().contains("Failed to read event stream"),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn last_line_without_newline_is_dispatched() {
    let mut handler = MockNotificationHandler::new();
    handler
        .expect_handle()
        .withf(|n| n.event == ContentEvent::Copied && n.subject.as_deref() == Some("About us"))
        .times(1)
        .returning(|_| TriggerOutcome::Skipped {
            reason: SkipReason::Disabled,
        });
    let mut bus = EventBus::new();
    bus.subscribe_all(Arc::new(handler));

    let report = replay(bus, 4, &b"copy About us"[..])
        .await
        .expect("replay runs");
    assert_eq!(report.dispatch.processed, 1);
    assert!(report.rejected_lines.is_empty());
}
