//! `serve` command: the message channel as JSON lines over stdio.
//!
//! Each input line is one request envelope; each output line is either a
//! response (echoing the request `id`) or a progress notification. Export
//! and copy run in the background so `cancel` and `ping` stay responsive
//! while an operation is in flight. Responses travel through the same
//! forwarder as progress, so an operation's notifications are written
//! before its response.

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::cli::types::ServeArgs;
use crate::domain::models::{Config, Notification, ProgressEvent, RequestEnvelope, Response};
use crate::services::MessageRouter;

/// Serialize one outgoing line; a closed writer means stdout is gone.
fn send<T: Serialize>(tx: &mpsc::UnboundedSender<String>, message: &T) {
    match serde_json::to_string(message) {
        Ok(line) => {
            if tx.send(line).is_err() {
                debug!("output closed, dropping message");
            }
        }
        Err(err) => warn!(error = %err, "failed to serialize outgoing message"),
    }
}

/// Parse one input line into an envelope, or an error response.
pub fn parse_line(line: &str) -> Result<RequestEnvelope, Box<Response>> {
    let value: serde_json::Value = serde_json::from_str(line)
        .map_err(|err| Box::new(Response::error(format!("invalid message: {err}"))))?;
    let id = value.get("id").cloned();
    serde_json::from_value(value).map_err(|err| {
        Box::new(Response::error(format!("invalid request: {err}")).with_id(id))
    })
}

/// Write progress notifications and responses to `out` in causal order.
///
/// A response is written only after every progress event already queued on
/// `events` has been written, so an operation's notifications always precede
/// its terminal response. Returns once `responses` is closed and drained.
pub async fn forward_messages(
    mut events: broadcast::Receiver<ProgressEvent>,
    mut responses: mpsc::UnboundedReceiver<Response>,
    out: mpsc::UnboundedSender<String>,
) {
    let mut events_open = true;
    loop {
        tokio::select! {
            biased;
            received = events.recv(), if events_open => match received {
                Ok(event) => send(&out, &Notification::Progress(event)),
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "progress listener lagged"),
                Err(RecvError::Closed) => events_open = false,
            },
            response = responses.recv() => {
                flush_progress(&mut events, &out);
                match response {
                    Some(response) => send(&out, &response),
                    None => break,
                }
            }
        }
    }
}

fn flush_progress(events: &mut broadcast::Receiver<ProgressEvent>, out: &mpsc::UnboundedSender<String>) {
    loop {
        match events.try_recv() {
            Ok(event) => send(out, &Notification::Progress(event)),
            Err(TryRecvError::Lagged(skipped)) => debug!(skipped, "progress listener lagged"),
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

/// Serve requests until stdin closes, then finish in-flight operations.
pub async fn execute(args: ServeArgs, config: &Config) -> Result<()> {
    let service = super::build_service(config, &args.page, args.output_dir.as_deref()).await?;
    let router = MessageRouter::new(service.clone()).with_default_full_load(!args.page.no_full_load);

    // single writer keeps lines from interleaving
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = rx.recv().await {
            stdout.write_all(line.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
        Ok::<_, std::io::Error>(())
    });

    let (responses, response_rx) = mpsc::unbounded_channel::<Response>();
    let forwarder = tokio::spawn(forward_messages(service.subscribe(), response_rx, tx));

    info!("serving requests on stdin");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut operations = JoinSet::new();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        let envelope = match parse_line(&line) {
            Ok(envelope) => envelope,
            Err(response) => {
                warn!(error = ?response.error, "rejecting malformed request");
                if responses.send(*response).is_err() {
                    debug!("forwarder closed, dropping response");
                }
                continue;
            }
        };

        if MessageRouter::is_long_running(&envelope.request) {
            let router = router.clone();
            let responses = responses.clone();
            operations.spawn(async move {
                let response = router.handle_envelope(envelope).await;
                if responses.send(response).is_err() {
                    debug!("forwarder closed, dropping response");
                }
            });
        } else {
            let response = router.handle_envelope(envelope).await;
            if responses.send(response).is_err() {
                debug!("forwarder closed, dropping response");
            }
        }

        while operations.try_join_next().is_some() {}
    }

    info!(pending = operations.len(), "input closed, finishing in-flight operations");
    while let Some(joined) = operations.join_next().await {
        if let Err(err) = joined {
            warn!(error = %err, "operation task failed");
        }
    }

    drop(responses);
    if let Err(err) = forwarder.await {
        warn!(error = %err, "message forwarder failed");
    }
    writer
        .await
        .context("Output writer task failed")?
        .context("Failed to write stdout")?;
    Ok(())
}
