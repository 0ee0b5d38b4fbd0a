//! Streamed POST transport feeding a [`FrameDecoder`].

use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use sip_core::FrameDecoder;
use tokio_util::sync::CancellationToken;

use engine_logging::{engine_debug, engine_info, engine_trace};

use crate::client::{ensure_success, map_reqwest_error};
use crate::{ApiClient, FailureKind, FetchError};

/// Receives frame payloads in arrival order.
pub trait FrameSink: Send + Sync {
    fn frame(&self, payload: String);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The server closed the body.
    Finished,
    /// The token fired before the body ended.
    Cancelled,
}

/// POSTs `payload` to `endpoint` with `Accept: text/event-stream` and forwards
/// every frame payload to `sink` until the body ends or `cancel` fires.
pub async fn run_stream(
    client: &ApiClient,
    endpoint: &str,
    payload: &Value,
    cancel: &CancellationToken,
    sink: &dyn FrameSink,
) -> Result<StreamOutcome, FetchError> {
    let url = client.endpoint_url(endpoint)?;
    let body = serde_json::to_vec(payload)
        .map_err(|err| FetchError::new(FailureKind::InvalidResponse, err.to_string()))?;

    let request = client
        .http()
        .post(url)
        .header(CONTENT_TYPE, "application/json")
        .header(ACCEPT, "text/event-stream")
        .body(body)
        .send();
    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Ok(StreamOutcome::Cancelled),
        response = request => response.map_err(map_reqwest_error)?,
    };
    let response = ensure_success(response).await.map_err(|err| match err.kind {
        FailureKind::HttpStatus(code) => {
            FetchError::new(err.kind, format!("HTTP error! status: {code}"))
        }
        _ => err,
    })?;
    engine_info!("Stream opened for /{endpoint}");

    let mut decoder = FrameDecoder::with_line_carry(client.settings().carry_partial_lines);
    let mut chunks = response.bytes_stream();
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(StreamOutcome::Cancelled),
            next = chunks.next() => next,
        };
        let Some(chunk) = next else {
            break;
        };
        let chunk = chunk.map_err(map_reqwest_error)?;
        engine_debug!("/{endpoint}: {} bytes", chunk.len());
        for payload in decoder.feed(&chunk) {
            engine_trace!("/{endpoint} frame: {payload}");
            sink.frame(payload);
        }
    }
    for payload in decoder.finish() {
        sink.frame(payload);
    }
    engine_info!("Stream for /{endpoint} finished");
    Ok(StreamOutcome::Finished)
}
