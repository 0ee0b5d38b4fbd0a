use std::collections::HashMap;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};
use sip_core::OperationKind;
use tokio_util::sync::CancellationToken;

use crate::retrieval::{LocalFileReader, ReportRetriever};
use crate::stream::{run_stream, FrameSink, StreamOutcome};
use crate::{api, ApiClient, ClientSettings, EngineCommand, EngineEvent, FetchError};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] FetchError),
}

/// Owns the IO thread. Commands go in over one channel, events come back over another.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(
        settings: ClientSettings,
        reader: Option<Arc<dyn LocalFileReader>>,
    ) -> Result<Self, EngineError> {
        let client = ApiClient::new(settings)?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        let retriever = Arc::new(ReportRetriever::new(client.clone(), reader));
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let mut streams: HashMap<OperationKind, CancellationToken> = HashMap::new();
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::OpenStream { operation, .. } => {
                        if let Some(previous) = streams.remove(&operation) {
                            previous.cancel();
                        }
                        let token = CancellationToken::new();
                        streams.insert(operation, token.clone());
                        let ctx = Context::new(&client, &retriever, &event_tx);
                        runtime.spawn(async move { ctx.handle(command, Some(token)).await });
                    }
                    EngineCommand::CancelStream { operation } => {
                        if let Some(token) = streams.remove(&operation) {
                            engine_info!("Cancelling {} stream", operation.label());
                            token.cancel();
                        }
                    }
                    command => {
                        let ctx = Context::new(&client, &retriever, &event_tx);
                        runtime.spawn(async move { ctx.handle(command, None).await });
                    }
                }
            }
            engine_debug!("Engine command channel closed");
            for token in streams.values() {
                token.cancel();
            }
            runtime.shutdown_timeout(Duration::from_secs(1));
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            engine_warn!("Engine thread is gone; command dropped");
        }
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

struct Context {
    client: ApiClient,
    retriever: Arc<ReportRetriever>,
    event_tx: mpsc::Sender<EngineEvent>,
}

impl Context {
    fn new(
        client: &ApiClient,
        retriever: &Arc<ReportRetriever>,
        event_tx: &mpsc::Sender<EngineEvent>,
    ) -> Self {
        Self {
            client: client.clone(),
            retriever: retriever.clone(),
            event_tx: event_tx.clone(),
        }
    }

    fn emit(&self, event: EngineEvent) {
        let _ = self.event_tx.send(event);
    }

    async fn handle(self, command: EngineCommand, token: Option<CancellationToken>) {
        match command {
            EngineCommand::LoadFormConfig => {
                let result = api::load_form_config(&self.client).await;
                self.emit(EngineEvent::FormConfigLoaded(result));
            }
            EngineCommand::LoadConditionalFields { goal_type } => {
                let result = api::load_conditional_fields(&self.client, &goal_type).await;
                self.emit(EngineEvent::ConditionalFieldsLoaded { goal_type, result });
            }
            EngineCommand::Validate { form } => {
                let result = api::validate_form(&self.client, &form).await;
                self.emit(EngineEvent::ValidationFinished(result));
            }
            EngineCommand::OpenStream {
                operation,
                run,
                endpoint,
                payload,
            } => {
                let token = token.unwrap_or_default();
                let sink = ChannelFrameSink {
                    operation,
                    run,
                    token: token.clone(),
                    tx: self.event_tx.clone(),
                };
                match run_stream(&self.client, &endpoint, &payload, &token, &sink).await {
                    Ok(StreamOutcome::Finished) if !token.is_cancelled() => {
                        self.emit(EngineEvent::StreamEnded { operation, run });
                    }
                    Ok(_) => engine_info!("{} stream cancelled", operation.label()),
                    Err(error) if !token.is_cancelled() => {
                        engine_warn!("{} stream failed: {error}", operation.label());
                        self.emit(EngineEvent::StreamFailed {
                            operation,
                            run,
                            error,
                        });
                    }
                    Err(_) => {}
                }
            }
            EngineCommand::FetchReport { operation, path } => {
                let outcome = self.retriever.retrieve(&path).await;
                self.emit(EngineEvent::ReportRetrieved {
                    operation,
                    path,
                    outcome,
                });
            }
            EngineCommand::ScheduleResultsTransition { operation, delay } => {
                tokio::time::sleep(delay).await;
                self.emit(EngineEvent::ResultsDelayElapsed { operation });
            }
            EngineCommand::CancelStream { .. } => {}
        }
    }
}

/// Forwards frames until the stream's token is cancelled.
struct ChannelFrameSink {
    operation: OperationKind,
    run: u64,
    token: CancellationToken,
    tx: mpsc::Sender<EngineEvent>,
}

impl FrameSink for ChannelFrameSink {
    fn frame(&self, payload: String) {
        if self.token.is_cancelled() {
            return;
        }
        let _ = self.tx.send(EngineEvent::StreamFrame {
            operation: self.operation,
            run: self.run,
            payload,
        });
    }
}
