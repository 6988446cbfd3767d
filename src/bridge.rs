use crate::backend::{Backend, HttpBackend, ScanRequest};
use crate::config::{PollConfig, Settings};
use crate::error::AppError;
use crate::poller;
use crate::state::{JobKind, JobProgress, SenderRecord};
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc as tokio_mpsc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    StartScan { days: String, label: String },
    StartDelete { sender: String },
    Refresh { seq: u64 },
    Export,
}

impl UiCommand {
    pub fn name(&self) -> &'static str {
        match self {
            UiCommand::StartScan { .. } => "start_scan",
            UiCommand::StartDelete { .. } => "start_delete",
            UiCommand::Refresh { .. } => "refresh",
            UiCommand::Export => "export",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackgroundEvent {
    ScanProgress(JobProgress),
    ScanComplete,
    ScanError(String),
    DeleteProgress(JobProgress),
    DeleteComplete {
        sender: String,
        deleted: Option<u64>,
    },
    DeleteError(String),
    Results {
        seq: u64,
        senders: Vec<SenderRecord>,
    },
    ResultsError {
        seq: u64,
        msg: String,
    },
    ExportSaved(PathBuf),
    ExportError(String),
}

pub type Repaint = Arc<dyn Fn() + Send + Sync>;

/// Delivers events to the UI thread and wakes it up.
#[derive(Clone)]
pub struct EventSink {
    tx: async_channel::Sender<BackgroundEvent>,
    repaint: Repaint,
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink")
            .field("closed", &self.tx.is_closed())
            .finish_non_exhaustive()
    }
}

impl EventSink {
    pub fn new(tx: async_channel::Sender<BackgroundEvent>, repaint: Repaint) -> Self {
        Self { tx, repaint }
    }

    pub fn send(&self, event: BackgroundEvent) {
        if let Err(e) = self.tx.try_send(event) {
            warn!("Failed to send background event to UI: {}", e);
        }
        (self.repaint)();
    }
}

/// Everything a background task needs to run one command.
#[derive(Clone)]
pub struct Worker {
    backend: Arc<dyn Backend>,
    poll: PollConfig,
    export_dir: PathBuf,
    events: EventSink,
}

impl fmt::Debug for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("poll", &self.poll)
            .field("export_dir", &self.export_dir)
            .finish_non_exhaustive()
    }
}

impl Worker {
    pub fn new(
        backend: Arc<dyn Backend>,
        poll: PollConfig,
        export_dir: PathBuf,
        events: EventSink,
    ) -> Self {
        Self {
            backend,
            poll,
            export_dir,
            events,
        }
    }

    pub async fn handle(&self, cmd: UiCommand) {
        match cmd {
            UiCommand::StartScan { days, label } => {
                self.run_scan(ScanRequest { days, label }).await;
            }
            UiCommand::StartDelete { sender } => self.run_delete(sender).await,
            UiCommand::Refresh { seq } => self.run_refresh(seq).await,
            UiCommand::Export => self.run_export().await,
        }
    }

    async fn run_scan(&self, request: ScanRequest) {
        info!(days = %request.days, label = %request.label, "Starting scan");

        match self.backend.start_scan(&request).await {
            Ok(reply) if reply.already_running() => {
                info!("Backend already has a scan running; following its progress");
            }
            Ok(_) => {}
            Err(e) => {
                error!("Failed to start scan: {}", e);
                self.events.send(BackgroundEvent::ScanError(e.to_string()));
                return;
            }
        }

        let polled = poller::poll_job(self.backend.as_ref(), JobKind::Scan, &self.poll, |p| {
            self.events.send(BackgroundEvent::ScanProgress(*p));
        })
        .await;

        match polled {
            Ok(last) => {
                info!(scanned = last.done, "Scan complete");
                self.events.send(BackgroundEvent::ScanComplete);
            }
            Err(e) => {
                error!("Scan progress polling failed: {}", e);
                self.events.send(BackgroundEvent::ScanError(e.to_string()));
            }
        }
    }

    /// Polls delete progress while the delete request is in flight. An idle
    /// sample only counts once it was taken after the request returned, so a
    /// stale reading from before the backend registered the delete is skipped.
    async fn run_delete(&self, sender: String) {
        info!(sender = %sender, "Starting delete");

        let request_done = AtomicBool::new(false);
        let request = async {
            let reply = self.backend.delete(&sender).await;
            request_done.store(true, Ordering::SeqCst);
            reply
        };
        let polling = poller::poll_job_until(
            self.backend.as_ref(),
            JobKind::Delete,
            &self.poll,
            |p| self.events.send(BackgroundEvent::DeleteProgress(*p)),
            || request_done.load(Ordering::SeqCst),
        );
        let (reply, polled) = futures::future::join(request, polling).await;

        match (reply, polled) {
            (Ok(reply), Ok(_)) => {
                info!(sender = %sender, deleted = ?reply.deleted, "Delete complete");
                self.events.send(BackgroundEvent::DeleteComplete {
                    sender,
                    deleted: reply.deleted,
                });
            }
            (Err(e), _) | (_, Err(e)) => {
                error!("Failed to delete emails from {}: {}", sender, e);
                self.events.send(BackgroundEvent::DeleteError(format!(
                    "Failed to purge {}: {}",
                    sender, e
                )));
            }
        }
    }

    async fn run_refresh(&self, seq: u64) {
        match poller::retrying(&self.poll.failure, "results", || self.backend.results()).await {
            Ok(senders) => {
                debug!(seq, senders = senders.len(), "Fetched results");
                self.events.send(BackgroundEvent::Results { seq, senders });
            }
            Err(e) => {
                error!("Failed to fetch results: {}", e);
                self.events.send(BackgroundEvent::ResultsError {
                    seq,
                    msg: e.to_string(),
                });
            }
        }
    }

    async fn run_export(&self) {
        match self.export_to_disk().await {
            Ok(path) => {
                info!(path = %path.display(), "Exported senders");
                self.events.send(BackgroundEvent::ExportSaved(path));
            }
            Err(e) => {
                error!("Export failed: {}", e);
                self.events.send(BackgroundEvent::ExportError(e.to_string()));
            }
        }
    }

    async fn export_to_disk(&self) -> Result<PathBuf, AppError> {
        let file = self.backend.export().await?;
        tokio::fs::create_dir_all(&self.export_dir).await?;
        let path = self.export_dir.join(&file.file_name);
        tokio::fs::write(&path, &file.bytes).await?;
        Ok(path)
    }
}

#[derive(Debug)]
pub struct BridgeChannels {
    pub cmd_tx: tokio_mpsc::UnboundedSender<UiCommand>,
    pub event_rx: async_channel::Receiver<BackgroundEvent>,
}

pub fn setup_bridge(settings: &Settings, repaint: Repaint) -> Result<BridgeChannels, AppError> {
    let backend: Arc<dyn Backend> = Arc::new(HttpBackend::new(settings.backend_url.clone())?);
    let (cmd_tx, cmd_rx) = tokio_mpsc::unbounded_channel::<UiCommand>();
    let (event_tx, event_rx) = async_channel::unbounded::<BackgroundEvent>();

    let worker = Worker::new(
        backend,
        settings.poll.clone(),
        settings.export_dir.clone(),
        EventSink::new(event_tx, repaint),
    );
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    std::thread::Builder::new()
        .name("sender-sweep-bridge".to_string())
        .spawn(move || rt.block_on(background_loop(cmd_rx, worker)))?;

    Ok(BridgeChannels { cmd_tx, event_rx })
}

async fn background_loop(mut cmd_rx: tokio_mpsc::UnboundedReceiver<UiCommand>, worker: Worker) {
    while let Some(cmd) = cmd_rx.recv().await {
        debug!(command = cmd.name(), "Received UI command");
        let worker = worker.clone();
        tokio::spawn(async move {
            worker.handle(cmd).await;
        });
    }
    info!("UI command channel closed; background loop exiting");
}
