//! User actions → background commands, background events → UI state.
//!
//! The coordinator is the only place `AppState` is mutated. It never performs
//! I/O itself: actions queue a [`UiCommand`] for the bridge, and the bridge's
//! [`BackgroundEvent`]s are folded back in through [`Coordinator::apply`].

use crate::bridge::{BackgroundEvent, UiCommand};
use crate::state::{AppState, SortKey, TrackState};
use crate::view::{self, RowView};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct Coordinator {
    state: AppState,
    cmd_tx: UnboundedSender<UiCommand>,
    /// Sequence number of the last refresh queued.
    refresh_seq: u64,
    /// Sequence number of the snapshot currently shown.
    shown_refresh: u64,
}

impl Coordinator {
    pub fn new(cmd_tx: UnboundedSender<UiCommand>) -> Self {
        Self {
            state: AppState::default(),
            cmd_tx,
            refresh_seq: 0,
            shown_refresh: 0,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn visible_rows(&self) -> Vec<RowView<'_>> {
        view::render(&self.state.senders, self.state.sort, &self.state.domain_filter)
    }

    fn dispatch(&mut self, cmd: UiCommand) -> bool {
        let name = cmd.name();
        match self.cmd_tx.send(cmd) {
            Ok(()) => {
                debug!(command = name, "queued ui->background command");
                true
            }
            Err(_) => {
                self.state.error_message =
                    Some("Background worker stopped; restart the app".to_string());
                false
            }
        }
    }

    pub fn set_days(&mut self, days: impl Into<String>) {
        self.state.days = days.into();
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.state.label = label.into();
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.state.domain_filter = filter.into();
    }

    pub fn select_sort(&mut self, key: SortKey) {
        self.state.sort = self.state.sort.select(key);
    }

    /// No-op while a scan is already running.
    pub fn start_scan(&mut self) -> bool {
        if self.state.scan.is_running() {
            debug!("Scan already running; ignoring start request");
            return false;
        }

        self.state.scan = TrackState::Running { percent: 0 };
        self.state.scan_status = "Scanning...".to_string();
        self.state.error_message = None;

        let cmd = UiCommand::StartScan {
            days: self.state.days.clone(),
            label: self.state.label.clone(),
        };
        if !self.dispatch(cmd) {
            self.state.scan = TrackState::Failed("background worker unavailable".to_string());
            self.state.scan_status = "Scan failed.".to_string();
            return false;
        }
        true
    }

    /// Opens the confirmation prompt; nothing is sent until it is confirmed.
    pub fn request_delete(&mut self, sender: impl Into<String>) {
        if self.state.delete.is_running() {
            warn!("Delete already running; ignoring request");
            return;
        }
        self.state.pending_delete = Some(sender.into());
    }

    pub fn confirmation_prompt(&self) -> Option<String> {
        self.state
            .pending_delete
            .as_ref()
            .map(|sender| format!("Delete all emails from: {sender}?"))
    }

    pub fn cancel_delete(&mut self) {
        if let Some(sender) = self.state.pending_delete.take() {
            debug!(sender = %sender, "Delete cancelled");
        }
    }

    pub fn confirm_delete(&mut self) -> bool {
        let Some(sender) = self.state.pending_delete.take() else {
            return false;
        };

        self.state.delete = TrackState::Running { percent: 0 };
        self.state.delete_status = format!("Deleting emails from {sender}...");
        self.state.error_message = None;

        if !self.dispatch(UiCommand::StartDelete { sender }) {
            self.state.delete = TrackState::Failed("background worker unavailable".to_string());
            return false;
        }
        true
    }

    pub fn export(&mut self) -> bool {
        if !self.state.export_enabled {
            return false;
        }
        self.state.notice = Some("Exporting...".to_string());
        self.dispatch(UiCommand::Export)
    }

    /// Refreshes run concurrently, so each carries a sequence number and only
    /// a snapshot newer than the one on screen is applied.
    pub fn refresh(&mut self) -> bool {
        self.refresh_seq += 1;
        self.dispatch(UiCommand::Refresh {
            seq: self.refresh_seq,
        })
    }

    pub fn apply(&mut self, event: BackgroundEvent) {
        match event {
            BackgroundEvent::ScanProgress(progress) => {
                if self.state.scan.is_running() {
                    let percent = progress.percent();
                    self.state.scan = TrackState::Running { percent };
                    self.state.scan_status = format!("Scanning... {percent}%");
                }
            }
            BackgroundEvent::ScanComplete => {
                self.state.scan = TrackState::Completed;
                self.state.scan_status = "Completed.".to_string();
                self.state.export_enabled = true;
                self.refresh();
            }
            BackgroundEvent::ScanError(msg) => {
                self.state.scan_status = "Scan failed.".to_string();
                self.state.error_message = Some(format!("Scan failed: {msg}"));
                self.state.scan = TrackState::Failed(msg);
            }
            BackgroundEvent::DeleteProgress(progress) => {
                if self.state.delete.is_running() {
                    self.state.delete = TrackState::Running {
                        percent: progress.percent(),
                    };
                }
            }
            BackgroundEvent::DeleteComplete { sender, deleted } => {
                self.state.delete = TrackState::Completed;
                self.state.delete_status = match deleted {
                    Some(n) => format!("Deleted {n} emails from {sender}"),
                    None => format!("Deleted emails from {sender}"),
                };
                self.refresh();
            }
            BackgroundEvent::DeleteError(msg) => {
                self.state.delete_status = "Delete failed.".to_string();
                self.state.error_message = Some(msg.clone());
                self.state.delete = TrackState::Failed(msg);
            }
            BackgroundEvent::Results { seq, senders } => {
                if seq <= self.shown_refresh {
                    debug!(seq, shown = self.shown_refresh, "Dropping stale results");
                    return;
                }
                self.shown_refresh = seq;
                self.state.senders = senders;
            }
            BackgroundEvent::ResultsError { seq, msg } => {
                if seq <= self.shown_refresh {
                    debug!(seq, "Ignoring failure of a superseded refresh");
                    return;
                }
                self.state.error_message = Some(format!("Could not load results: {msg}"));
            }
            BackgroundEvent::ExportSaved(path) => {
                self.state.notice = Some(format!("Exported to {}", path.display()));
            }
            BackgroundEvent::ExportError(msg) => {
                self.state.notice = None;
                self.state.error_message = Some(format!("Export failed: {msg}"));
            }
        }
    }
}
