//! Scripted in-memory backend for poller and bridge tests.

use super::{Backend, DeleteReply, ExportFile, ScanRequest, StartScanReply};
use crate::error::AppError;
use crate::state::{JobKind, JobProgress, SenderInfo, SenderRecord};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    StartScan(ScanRequest),
    Progress(JobKind),
    Results,
    Delete(String),
    Export,
}

pub type Step = Result<JobProgress, String>;

pub fn running(done: u64, total: u64) -> Step {
    Ok(JobProgress {
        done,
        total,
        in_progress: true,
    })
}

pub fn finished(done: u64, total: u64) -> Step {
    Ok(JobProgress {
        done,
        total,
        in_progress: false,
    })
}

pub fn record(sender: &str, domain: &str, count: u64) -> SenderRecord {
    SenderRecord {
        sender: sender.to_string(),
        info: SenderInfo {
            email: sender.to_string(),
            domain: domain.to_string(),
            count,
        },
    }
}

#[derive(Debug, Default)]
pub struct MockBackend {
    calls: Mutex<Vec<Call>>,
    scan_steps: Mutex<VecDeque<Step>>,
    delete_steps: Mutex<VecDeque<Step>>,
    results: Mutex<Vec<SenderRecord>>,
    fail_start_scan: Option<String>,
    fail_delete: Option<String>,
    fail_results: Option<String>,
    delete_delay: Option<Duration>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scan_steps(self, steps: impl IntoIterator<Item = Step>) -> Self {
        *self.scan_steps.lock().unwrap() = steps.into_iter().collect();
        self
    }

    pub fn with_delete_steps(self, steps: impl IntoIterator<Item = Step>) -> Self {
        *self.delete_steps.lock().unwrap() = steps.into_iter().collect();
        self
    }

    pub fn with_results(self, results: Vec<SenderRecord>) -> Self {
        *self.results.lock().unwrap() = results;
        self
    }

    /// Makes `/delete` answer only after `delay`, like a backend deleting for real.
    pub fn with_delete_delay(mut self, delay: Duration) -> Self {
        self.delete_delay = Some(delay);
        self
    }

    pub fn failing_start_scan(mut self, err: impl Into<String>) -> Self {
        self.fail_start_scan = Some(err.into());
        self
    }

    pub fn failing_delete(mut self, err: impl Into<String>) -> Self {
        self.fail_delete = Some(err.into());
        self
    }

    pub fn failing_results(mut self, err: impl Into<String>) -> Self {
        self.fail_results = Some(err.into());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn progress_calls(&self, job: JobKind) -> usize {
        self.calls()
            .iter()
            .filter(|c| **c == Call::Progress(job))
            .count()
    }

    fn record_call(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn start_scan(&self, request: &ScanRequest) -> Result<StartScanReply, AppError> {
        self.record_call(Call::StartScan(request.clone()));
        if let Some(err) = &self.fail_start_scan {
            return Err(AppError::Transport(err.clone()));
        }
        Ok(StartScanReply {
            status: Some("started".to_string()),
        })
    }

    async fn progress(&self, job: JobKind) -> Result<JobProgress, AppError> {
        self.record_call(Call::Progress(job));
        let steps = match job {
            JobKind::Scan => &self.scan_steps,
            JobKind::Delete => &self.delete_steps,
        };
        // An exhausted script reports an idle job.
        match steps.lock().unwrap().pop_front() {
            Some(step) => step.map_err(AppError::Transport),
            None => Ok(JobProgress::default()),
        }
    }

    async fn results(&self) -> Result<Vec<SenderRecord>, AppError> {
        self.record_call(Call::Results);
        if let Some(err) = &self.fail_results {
            return Err(AppError::Transport(err.clone()));
        }
        Ok(self.results.lock().unwrap().clone())
    }

    async fn delete(&self, sender: &str) -> Result<DeleteReply, AppError> {
        self.record_call(Call::Delete(sender.to_string()));
        if let Some(delay) = self.delete_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = &self.fail_delete {
            return Err(AppError::Transport(err.clone()));
        }
        let mut results = self.results.lock().unwrap();
        let deleted = results
            .iter()
            .find(|r| r.sender == sender)
            .map(|r| r.info.count);
        results.retain(|r| r.sender != sender);
        Ok(DeleteReply { deleted })
    }

    async fn export(&self) -> Result<ExportFile, AppError> {
        self.record_call(Call::Export);
        Ok(ExportFile {
            file_name: "marketing_senders.csv".to_string(),
            bytes: b"Sender;Email;Domain;Count\n".to_vec(),
        })
    }
}
