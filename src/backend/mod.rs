pub mod http;
#[cfg(test)]
pub mod mock;

use crate::error::AppError;
use crate::state::{JobKind, JobProgress, SenderRecord};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use http::HttpBackend;

pub const DEFAULT_EXPORT_NAME: &str = "marketing_senders.csv";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    pub days: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub sender: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StartScanReply {
    #[serde(default)]
    pub status: Option<String>,
}

impl StartScanReply {
    pub fn already_running(&self) -> bool {
        self.status.as_deref() == Some("already_running")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeleteReply {
    #[serde(default)]
    pub deleted: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultsReply {
    #[serde(default)]
    pub senders: Vec<SenderRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// The scan backend's HTTP surface.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn start_scan(&self, request: &ScanRequest) -> Result<StartScanReply, AppError>;

    async fn progress(&self, job: JobKind) -> Result<JobProgress, AppError>;

    async fn results(&self) -> Result<Vec<SenderRecord>, AppError>;

    /// Returns once the backend has finished deleting.
    async fn delete(&self, sender: &str) -> Result<DeleteReply, AppError>;

    async fn export(&self) -> Result<ExportFile, AppError>;
}
