use super::{
    Backend, DeleteReply, DeleteRequest, ExportFile, ResultsReply, ScanRequest, StartScanReply,
    DEFAULT_EXPORT_NAME,
};
use crate::error::AppError;
use crate::state::{JobKind, JobProgress, SenderRecord};
use async_trait::async_trait;
use regex::Regex;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::{Client, ClientBuilder};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::warn;
use url::Url;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

static FILENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)filename\*?=(?:UTF-8'')?"?([^";]+)"?"#).unwrap());

/// Decodes a reply body the client only logs; anything unreadable becomes the default.
fn lenient_reply<T>(endpoint: &str, body: &[u8]) -> T
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return T::default();
    }
    match serde_json::from_slice(body).map_err(AppError::from) {
        Ok(reply) => reply,
        Err(e) => {
            warn!(endpoint, error = %e, "Ignoring unreadable reply body");
            T::default()
        }
    }
}

/// Picks a bare file name out of a `Content-Disposition` header.
fn export_file_name(disposition: Option<&str>) -> String {
    disposition
        .and_then(|value| FILENAME_RE.captures(value))
        .and_then(|caps| caps.get(1))
        .and_then(|m| Path::new(m.as_str().trim()).file_name())
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_EXPORT_NAME.to_string())
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(base: Url) -> Result<Self, AppError> {
        Self::with_builder(base, Client::builder())
    }

    #[cfg(test)]
    pub fn without_proxy(base: Url) -> Result<Self, AppError> {
        Self::with_builder(base, Client::builder().no_proxy())
    }

    fn with_builder(base: Url, builder: ClientBuilder) -> Result<Self, AppError> {
        let client = builder.connect_timeout(CONNECT_TIMEOUT).build()?;
        Ok(Self { client, base })
    }

    fn endpoint(&self, path: &str) -> Result<Url, AppError> {
        Ok(self.base.join(path)?)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn start_scan(&self, request: &ScanRequest) -> Result<StartScanReply, AppError> {
        let body = self
            .client
            .post(self.endpoint("start-scan")?)
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(lenient_reply("start-scan", &body))
    }

    async fn progress(&self, job: JobKind) -> Result<JobProgress, AppError> {
        let progress = self
            .client
            .get(self.endpoint(job.progress_path())?)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(progress)
    }

    async fn results(&self) -> Result<Vec<SenderRecord>, AppError> {
        let reply: ResultsReply = self
            .client
            .get(self.endpoint("results")?)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(reply.senders)
    }

    async fn delete(&self, sender: &str) -> Result<DeleteReply, AppError> {
        let body = DeleteRequest {
            sender: sender.to_string(),
        };
        let reply = self
            .client
            .post(self.endpoint("delete")?)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(lenient_reply("delete", &reply))
    }

    async fn export(&self) -> Result<ExportFile, AppError> {
        let response = self
            .client
            .get(self.endpoint("export")?)
            .send()
            .await?
            .error_for_status()?;
        let file_name = export_file_name(
            response
                .headers()
                .get(CONTENT_DISPOSITION)
                .and_then(|v| v.to_str().ok()),
        );
        let bytes = response.bytes().await?.to_vec();
        Ok(ExportFile { file_name, bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{header, StatusCode},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tokio::{net::TcpListener, sync::Mutex};

    type Captured = Arc<Mutex<Vec<(String, Value)>>>;

    async fn spawn_panel_server() -> (Url, Captured) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let captured: Captured = Arc::new(Mutex::new(Vec::new()));

        let scan_log = captured.clone();
        let delete_log = captured.clone();
        let app = Router::new()
            .route(
                "/start-scan",
                post(move |Json(body): Json<Value>| async move {
                    scan_log.lock().await.push(("start-scan".to_string(), body));
                    Json(json!({"status": "started"}))
                }),
            )
            .route(
                "/progress",
                get(|| async {
                    Json(json!({
                        "in_progress": true,
                        "total": 3,
                        "done": 1,
                        "stats": {},
                        "sender_to_ids": {},
                        "days": 30,
                        "label": "INBOX"
                    }))
                }),
            )
            .route(
                "/delete-progress",
                get(|| async { Json(json!({"in_progress": false, "total": 0, "done": 0})) }),
            )
            .route(
                "/results",
                get(|| async {
                    Json(json!({"senders": [
                        {"sender": "News <news@example.com>",
                         "info": {"email": "news@example.com", "domain": "example.com", "count": 4}},
                        {"sender": "broken", "info": {"email": null}}
                    ]}))
                }),
            )
            .route(
                "/delete",
                post(move |Json(body): Json<Value>| async move {
                    delete_log.lock().await.push(("delete".to_string(), body));
                    Json(json!({"deleted": 4}))
                }),
            )
            .route(
                "/export",
                get(|| async {
                    (
                        [
                            (header::CONTENT_TYPE, "text/csv"),
                            (
                                header::CONTENT_DISPOSITION,
                                "attachment; filename=marketing_senders.csv",
                            ),
                        ],
                        "Sender;Email;Domain;Count\n",
                    )
                }),
            );
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let base = crate::config::base_url(&format!("http://{addr}")).expect("base url");
        (base, captured)
    }

    async fn spawn_broken_server() -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let app = Router::new()
            .route(
                "/progress",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
            )
            .route("/results", get(|| async { "<html>not json</html>" }));
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        crate::config::base_url(&format!("http://{addr}")).expect("base url")
    }

    async fn spawn_terse_server() -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let app = Router::new()
            .route("/start-scan", post(|| async { "" }))
            .route("/delete", post(|| async { "ok" }));
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        crate::config::base_url(&format!("http://{addr}")).expect("base url")
    }

    #[tokio::test]
    async fn start_scan_posts_days_and_label() {
        let (base, captured) = spawn_panel_server().await;
        let backend = HttpBackend::without_proxy(base).expect("client");

        let reply = backend
            .start_scan(&ScanRequest {
                days: "30".to_string(),
                label: "promotions".to_string(),
            })
            .await
            .expect("start scan");

        assert!(!reply.already_running());
        let log = captured.lock().await;
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].0, "start-scan");
        assert_eq!(log[0].1, json!({"days": "30", "label": "promotions"}));
    }

    #[tokio::test]
    async fn progress_reads_each_job_endpoint() {
        let (base, _) = spawn_panel_server().await;
        let backend = HttpBackend::without_proxy(base).expect("client");

        let scan = backend.progress(JobKind::Scan).await.expect("scan progress");
        assert_eq!(
            scan,
            JobProgress {
                done: 1,
                total: 3,
                in_progress: true
            }
        );
        assert_eq!(scan.percent(), 33);

        let delete = backend
            .progress(JobKind::Delete)
            .await
            .expect("delete progress");
        assert!(!delete.in_progress);
    }

    #[tokio::test]
    async fn results_tolerate_malformed_records() {
        let (base, _) = spawn_panel_server().await;
        let backend = HttpBackend::without_proxy(base).expect("client");

        let senders = backend.results().await.expect("results");
        assert_eq!(senders.len(), 2);
        assert_eq!(senders[0].info.count, 4);
        assert_eq!(senders[1].sender, "broken");
        assert_eq!(senders[1].info.email, "");
        assert_eq!(senders[1].info.count, 0);
    }

    #[tokio::test]
    async fn delete_posts_sender() {
        let (base, captured) = spawn_panel_server().await;
        let backend = HttpBackend::without_proxy(base).expect("client");

        let reply = backend.delete("news@example.com").await.expect("delete");
        assert_eq!(reply.deleted, Some(4));

        let log = captured.lock().await;
        assert_eq!(log[0].0, "delete");
        assert_eq!(log[0].1, json!({"sender": "news@example.com"}));
    }

    #[tokio::test]
    async fn empty_or_plain_text_replies_still_succeed() {
        let base = spawn_terse_server().await;
        let backend = HttpBackend::without_proxy(base).expect("client");

        let started = backend
            .start_scan(&ScanRequest {
                days: "30".to_string(),
                label: "INBOX".to_string(),
            })
            .await
            .expect("start scan");
        assert_eq!(started, StartScanReply::default());

        let deleted = backend.delete("news@example.com").await.expect("delete");
        assert_eq!(deleted, DeleteReply::default());
    }

    #[test]
    fn lenient_reply_reads_known_fields() {
        let reply: StartScanReply =
            lenient_reply("start-scan", br#"{"status": "already_running"}"#);
        assert!(reply.already_running());

        let reply: DeleteReply = lenient_reply("delete", b"  \n");
        assert_eq!(reply.deleted, None);

        let reply: DeleteReply = lenient_reply("delete", br#"{"deleted": 12}"#);
        assert_eq!(reply.deleted, Some(12));
    }

    #[tokio::test]
    async fn export_uses_disposition_file_name() {
        let (base, _) = spawn_panel_server().await;
        let backend = HttpBackend::without_proxy(base).expect("client");

        let file = backend.export().await.expect("export");
        assert_eq!(file.file_name, "marketing_senders.csv");
        assert_eq!(file.bytes, b"Sender;Email;Domain;Count\n".to_vec());
    }

    #[tokio::test]
    async fn server_errors_and_bad_bodies_surface_as_errors() {
        let base = spawn_broken_server().await;
        let backend = HttpBackend::without_proxy(base).expect("client");

        assert!(matches!(
            backend.progress(JobKind::Scan).await,
            Err(AppError::Transport(_))
        ));
        assert!(matches!(backend.results().await, Err(AppError::Decode(_))));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let base = crate::config::base_url(&format!("http://{addr}")).expect("base url");
        let backend = HttpBackend::without_proxy(base).expect("client");
        assert!(matches!(
            backend.results().await,
            Err(AppError::Transport(_))
        ));
    }

    #[test]
    fn export_name_strips_paths_and_quotes() {
        assert_eq!(
            export_file_name(Some("attachment; filename=\"../../etc/senders.csv\"")),
            "senders.csv"
        );
        assert_eq!(
            export_file_name(Some("attachment; filename*=UTF-8''report.csv")),
            "report.csv"
        );
        assert_eq!(export_file_name(Some("attachment")), DEFAULT_EXPORT_NAME);
        assert_eq!(export_file_name(None), DEFAULT_EXPORT_NAME);
    }
}
