use serde::{Deserialize, Deserializer};

/// Treats both a missing and a `null` field as the type's default.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SenderInfo {
    #[serde(default, deserialize_with = "nullable")]
    pub email: String,
    #[serde(default, deserialize_with = "nullable")]
    pub domain: String,
    #[serde(default, deserialize_with = "nullable")]
    pub count: u64,
}

/// One aggregated sender as reported by `/results`. Replaced wholesale on refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SenderRecord {
    #[serde(default, deserialize_with = "nullable")]
    pub sender: String,
    #[serde(default, deserialize_with = "nullable")]
    pub info: SenderInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Sender,
    Email,
    Domain,
    Count,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [
        SortKey::Sender,
        SortKey::Email,
        SortKey::Domain,
        SortKey::Count,
    ];

    /// Biggest count first, otherwise A before Z.
    pub fn default_direction(self) -> SortDirection {
        match self {
            SortKey::Count => SortDirection::Descending,
            _ => SortDirection::Ascending,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Sender => "Sender",
            SortKey::Email => "Email",
            SortKey::Domain => "Domain",
            SortKey::Count => "Count",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            key: SortKey::Count,
            direction: SortDirection::Descending,
        }
    }
}

impl SortSpec {
    /// Re-selecting the current key flips direction; a new key starts at its default.
    pub fn select(self, key: SortKey) -> Self {
        if self.key == key {
            Self {
                key,
                direction: self.direction.toggled(),
            }
        } else {
            Self {
                key,
                direction: key.default_direction(),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Scan,
    Delete,
}

impl JobKind {
    pub fn progress_path(self) -> &'static str {
        match self {
            JobKind::Scan => "progress",
            JobKind::Delete => "delete-progress",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            JobKind::Scan => "scan",
            JobKind::Delete => "delete",
        }
    }
}

/// One sample of a backend job's progress endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct JobProgress {
    #[serde(default, deserialize_with = "nullable")]
    pub done: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub total: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub in_progress: bool,
}

impl JobProgress {
    pub fn percent(&self) -> u32 {
        if self.total > 0 {
            (self.done as f64 / self.total as f64 * 100.0).round() as u32
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackState {
    Idle,
    Running { percent: u32 },
    Completed,
    Failed(String),
}

impl TrackState {
    pub fn is_running(&self) -> bool {
        matches!(self, TrackState::Running { .. })
    }

    pub fn progress_fraction(&self) -> f32 {
        match self {
            TrackState::Running { percent } => (*percent).min(100) as f32 / 100.0,
            TrackState::Completed => 1.0,
            TrackState::Idle | TrackState::Failed(_) => 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    // Scan settings
    pub days: String,
    pub label: String,

    // View
    pub sort: SortSpec,
    pub domain_filter: String,

    // Tracks
    pub scan: TrackState,
    pub scan_status: String,
    pub delete: TrackState,
    pub delete_status: String,
    pub pending_delete: Option<String>,
    pub export_enabled: bool,

    // Results
    pub senders: Vec<SenderRecord>,

    // Messages
    pub notice: Option<String>,
    pub error_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            days: "30".to_string(),
            label: "INBOX".to_string(),
            sort: SortSpec::default(),
            domain_filter: String::new(),
            scan: TrackState::Idle,
            scan_status: String::new(),
            delete: TrackState::Idle,
            delete_status: String::new(),
            pending_delete: None,
            export_enabled: false,
            senders: Vec::new(),
            notice: None,
            error_message: None,
        }
    }
}

impl AppState {
    pub fn total_messages(&self) -> u64 {
        self.senders.iter().map(|s| s.info.count).sum()
    }

    pub fn unique_senders(&self) -> usize {
        self.senders.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_is_zero_without_total() {
        let p = JobProgress {
            done: 7,
            total: 0,
            in_progress: true,
        };
        assert_eq!(p.percent(), 0);
    }

    #[test]
    fn percent_rounds_to_nearest() {
        let third = JobProgress {
            done: 1,
            total: 3,
            in_progress: true,
        };
        assert_eq!(third.percent(), 33);

        let two_thirds = JobProgress {
            done: 2,
            total: 3,
            in_progress: true,
        };
        assert_eq!(two_thirds.percent(), 67);
    }

    #[test]
    fn new_key_adopts_its_default_direction() {
        let spec = SortSpec::default().select(SortKey::Domain);
        assert_eq!(spec.direction, SortDirection::Ascending);

        let back = spec.select(SortKey::Count);
        assert_eq!(back.direction, SortDirection::Descending);
    }

    #[test]
    fn reselecting_key_toggles_direction() {
        let spec = SortSpec::default().select(SortKey::Count);
        assert_eq!(spec.key, SortKey::Count);
        assert_eq!(spec.direction, SortDirection::Ascending);
        assert_eq!(spec.select(SortKey::Count).direction, SortDirection::Descending);
    }

    #[test]
    fn malformed_record_fields_fall_back_to_defaults() {
        let raw = r#"[
            {"sender": "A <a@x.com>", "info": {"email": null, "count": 4}},
            {"sender": "B"},
            {"info": {"domain": "y.org"}}
        ]"#;
        let records: Vec<SenderRecord> = serde_json::from_str(raw).expect("decode");

        assert_eq!(records[0].info.email, "");
        assert_eq!(records[0].info.domain, "");
        assert_eq!(records[0].info.count, 4);
        assert_eq!(records[1].info, SenderInfo::default());
        assert_eq!(records[2].sender, "");
        assert_eq!(records[2].info.domain, "y.org");
    }

    #[test]
    fn progress_ignores_extra_backend_fields() {
        let raw = r#"{"in_progress": true, "total": 10, "done": 4, "stats": {}, "days": 30}"#;
        let p: JobProgress = serde_json::from_str(raw).expect("decode");
        assert_eq!(
            p,
            JobProgress {
                done: 4,
                total: 10,
                in_progress: true
            }
        );
    }
}
