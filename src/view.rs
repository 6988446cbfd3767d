//! Derived table view: sort + domain filter over the fetched senders.

use crate::state::{SenderRecord, SortDirection, SortKey, SortSpec};
use std::cmp::Ordering;

/// A visible table row. `sender` is also the key of the row's delete action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowView<'a> {
    pub sender: &'a str,
    pub email: &'a str,
    pub domain: &'a str,
    pub count: u64,
}

impl<'a> From<&'a SenderRecord> for RowView<'a> {
    fn from(record: &'a SenderRecord) -> Self {
        Self {
            sender: &record.sender,
            email: &record.info.email,
            domain: &record.info.domain,
            count: record.info.count,
        }
    }
}

fn cmp_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

fn compare(a: &SenderRecord, b: &SenderRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::Sender => cmp_text(&a.sender, &b.sender),
        SortKey::Email => cmp_text(&a.info.email, &b.info.email),
        SortKey::Domain => cmp_text(&a.info.domain, &b.info.domain),
        SortKey::Count => a.info.count.cmp(&b.info.count),
    }
}

/// Stable sort, so equal rows keep the backend's order.
pub fn sort_records<'a>(data: &'a [SenderRecord], sort: SortSpec) -> Vec<&'a SenderRecord> {
    let mut rows: Vec<&SenderRecord> = data.iter().collect();
    rows.sort_by(|a, b| match sort.direction {
        SortDirection::Ascending => compare(a, b, sort.key),
        SortDirection::Descending => compare(b, a, sort.key),
    });
    rows
}

pub fn matches_filter(record: &SenderRecord, filter: &str) -> bool {
    filter.is_empty()
        || record
            .info
            .domain
            .to_lowercase()
            .contains(&filter.to_lowercase())
}

pub fn render<'a>(data: &'a [SenderRecord], sort: SortSpec, filter: &str) -> Vec<RowView<'a>> {
    sort_records(data, sort)
        .into_iter()
        .filter(|record| matches_filter(record, filter))
        .map(RowView::from)
        .collect()
}
