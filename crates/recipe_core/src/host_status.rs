use chrono::{DateTime, Utc};

/// Live, in-memory view of one host worker. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HostWorkerStatus {
    pub in_progress: bool,
    pub current_url: Option<String>,
    pub waiting_until: Option<DateTime<Utc>>,
}

impl HostWorkerStatus {
    pub fn working_on(url: impl Into<String>) -> Self {
        Self {
            in_progress: true,
            current_url: Some(url.into()),
            waiting_until: None,
        }
    }

    pub fn waiting(until: DateTime<Utc>) -> Self {
        Self {
            in_progress: false,
            current_url: None,
            waiting_until: Some(until),
        }
    }
}
