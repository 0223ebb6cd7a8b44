use std::collections::HashMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpErrorCount {
    /// 0 when the request failed before a status line arrived.
    pub status_code: u16,
    pub message: String,
    pub count: u64,
}

/// Tally of failed requests keyed by (status code, message).
#[derive(Debug, Default)]
pub struct HttpErrorStats {
    errors: Mutex<HashMap<(u16, String), u64>>,
}

impl HttpErrorStats {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn increment(&self, status_code: u16, message: String) {
        let mut errors = self.errors.lock();
        *errors.entry((status_code, message)).or_insert(0) += 1;
    }

    /// Most frequent first.
    pub(crate) fn snapshot(&self) -> Vec<HttpErrorCount> {
        let errors = self.errors.lock();
        let mut counts: Vec<HttpErrorCount> = errors
            .iter()
            .map(|((status_code, message), count)| HttpErrorCount {
                status_code: *status_code,
                message: message.clone(),
                count: *count,
            })
            .collect();
        counts.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then(a.status_code.cmp(&b.status_code))
        });
        counts
    }
}
