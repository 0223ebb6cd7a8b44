use std::collections::HashMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertErrorCount {
    pub assertion: String,
    pub count: u64,
}

pub struct AssertErrorStats {
    // {assertion: count}
    errors: Mutex<HashMap<String, u64>>,
}

impl AssertErrorStats {
    pub(crate) fn new() -> Self {
        AssertErrorStats {
            errors: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn increment(&self, assertion: &str) {
        let mut errors = self.errors.lock();
        *errors.entry(assertion.to_string()).or_insert(0) += 1;
    }

    pub(crate) fn snapshot(&self) -> Vec<AssertErrorCount> {
        let errors = self.errors.lock();
        let mut counts: Vec<AssertErrorCount> = errors
            .iter()
            .map(|(assertion, count)| AssertErrorCount {
                assertion: assertion.clone(),
                count: *count,
            })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then(a.assertion.cmp(&b.assertion)));
        counts
    }
}
