use serde::{Deserialize, Serialize};

/// Binds the first JSONPath match in a response body to `key` for later requests.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonpathExtract {
    pub key: String,
    pub jsonpath: String,
}
