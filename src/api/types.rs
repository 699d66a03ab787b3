//! API response types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `/execute`: the window that was started plus the metric document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecuteResponse {
    pub limit: i64,
    pub skip: i64,
    pub data: Value,
}
