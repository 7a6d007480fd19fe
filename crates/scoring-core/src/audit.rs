//! Audit trail types.
//!
//! Argument values are personal data and never reach the audit trail; only
//! which fields were supplied, or how many clients were requested.

use serde::{Deserialize, Serialize};

/// Non-sensitive summary of a method's arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentSummary {
    /// Arguments were never validated.
    #[default]
    None,
    /// Names of the non-empty online-score fields.
    Fields {
        /// Field names in declaration order.
        has: Vec<String>,
    },
    /// Number of client ids in a clients-interests request.
    Clients {
        /// Count of requested ids.
        nclients: usize,
    },
}

/// One audit entry per processed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Request correlation id.
    pub request_id: String,
    /// Claimed account, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    /// Claimed login, once the envelope validated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    /// Authenticated identity in log form.
    pub caller: String,
    /// Requested method.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Response code.
    pub code: u16,
    /// Processing time.
    pub duration_ms: u64,
    /// Supplied online-score fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has: Option<Vec<String>>,
    /// Number of requested clients.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nclients: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_skips_absent_fields() {
        let record = AuditRecord {
            request_id: "abc".to_string(),
            account: None,
            login: Some("bob".to_string()),
            caller: "anonymous".to_string(),
            method: None,
            code: 403,
            duration_ms: 1,
            has: None,
            nclients: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("account").is_none());
        assert!(json.get("has").is_none());
        assert_eq!(json["code"], 403);
    }
}
