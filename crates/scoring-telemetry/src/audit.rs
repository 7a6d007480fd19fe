//! Per-request audit events.
//!
//! One `info` event per processed request on the [`AUDIT_TARGET`] target.
//! Argument values never appear; only which online-score fields were
//! supplied or how many clients were requested.

use scoring_core::AuditRecord;
use tracing::info;

/// Target of audit events, for filtering (`RUST_LOG=scoring::audit=info`).
pub const AUDIT_TARGET: &str = "scoring::audit";

/// Emits the audit event for a finished request.
pub fn log_audit(record: &AuditRecord) {
    let has = record.has.as_ref().map(|fields| fields.join(","));

    info!(
        target: AUDIT_TARGET,
        request_id = %record.request_id,
        account = record.account.as_deref().unwrap_or(""),
        login = record.login.as_deref().unwrap_or(""),
        caller = %record.caller,
        method = record.method.as_deref().unwrap_or(""),
        code = record.code,
        duration_ms = record.duration_ms,
        has = has.as_deref().unwrap_or(""),
        nclients = record.nclients.unwrap_or(0),
        "request processed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    use scoring_core::{ArgumentSummary, RequestContext, RequestId};
    use serde_json::Value;

    /// Collects everything the subscriber writes.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn events(&self) -> Vec<Value> {
            let bytes = self.0.lock().unwrap();
            std::str::from_utf8(&bytes)
                .unwrap()
                .lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect()
        }
    }

    fn capture(records: &[AuditRecord]) -> (String, Vec<Value>) {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::INFO)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            for record in records {
                log_audit(record);
            }
        });

        let raw = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        (raw, captured.events())
    }

    fn record(method: &str, summary: ArgumentSummary) -> AuditRecord {
        let mut ctx = RequestContext::with_request_id(RequestId::from_header(Some("0190")));
        ctx.set_caller(Some("horns&hoofs"), "h&f");
        ctx.set_method(method);
        ctx.set_summary(summary);
        ctx.audit(200)
    }

    #[test]
    fn test_log_audit_records_field_names_only() {
        let score = record(
            "online_score",
            ArgumentSummary::Fields {
                has: vec!["email".to_string(), "phone".to_string()],
            },
        );
        let interests = record("clients_interests", ArgumentSummary::Clients { nclients: 3 });

        let (raw, events) = capture(&[score, interests]);
        assert_eq!(events.len(), 2);

        for event in &events {
            assert_eq!(event["target"], AUDIT_TARGET);
            assert_eq!(event["level"], "INFO");
            assert_eq!(event["fields"]["message"], "request processed");
            assert_eq!(event["fields"]["request_id"], "0190");
            assert_eq!(event["fields"]["code"], 200);
        }

        assert_eq!(events[0]["fields"]["method"], "online_score");
        assert_eq!(events[0]["fields"]["has"], "email,phone");
        assert_eq!(events[0]["fields"]["nclients"], 0);

        assert_eq!(events[1]["fields"]["method"], "clients_interests");
        assert_eq!(events[1]["fields"]["has"], "");
        assert_eq!(events[1]["fields"]["nclients"], 3);

        let mut keys: Vec<&str> = events[0]["fields"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            [
                "account",
                "caller",
                "code",
                "duration_ms",
                "has",
                "login",
                "message",
                "method",
                "nclients",
                "request_id",
            ]
        );

        for value in ["79175002040", "stupnikov@otus.ru", "client_ids"] {
            assert!(!raw.contains(value), "{value} leaked into the audit trail");
        }
    }
}
