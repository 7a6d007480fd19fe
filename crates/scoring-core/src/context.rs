//! Request context types.
//!
//! The [`RequestContext`] carries per-request state from the transport through
//! authentication and dispatch, and is finally turned into an
//! [`AuditRecord`].

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit::{ArgumentSummary, AuditRecord};
use crate::identity::CallerIdentity;

/// Longest accepted `X-Request-Id` value.
pub const MAX_REQUEST_ID_LEN: usize = 128;

/// An identifier for each request.
///
/// Taken verbatim from the `X-Request-Id` header when the caller sends a
/// usable one, otherwise a fresh time-ordered UUID v7 in simple form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Creates a new request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().simple().to_string())
    }

    /// Keeps the caller's header value, or generates an ID when it is
    /// missing, empty, longer than [`MAX_REQUEST_ID_LEN`], or holds anything
    /// but visible ASCII.
    ///
    /// ```
    /// use scoring_core::RequestId;
    ///
    /// assert_eq!(RequestId::from_header(Some("req-42")).as_str(), "req-42");
    /// assert_ne!(RequestId::from_header(Some("two words")).as_str(), "two words");
    /// ```
    #[must_use]
    pub fn from_header(value: Option<&str>) -> Self {
        value
            .map(str::trim)
            .filter(|v| is_usable(v))
            .map_or_else(Self::new, |v| Self(v.to_string()))
    }

    /// Returns the ID as sent on the wire.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_usable(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_REQUEST_ID_LEN
        && value.bytes().all(|b| b.is_ascii_graphic())
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-request state accumulated during dispatch.
///
/// # Example
///
/// ```
/// use scoring_core::{ArgumentSummary, RequestContext};
///
/// let mut ctx = RequestContext::new();
/// ctx.set_caller(Some("horns&hoofs"), "h&f");
/// ctx.set_method("clients_interests");
/// ctx.set_summary(ArgumentSummary::Clients { nclients: 2 });
///
/// let record = ctx.audit(200);
/// assert_eq!(record.nclients, Some(2));
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    identity: CallerIdentity,
    account: Option<String>,
    login: Option<String>,
    method: Option<String>,
    summary: ArgumentSummary,
    started_at: Instant,
}

impl RequestContext {
    /// Creates a context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a context with the given request ID.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            identity: CallerIdentity::Anonymous,
            account: None,
            login: None,
            method: None,
            summary: ArgumentSummary::None,
            started_at: Instant::now(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Returns the caller identity.
    #[must_use]
    pub const fn identity(&self) -> &CallerIdentity {
        &self.identity
    }

    /// Sets the caller identity after authentication.
    pub fn set_identity(&mut self, identity: CallerIdentity) {
        self.identity = identity;
    }

    /// Records the claimed caller before authentication.
    pub fn set_caller(&mut self, account: Option<&str>, login: &str) {
        self.account = account.map(ToString::to_string);
        self.login = Some(login.to_string());
    }

    /// Returns the method name if known.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// Records the requested method.
    pub fn set_method(&mut self, method: impl Into<String>) {
        self.method = Some(method.into());
    }

    /// Returns the argument summary.
    #[must_use]
    pub const fn summary(&self) -> &ArgumentSummary {
        &self.summary
    }

    /// Records the non-sensitive argument summary.
    pub fn set_summary(&mut self, summary: ArgumentSummary) {
        self.summary = summary;
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Builds the audit record for this request.
    #[must_use]
    pub fn audit(&self, code: u16) -> AuditRecord {
        let (has, nclients) = match &self.summary {
            ArgumentSummary::None => (None, None),
            ArgumentSummary::Fields { has } => (Some(has.clone()), None),
            ArgumentSummary::Clients { nclients } => (None, Some(*nclients)),
        };

        AuditRecord {
            request_id: self.request_id.to_string(),
            account: self.account.clone(),
            login: self.login.clone(),
            caller: self.identity.log_id(),
            method: self.method.clone(),
            code,
            duration_ms: u64::try_from(self.elapsed().as_millis()).unwrap_or(u64::MAX),
            has,
            nclients,
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_unique() {
        assert_ne!(RequestId::new(), RequestId::new());
    }

    #[test]
    fn test_request_id_from_header_is_kept() {
        let hyphenated = Uuid::now_v7().to_string();
        assert_eq!(
            RequestId::from_header(Some(hyphenated.as_str())).to_string(),
            hyphenated
        );
        assert_eq!(RequestId::from_header(Some("req-42")).to_string(), "req-42");
        assert_eq!(RequestId::from_header(Some("  req-42 ")).as_str(), "req-42");
    }

    #[test]
    fn test_unusable_request_id_is_replaced() {
        let too_long = "a".repeat(MAX_REQUEST_ID_LEN + 1);
        let headers = [
            None,
            Some(""),
            Some("   "),
            Some("a b"),
            Some("id\u{e9}"),
            Some(too_long.as_str()),
        ];
        for header in headers {
            let id = RequestId::from_header(header);
            assert_eq!(id.as_str().len(), 32, "header {header:?}");
            assert!(id.as_str().bytes().all(|b| b.is_ascii_hexdigit()));
        }

        let longest = "a".repeat(MAX_REQUEST_ID_LEN);
        assert_eq!(RequestId::from_header(Some(longest.as_str())).as_str(), longest);
    }

    #[test]
    fn test_audit_fields_summary() {
        let mut ctx = RequestContext::new();
        ctx.set_caller(None, "bob");
        ctx.set_method("online_score");
        ctx.set_summary(ArgumentSummary::Fields {
            has: vec!["phone".to_string(), "email".to_string()],
        });

        let record = ctx.audit(200);
        assert_eq!(record.login.as_deref(), Some("bob"));
        assert_eq!(record.account, None);
        assert_eq!(record.method.as_deref(), Some("online_score"));
        assert_eq!(record.has, Some(vec!["phone".to_string(), "email".to_string()]));
        assert_eq!(record.nclients, None);
        assert_eq!(record.caller, "anonymous");
    }

    #[test]
    fn test_elapsed_grows() {
        let ctx = RequestContext::new();
        std::thread::sleep(Duration::from_millis(5));
        assert!(ctx.elapsed() >= Duration::from_millis(5));
    }
}
