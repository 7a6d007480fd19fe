//! Method dispatch.
//!
//! One call per request, no retries:
//!
//! 1. validate the method envelope (400 if the body is not an object, 422
//!    for field errors);
//! 2. authenticate the caller (403);
//! 3. look up the handler by `method` (404);
//! 4. validate the handler's arguments (422);
//! 5. run the handler (200, or 500 on a failed store read).
//!
//! Every outcome becomes a [`ResponseEnvelope`]; the [`RequestContext`]
//! accumulates what the audit trail needs along the way.

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use serde_json::Value;
use tracing::{debug, error};

use scoring_core::{RequestContext, ResponseEnvelope, ScoringError};
use scoring_schema::{MethodRequest, Validator, DEFAULT_MAX_AGE_YEARS};
use scoring_store::SharedStore;

use crate::auth::Authenticator;
use crate::handlers::builtin_registry;
use crate::registry::{HandlerContext, HandlerRegistry};
use crate::scoring::ScoringPolicy;

/// Routes method envelopes to their handlers.
///
/// Cheap to share: wrap it in an `Arc` and call [`dispatch`](Self::dispatch)
/// from any number of concurrent requests.
#[derive(Debug)]
pub struct MethodDispatcher {
    registry: HandlerRegistry,
    authenticator: Authenticator,
    policy: Arc<ScoringPolicy>,
    store: SharedStore,
    max_age_years: u32,
    fixed_now: Option<NaiveDateTime>,
}

impl MethodDispatcher {
    /// Creates a dispatcher with the built-in methods and default secrets.
    #[must_use]
    pub fn new(store: SharedStore) -> Self {
        Self {
            registry: builtin_registry(),
            authenticator: Authenticator::default(),
            policy: Arc::new(ScoringPolicy::default()),
            store,
            max_age_years: DEFAULT_MAX_AGE_YEARS,
            fixed_now: None,
        }
    }

    /// Replaces the authenticator.
    pub fn with_authenticator(mut self, authenticator: Authenticator) -> Self {
        self.authenticator = authenticator;
        self
    }

    /// Replaces the scoring policy.
    pub fn with_policy(mut self, policy: ScoringPolicy) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    /// Sets the maximum accepted age for birthdays.
    pub fn with_max_age_years(mut self, years: u32) -> Self {
        self.max_age_years = years;
        self
    }

    /// Pins the clock used for birthday and admin-token checks.
    pub fn with_fixed_time(mut self, now: NaiveDateTime) -> Self {
        self.fixed_now = Some(now);
        self
    }

    /// Returns the scoring policy.
    #[must_use]
    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    fn now(&self) -> NaiveDateTime {
        self.fixed_now.unwrap_or_else(|| Local::now().naive_local())
    }

    /// Processes one method call.
    ///
    /// Never fails: every error is turned into its envelope. Internal
    /// errors are logged with their source, which is never sent back.
    pub async fn dispatch(&self, ctx: &mut RequestContext, body: &Value) -> ResponseEnvelope {
        let result = self.try_dispatch(ctx, body).await;

        if let Err(err) = &result {
            match err {
                ScoringError::Internal { .. } => error!(
                    request_id = %ctx.request_id(),
                    method = ctx.method().unwrap_or_default(),
                    error = ?err,
                    "method failed"
                ),
                other => debug!(
                    request_id = %ctx.request_id(),
                    method = ctx.method().unwrap_or_default(),
                    code = other.status_code().as_u16(),
                    error = %other,
                    "method rejected"
                ),
            }
        }

        ResponseEnvelope::from_result(&result)
    }

    async fn try_dispatch(
        &self,
        ctx: &mut RequestContext,
        body: &Value,
    ) -> Result<Value, ScoringError> {
        let now = self.now();
        let validator = Validator::at(now.date()).with_max_age_years(self.max_age_years);

        let request: MethodRequest = validator.parse(body)?;
        ctx.set_caller(request.account.as_deref(), &request.login);
        ctx.set_method(request.method.clone());

        let identity = self
            .authenticator
            .authenticate_at(&request, now)
            .ok_or_else(|| ScoringError::forbidden(request.login.clone()))?;
        ctx.set_identity(identity.clone());

        let handler_ctx = HandlerContext {
            request_id: ctx.request_id().clone(),
            identity,
            store: Arc::clone(&self.store),
            policy: Arc::clone(&self.policy),
        };
        let call = self.registry.prepare(
            &request.method,
            handler_ctx,
            &request.arguments_value(),
            &validator,
        )?;
        ctx.set_summary(call.summary);

        call.future.await
    }
}
