//! Method handler registration.
//!
//! Handlers are typed async functions bound to a method name:
//!
//! - **Typed**: the argument type is a declared shape, validated before the
//!   handler runs; the response is anything serializable
//! - **Async**: handlers may await the store
//! - **Name-bound**: each handler answers exactly one `method`
//!
//! Registration erases the types. Invoking a method is split in two:
//! [`HandlerRegistry::prepare`] validates the arguments synchronously and
//! yields the audit summary plus a future that runs the handler.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use scoring_core::{ArgumentSummary, CallerIdentity, RequestId, ScoringError};
use scoring_schema::{RequestShape, Validator};
use scoring_store::SharedStore;

use crate::scoring::ScoringPolicy;

/// Type alias for boxed handler result.
pub type BoxedHandlerResult = Pin<Box<dyn Future<Output = Result<Value, ScoringError>> + Send>>;

/// A type-erased handler: validates arguments, then returns the call.
pub type ErasedHandler = Arc<
    dyn Fn(HandlerContext, &Value, &Validator) -> Result<PreparedCall, ScoringError> + Send + Sync,
>;

/// Argument shapes that can be dispatched to a handler.
pub trait MethodArguments: RequestShape + Send + 'static {
    /// The non-sensitive summary recorded in the audit trail.
    fn summary(&self) -> ArgumentSummary;
}

/// Everything a handler can use besides its arguments.
#[derive(Debug, Clone)]
pub struct HandlerContext {
    /// The request being served.
    pub request_id: RequestId,
    /// The authenticated caller.
    pub identity: CallerIdentity,
    /// The shared store.
    pub store: SharedStore,
    /// Scoring weights and store limits.
    pub policy: Arc<ScoringPolicy>,
}

/// A validated call, ready to run.
pub struct PreparedCall {
    /// Audit summary of the validated arguments.
    pub summary: ArgumentSummary,
    /// The handler invocation.
    pub future: BoxedHandlerResult,
}

impl std::fmt::Debug for PreparedCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedCall")
            .field("summary", &self.summary)
            .finish_non_exhaustive()
    }
}

/// Registry for method handlers.
///
/// # Example
///
/// ```rust
/// use scoring_api::HandlerRegistry;
///
/// let registry = HandlerRegistry::new();
/// assert!(registry.is_empty());
/// ```
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, ErasedHandler>,
}

impl HandlerRegistry {
    /// Creates a new empty handler registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers a handler for a method.
    ///
    /// The handler receives the [`HandlerContext`] and arguments that
    /// already passed validation against `Req`'s shape. A later
    /// registration for the same method replaces the earlier one.
    pub fn register<Req, Res, F, Fut>(&mut self, method: impl Into<String>, handler: F)
    where
        Req: MethodArguments,
        Res: Serialize + Send + 'static,
        F: Fn(HandlerContext, Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Res, ScoringError>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let erased: ErasedHandler = Arc::new(
            move |ctx: HandlerContext,
                  arguments: &Value,
                  validator: &Validator|
                  -> Result<PreparedCall, ScoringError> {
                let request: Req = validator.parse(arguments)?;
                let summary = request.summary();

                let handler = Arc::clone(&handler);
                let future: BoxedHandlerResult = Box::pin(async move {
                    let response = handler(ctx, request).await?;
                    serde_json::to_value(response).map_err(|e| {
                        ScoringError::internal_with_source("failed to serialize response", e)
                    })
                });

                Ok(PreparedCall { summary, future })
            },
        );

        self.handlers.insert(method.into(), erased);
    }

    /// Gets a handler by method name.
    #[must_use]
    pub fn get(&self, method: &str) -> Option<&ErasedHandler> {
        self.handlers.get(method)
    }

    /// Checks if a handler is registered for a method.
    #[must_use]
    pub fn contains(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Returns the registered method names, sorted.
    #[must_use]
    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Validates `arguments` for `method` and prepares the handler call.
    ///
    /// # Errors
    ///
    /// Returns a not-found error for an unknown method and a validation
    /// error when the arguments do not fit the method's shape.
    pub fn prepare(
        &self,
        method: &str,
        ctx: HandlerContext,
        arguments: &Value,
        validator: &Validator,
    ) -> Result<PreparedCall, ScoringError> {
        let handler = self
            .handlers
            .get(method)
            .ok_or_else(|| ScoringError::method_not_found(method))?;
        handler(ctx, arguments, validator)
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("methods", &self.method_names())
            .finish()
    }
}
