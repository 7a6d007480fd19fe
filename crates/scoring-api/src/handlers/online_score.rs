use serde::Serialize;

use scoring_core::{ArgumentSummary, ScoringError};
use scoring_schema::OnlineScoreRequest;

use crate::registry::{HandlerContext, MethodArguments};

impl MethodArguments for OnlineScoreRequest {
    fn summary(&self) -> ArgumentSummary {
        ArgumentSummary::Fields {
            has: self.has().into_iter().map(ToString::to_string).collect(),
        }
    }
}

/// Response of `online_score`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreResponse {
    /// The computed score.
    pub score: f64,
}

/// Scores a prospective client. Admin callers always get the admin score.
pub async fn online_score(
    ctx: HandlerContext,
    request: OnlineScoreRequest,
) -> Result<ScoreResponse, ScoringError> {
    if ctx.identity.is_admin() {
        return Ok(ScoreResponse {
            score: ctx.policy.admin_score,
        });
    }

    let score = ctx.policy.get_score(ctx.store.as_ref(), &request).await;
    Ok(ScoreResponse { score })
}
