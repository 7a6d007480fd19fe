use serde_json::{Map, Value};
use tracing::debug;

use scoring_core::{ArgumentSummary, ScoringError};
use scoring_schema::ClientsInterestsRequest;

use crate::registry::{HandlerContext, MethodArguments};

impl MethodArguments for ClientsInterestsRequest {
    fn summary(&self) -> ArgumentSummary {
        ArgumentSummary::Clients {
            nclients: self.client_ids.len(),
        }
    }
}

/// Returns the interests of each requested client, keyed by client id.
///
/// Any failed store read fails the whole request.
pub async fn clients_interests(
    ctx: HandlerContext,
    request: ClientsInterestsRequest,
) -> Result<Map<String, Value>, ScoringError> {
    let mut interests = Map::with_capacity(request.client_ids.len());

    for client_id in &request.client_ids {
        let list = ctx
            .policy
            .get_interests(ctx.store.as_ref(), *client_id)
            .await?;
        interests.insert(client_id.to_string(), Value::from(list));
    }

    debug!(
        request_id = %ctx.request_id,
        nclients = interests.len(),
        "collected client interests"
    );
    Ok(interests)
}
