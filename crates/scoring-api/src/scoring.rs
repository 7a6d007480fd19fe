//! Scoring rules and store access for the method handlers.

use std::time::Duration;

use scoring_core::ScoringError;
use scoring_schema::OnlineScoreRequest;
use scoring_store::Store;
use sha2::{Digest, Sha256};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Prefix of cached score keys.
pub const SCORE_KEY_PREFIX: &str = "uid:";

/// Prefix of client interest keys.
pub const INTERESTS_KEY_PREFIX: &str = "i:";

const CACHE_DATE_FORMAT: &str = "%Y%m%d";

/// Weights and limits of the online score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringPolicy {
    /// Added when a phone is supplied.
    pub phone_weight: f64,
    /// Added when an email is supplied.
    pub email_weight: f64,
    /// Added when both birthday and gender are supplied.
    pub birthday_gender_weight: f64,
    /// Added when both first and last name are supplied.
    pub full_name_weight: f64,
    /// Returned to admin callers.
    pub admin_score: f64,
    /// How long computed scores stay cached.
    pub cache_ttl: Duration,
    /// Upper bound on one cache read or write.
    pub cache_timeout: Duration,
    /// Upper bound on one durable read.
    pub read_timeout: Duration,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            phone_weight: 1.5,
            email_weight: 1.5,
            birthday_gender_weight: 1.5,
            full_name_weight: 0.5,
            admin_score: 42.0,
            cache_ttl: Duration::from_secs(3600),
            cache_timeout: Duration::from_secs(1),
            read_timeout: Duration::from_secs(1),
        }
    }
}

impl ScoringPolicy {
    /// Computes the score from the supplied signals. Pure.
    #[must_use]
    pub fn compute_score(&self, request: &OnlineScoreRequest) -> f64 {
        let mut score = 0.0;
        if request.phone.is_some() {
            score += self.phone_weight;
        }
        if request.email.is_some() {
            score += self.email_weight;
        }
        if request.birthday.is_some() && request.gender.is_some() {
            score += self.birthday_gender_weight;
        }
        if request.first_name.is_some() && request.last_name.is_some() {
            score += self.full_name_weight;
        }
        score
    }

    /// Returns the score, served from the cache when possible.
    ///
    /// Cache failures (including timeouts) never fail the request. The
    /// whole call takes at most twice `cache_timeout`.
    pub async fn get_score(&self, store: &dyn Store, request: &OnlineScoreRequest) -> f64 {
        let key = score_cache_key(request);

        match timeout(self.cache_timeout, store.cache_get(&key)).await {
            Ok(Some(bytes)) => match parse_cached_score(&bytes) {
                Some(score) => {
                    debug!(%key, "score cache hit");
                    return score;
                }
                None => warn!(%key, "ignoring unparseable cached score"),
            },
            Ok(None) => {}
            Err(_) => warn!(%key, "score cache read timed out"),
        }

        let score = self.compute_score(request);
        let value = score.to_string();
        if timeout(
            self.cache_timeout,
            store.cache_set(&key, value.as_bytes(), self.cache_ttl),
        )
        .await
        .is_err()
        {
            warn!(%key, "score cache write timed out");
        }
        score
    }

    /// Reads the interests of one client.
    ///
    /// A missing key is an empty list.
    ///
    /// # Errors
    ///
    /// Returns an internal error when the store fails, times out, or holds
    /// something other than a JSON array of strings.
    pub async fn get_interests(
        &self,
        store: &dyn Store,
        client_id: i64,
    ) -> Result<Vec<String>, ScoringError> {
        let key = format!("{INTERESTS_KEY_PREFIX}{client_id}");

        let bytes = timeout(self.read_timeout, store.get(&key))
            .await
            .map_err(|elapsed| {
                ScoringError::internal_with_source(format!("reading {key} timed out"), elapsed)
            })?
            .map_err(|e| ScoringError::internal_with_source(format!("reading {key}"), e))?;

        match bytes {
            None => Ok(Vec::new()),
            Some(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                ScoringError::internal_with_source(format!("decoding {key}"), e)
            }),
        }
    }
}

/// Derives the cache key of a score request.
///
/// The key covers the identifying fields only: names, phone and birthday.
#[must_use]
pub fn score_cache_key(request: &OnlineScoreRequest) -> String {
    let birthday = request
        .birthday
        .map(|d| d.format(CACHE_DATE_FORMAT).to_string())
        .unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(request.first_name.as_deref().unwrap_or_default());
    hasher.update(request.last_name.as_deref().unwrap_or_default());
    hasher.update(request.phone.as_deref().unwrap_or_default());
    hasher.update(birthday);
    format!("{SCORE_KEY_PREFIX}{}", hex::encode(hasher.finalize()))
}

fn parse_cached_score(bytes: &[u8]) -> Option<f64> {
    std::str::from_utf8(bytes)
        .ok()?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|score| score.is_finite())
}
