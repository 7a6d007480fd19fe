//! Token authentication.
//!
//! Tokens are SHA-512 hex digests:
//!
//! - regular callers: `sha512(account + login + salt)`;
//! - the admin login: `sha512(YYYYMMDDHH + admin_salt)` for the current
//!   local hour, so admin tokens expire on the hour.

use chrono::{Local, NaiveDateTime};
use scoring_core::CallerIdentity;
use scoring_schema::MethodRequest;
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;
use tracing::debug;

/// Default salt for regular callers.
pub const DEFAULT_SALT: &str = "Otus";

/// Default admin login.
pub const DEFAULT_ADMIN_LOGIN: &str = "admin";

/// Default salt for the hourly admin token.
pub const DEFAULT_ADMIN_SALT: &str = "42";

const ADMIN_HOUR_FORMAT: &str = "%Y%m%d%H";

/// Checks method tokens and establishes the caller identity.
#[derive(Debug, Clone)]
pub struct Authenticator {
    salt: String,
    admin_login: String,
    admin_salt: String,
}

impl Default for Authenticator {
    fn default() -> Self {
        Self::new(DEFAULT_SALT, DEFAULT_ADMIN_LOGIN, DEFAULT_ADMIN_SALT)
    }
}

impl Authenticator {
    /// Creates an authenticator with explicit secrets.
    pub fn new(
        salt: impl Into<String>,
        admin_login: impl Into<String>,
        admin_salt: impl Into<String>,
    ) -> Self {
        Self {
            salt: salt.into(),
            admin_login: admin_login.into(),
            admin_salt: admin_salt.into(),
        }
    }

    /// Returns `true` if `login` is the admin login.
    #[must_use]
    pub fn is_admin_login(&self, login: &str) -> bool {
        login == self.admin_login
    }

    /// Returns the token a caller must present at the given local time.
    #[must_use]
    pub fn expected_token(&self, request: &MethodRequest, now: NaiveDateTime) -> String {
        let mut hasher = Sha512::new();
        if self.is_admin_login(&request.login) {
            hasher.update(now.format(ADMIN_HOUR_FORMAT).to_string().as_bytes());
            hasher.update(self.admin_salt.as_bytes());
        } else {
            hasher.update(request.account.as_deref().unwrap_or_default().as_bytes());
            hasher.update(request.login.as_bytes());
            hasher.update(self.salt.as_bytes());
        }
        hex::encode(hasher.finalize())
    }

    /// Authenticates against the current local hour.
    ///
    /// Returns `None` when the token does not match.
    #[must_use]
    pub fn authenticate(&self, request: &MethodRequest) -> Option<CallerIdentity> {
        self.authenticate_at(request, Local::now().naive_local())
    }

    /// Authenticates against an explicit local time.
    #[must_use]
    pub fn authenticate_at(
        &self,
        request: &MethodRequest,
        now: NaiveDateTime,
    ) -> Option<CallerIdentity> {
        let expected = self.expected_token(request, now);
        if !constant_time_str_eq(&expected, &request.token) {
            debug!(login = %request.login, "token mismatch");
            return None;
        }

        if self.is_admin_login(&request.login) {
            Some(CallerIdentity::admin(request.login.clone()))
        } else {
            Some(CallerIdentity::account(
                request.account.clone().unwrap_or_default(),
                request.login.clone(),
            ))
        }
    }
}

fn constant_time_str_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    bool::from(a.as_bytes().ct_eq(b.as_bytes()))
}
