//! Authenticated caller identity.

use serde::{Deserialize, Serialize};

/// Who made the request, as established by token authentication.
///
/// # Example
///
/// ```
/// use scoring_core::CallerIdentity;
///
/// let caller = CallerIdentity::account("horns&hoofs", "h&f");
/// assert!(!caller.is_admin());
/// assert_eq!(caller.log_id(), "horns&hoofs/h&f");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CallerIdentity {
    /// Not yet authenticated.
    #[default]
    Anonymous,
    /// The admin login, authenticated with the hourly admin token.
    Admin {
        /// The admin login name.
        login: String,
    },
    /// A regular account user.
    Account {
        /// Account name (may be empty).
        account: String,
        /// Login name (may be empty).
        login: String,
    },
}

impl CallerIdentity {
    /// Creates an admin identity.
    #[must_use]
    pub fn admin(login: impl Into<String>) -> Self {
        Self::Admin {
            login: login.into(),
        }
    }

    /// Creates an account identity.
    #[must_use]
    pub fn account(account: impl Into<String>, login: impl Into<String>) -> Self {
        Self::Account {
            account: account.into(),
            login: login.into(),
        }
    }

    /// Returns `true` for the admin identity.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin { .. })
    }

    /// Returns a string identifier suitable for logging.
    #[must_use]
    pub fn log_id(&self) -> String {
        match self {
            Self::Anonymous => "anonymous".to_string(),
            Self::Admin { login } => format!("admin:{login}"),
            Self::Account { account, login } => format!("{account}/{login}"),
        }
    }
}
