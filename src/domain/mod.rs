//! Domain primitives for accounts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Email verification state of an account.
///
/// Accounts start [`UserStatus::Unverified`] and move to
/// [`UserStatus::Verified`] once; there is no transition back.
///
/// # Examples
///
/// ```rust
/// use stockkeeper::domain::UserStatus;
///
/// let status: UserStatus = "verified".parse().unwrap();
/// assert_eq!(status, UserStatus::Verified);
/// assert_eq!(UserStatus::Unverified.as_str(), "unverified");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Unverified,
    Verified,
}

impl UserStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unverified => "unverified",
            Self::Verified => "verified",
        }
    }

    #[must_use]
    pub const fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unverified" => Ok(Self::Unverified),
            "verified" => Ok(Self::Verified),
            other => Err(format!("Unknown user status: {other}")),
        }
    }
}
