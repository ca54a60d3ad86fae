use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Successful token-endpoint response.
///
/// Fields outside the standard set are preserved in `extra` so `--json`
/// output shows exactly what the server returned.
///
/// # Example
/// ```
/// use oidc_device_login::auth::TokenSet;
///
/// let tokens: TokenSet = serde_json::from_str(
///     r#"{"access_token":"abc","token_type":"Bearer","expires_in":86400}"#,
/// )?;
/// assert_eq!(tokens.access_token, "abc");
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl TokenSet {
    /// Absolute expiry of the access token, measured from `issued_at`.
    ///
    /// `None` when the server sent no `expires_in` or one too large to
    /// represent.
    pub fn expires_at(&self, issued_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.expires_in?).ok()?;
        issued_at.checked_add_signed(Duration::try_seconds(secs)?)
    }
}
