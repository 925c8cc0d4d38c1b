//! Authentication configuration.
//!
//! Session issuance lives in the surrounding platform; this service only
//! verifies the tokens it is handed.

use serde::{Deserialize, Serialize};

/// JWT verification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret shared with the token issuer.
    pub jwt_secret: String,
    /// Expected token issuer claim. Empty disables the check.
    #[serde(default)]
    pub issuer: String,
}
