use serde::{Deserialize, Serialize};

/// Channel the one-time code is delivered on
///
/// Delivery itself (email/SMS) happens out-of-band; the core only records
/// which channel the identifier belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VerifyChannel {
    Email,
    Phone,
}

/// Purpose of a verification code
///
/// Codes are scoped per (identifier, purpose): issuing a login code does
/// not invalidate a pending registration code for the same identifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum VerifyPurpose {
    Registration,
    Login,
    PasswordReset,
}

impl VerifyPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerifyPurpose::Registration => "registration",
            VerifyPurpose::Login => "login",
            VerifyPurpose::PasswordReset => "password_reset",
        }
    }
}

impl std::fmt::Display for VerifyPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
