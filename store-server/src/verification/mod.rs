//! One-time verification codes
//!
//! Issues and validates short-lived, attempt-limited codes scoped per
//! (identifier, purpose). At most one live code exists per pair: issuing a
//! new code overwrites the previous one. A code becomes permanently inert
//! once used or once the attempt ceiling is reached.
//!
//! Verification replies are deliberately information-hiding: wrong digits,
//! an expired code, and an already-used code all come back as `Invalid`.
//! Only `AttemptsExceeded` is distinguished, so the client knows to request
//! a fresh code instead of retrying.
//!
//! Wrong guesses count against the attempt ceiling. The system this
//! replaces only counted attempts on a literal code match, which left the
//! ceiling unenforced for actual brute force.

use crate::storage::{CODES_TABLE, CoreStorage, StorageError};
use rand::Rng;
use redb::ReadableTable;
use serde::{Deserialize, Serialize};
use shared::models::{VerifyChannel, VerifyPurpose};
use shared::util::now_millis;
use thiserror::Error;

/// Default code lifetime
const DEFAULT_TTL_MINUTES: i64 = 10;

/// Default attempt ceiling
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Stored verification code record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationCode {
    /// Email address or phone number the code was issued for
    pub identifier: String,
    pub channel: VerifyChannel,
    pub purpose: VerifyPurpose,
    /// 6-digit zero-padded code
    pub code: String,
    pub created_at: i64,
    pub expires_at: i64,
    pub used: bool,
    pub attempts: u32,
    pub max_attempts: u32,
}

impl VerificationCode {
    fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }

    fn is_inert(&self, now: i64) -> bool {
        self.used || self.attempts >= self.max_attempts || self.is_expired(now)
    }
}

/// Issued code handed back to the caller
///
/// The code itself is transmitted out-of-band (email/SMS) by an external
/// collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedCode {
    pub code: String,
    pub expires_at: i64,
}

/// Outcome of a verification attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Code matched and is now consumed
    Success,
    /// Wrong, expired, or already-used code (uniform on purpose)
    Invalid,
    /// Attempt ceiling reached; the code is inert, request a new one
    AttemptsExceeded,
}

/// Verification service errors (storage only; outcomes are not errors)
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type VerificationResult<T> = Result<T, VerificationError>;

/// Issues and validates one-time codes
#[derive(Debug, Clone)]
pub struct VerificationCodeService {
    storage: CoreStorage,
    ttl_minutes: i64,
    max_attempts: u32,
}

fn code_key(identifier: &str, purpose: VerifyPurpose) -> String {
    format!("{}#{}", identifier, purpose.as_str())
}

impl VerificationCodeService {
    pub fn new(storage: CoreStorage) -> Self {
        Self {
            storage,
            ttl_minutes: DEFAULT_TTL_MINUTES,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_limits(storage: CoreStorage, ttl_minutes: i64, max_attempts: u32) -> Self {
        Self {
            storage,
            ttl_minutes,
            max_attempts,
        }
    }

    /// Issue a fresh code for (identifier, purpose)
    ///
    /// Any previous unused/unexpired code for the pair is invalidated by
    /// the overwrite.
    pub fn issue(
        &self,
        identifier: &str,
        channel: VerifyChannel,
        purpose: VerifyPurpose,
    ) -> VerificationResult<IssuedCode> {
        let now = now_millis();
        let record = VerificationCode {
            identifier: identifier.to_string(),
            channel,
            purpose,
            code: generate_code(),
            created_at: now,
            expires_at: now + self.ttl_minutes * 60_000,
            used: false,
            attempts: 0,
            max_attempts: self.max_attempts,
        };

        let key = code_key(identifier, purpose);
        let txn = self.storage.begin_write()?;
        {
            let mut table = txn.open_table(CODES_TABLE).map_err(StorageError::from)?;
            let value = serde_json::to_vec(&record).map_err(StorageError::from)?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(StorageError::from)?;
        }
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(identifier = %identifier, purpose = %purpose, "Verification code issued");
        Ok(IssuedCode {
            code: record.code,
            expires_at: record.expires_at,
        })
    }

    /// Verify a submitted code
    ///
    /// The lookup, attempt bump, and consumption happen in one write
    /// transaction, so concurrent submissions of the same code cannot both
    /// succeed.
    pub fn verify(
        &self,
        identifier: &str,
        code: &str,
        purpose: VerifyPurpose,
    ) -> VerificationResult<VerifyOutcome> {
        let now = now_millis();
        let key = code_key(identifier, purpose);

        let txn = self.storage.begin_write()?;
        let outcome = {
            let mut table = txn.open_table(CODES_TABLE).map_err(StorageError::from)?;

            let stored = match table.get(key.as_str()).map_err(StorageError::from)? {
                Some(guard) => {
                    let record: VerificationCode =
                        serde_json::from_slice(guard.value()).map_err(StorageError::from)?;
                    Some(record)
                }
                None => None,
            };

            let Some(mut record) = stored else {
                return Ok(VerifyOutcome::Invalid);
            };

            if record.used || record.is_expired(now) {
                return Ok(VerifyOutcome::Invalid);
            }
            if record.attempts >= record.max_attempts {
                return Ok(VerifyOutcome::AttemptsExceeded);
            }

            record.attempts += 1;
            let outcome = if record.code == code {
                // Success consumes the code in the same step
                record.used = true;
                VerifyOutcome::Success
            } else {
                VerifyOutcome::Invalid
            };

            let value = serde_json::to_vec(&record).map_err(StorageError::from)?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(StorageError::from)?;
            outcome
        };
        txn.commit().map_err(StorageError::from)?;

        if outcome != VerifyOutcome::Success {
            tracing::warn!(identifier = %identifier, purpose = %purpose, outcome = ?outcome, "Verification attempt failed");
        }
        Ok(outcome)
    }

    /// Remove expired and inert codes; returns how many were swept
    pub fn sweep_expired(&self) -> VerificationResult<usize> {
        let now = now_millis();
        let txn = self.storage.begin_write()?;
        let swept = {
            let mut table = txn.open_table(CODES_TABLE).map_err(StorageError::from)?;

            let mut stale_keys: Vec<String> = Vec::new();
            for result in table.iter().map_err(StorageError::from)? {
                let (key, value) = result.map_err(StorageError::from)?;
                let record: VerificationCode =
                    serde_json::from_slice(value.value()).map_err(StorageError::from)?;
                if record.is_inert(now) {
                    stale_keys.push(key.value().to_string());
                }
            }

            for key in &stale_keys {
                table.remove(key.as_str()).map_err(StorageError::from)?;
            }
            stale_keys.len()
        };
        txn.commit().map_err(StorageError::from)?;

        if swept > 0 {
            tracing::debug!(swept, "Swept stale verification codes");
        }
        Ok(swept)
    }
}

/// Uniformly random 6-digit code, zero-padded (leading zeros included)
fn generate_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:06}", n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> VerificationCodeService {
        VerificationCodeService::new(CoreStorage::open_in_memory().unwrap())
    }

    fn wrong_code(issued: &str) -> String {
        if issued == "000000" {
            "000001".to_string()
        } else {
            "000000".to_string()
        }
    }

    #[test]
    fn test_code_format() {
        for _ in 0..50 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_single_use() {
        let svc = service();
        let issued = svc
            .issue("user@example.com", VerifyChannel::Email, VerifyPurpose::Registration)
            .unwrap();

        let first = svc
            .verify("user@example.com", &issued.code, VerifyPurpose::Registration)
            .unwrap();
        assert_eq!(first, VerifyOutcome::Success);

        // Same code again: uniform Invalid, not re-checkable
        let second = svc
            .verify("user@example.com", &issued.code, VerifyPurpose::Registration)
            .unwrap();
        assert_eq!(second, VerifyOutcome::Invalid);
    }

    #[test]
    fn test_wrong_code_is_invalid_and_counted() {
        let svc = service();
        let issued = svc
            .issue("9876543210", VerifyChannel::Phone, VerifyPurpose::Login)
            .unwrap();

        let outcome = svc
            .verify("9876543210", &wrong_code(&issued.code), VerifyPurpose::Login)
            .unwrap();
        assert_eq!(outcome, VerifyOutcome::Invalid);

        // Two attempts left; correct code still works
        let outcome = svc
            .verify("9876543210", &issued.code, VerifyPurpose::Login)
            .unwrap();
        assert_eq!(outcome, VerifyOutcome::Success);
    }

    #[test]
    fn test_attempt_ceiling() {
        let svc = service();
        let issued = svc
            .issue("user@example.com", VerifyChannel::Email, VerifyPurpose::Login)
            .unwrap();
        let wrong = wrong_code(&issued.code);

        for _ in 0..3 {
            let outcome = svc
                .verify("user@example.com", &wrong, VerifyPurpose::Login)
                .unwrap();
            assert_eq!(outcome, VerifyOutcome::Invalid);
        }

        // Fourth attempt is rejected even with the correct code
        let outcome = svc
            .verify("user@example.com", &issued.code, VerifyPurpose::Login)
            .unwrap();
        assert_eq!(outcome, VerifyOutcome::AttemptsExceeded);
    }

    #[test]
    fn test_expired_code_is_invalid() {
        let storage = CoreStorage::open_in_memory().unwrap();
        // TTL of zero minutes: expired the moment it is issued
        let svc = VerificationCodeService::with_limits(storage, 0, 3);
        let issued = svc
            .issue("user@example.com", VerifyChannel::Email, VerifyPurpose::PasswordReset)
            .unwrap();

        let outcome = svc
            .verify("user@example.com", &issued.code, VerifyPurpose::PasswordReset)
            .unwrap();
        assert_eq!(outcome, VerifyOutcome::Invalid);
    }

    #[test]
    fn test_reissue_invalidates_previous_code() {
        let svc = service();
        let first = svc
            .issue("9876543210", VerifyChannel::Phone, VerifyPurpose::Registration)
            .unwrap();
        let second = svc
            .issue("9876543210", VerifyChannel::Phone, VerifyPurpose::Registration)
            .unwrap();

        if first.code != second.code {
            let outcome = svc
                .verify("9876543210", &first.code, VerifyPurpose::Registration)
                .unwrap();
            assert_eq!(outcome, VerifyOutcome::Invalid);
        }

        let outcome = svc
            .verify("9876543210", &second.code, VerifyPurpose::Registration)
            .unwrap();
        assert_eq!(outcome, VerifyOutcome::Success);
    }

    #[test]
    fn test_purposes_are_scoped_independently() {
        let svc = service();
        let login = svc
            .issue("user@example.com", VerifyChannel::Email, VerifyPurpose::Login)
            .unwrap();
        let reset = svc
            .issue("user@example.com", VerifyChannel::Email, VerifyPurpose::PasswordReset)
            .unwrap();

        // Issuing the reset code must not have touched the login code
        let outcome = svc
            .verify("user@example.com", &login.code, VerifyPurpose::Login)
            .unwrap();
        assert_eq!(outcome, VerifyOutcome::Success);
        let outcome = svc
            .verify("user@example.com", &reset.code, VerifyPurpose::PasswordReset)
            .unwrap();
        assert_eq!(outcome, VerifyOutcome::Success);
    }

    #[test]
    fn test_sweep_removes_inert_codes() {
        let storage = CoreStorage::open_in_memory().unwrap();
        let expired_svc = VerificationCodeService::with_limits(storage.clone(), 0, 3);
        let live_svc = VerificationCodeService::new(storage);

        expired_svc
            .issue("old@example.com", VerifyChannel::Email, VerifyPurpose::Login)
            .unwrap();
        let used = live_svc
            .issue("used@example.com", VerifyChannel::Email, VerifyPurpose::Login)
            .unwrap();
        live_svc
            .verify("used@example.com", &used.code, VerifyPurpose::Login)
            .unwrap();
        live_svc
            .issue("live@example.com", VerifyChannel::Email, VerifyPurpose::Login)
            .unwrap();

        // Expired + consumed are swept, the live one stays
        assert_eq!(live_svc.sweep_expired().unwrap(), 2);
        assert_eq!(live_svc.sweep_expired().unwrap(), 0);
    }
}
