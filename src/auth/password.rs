use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::errors::AppError;

/// Argon2id with the configured time cost; memory and parallelism stay at
/// the crate defaults. The generated salt is 16 bytes.
fn kdf(time_cost: u32) -> anyhow::Result<Argon2<'static>> {
    let params = Params::new(
        Params::DEFAULT_M_COST,
        time_cost,
        Params::DEFAULT_P_COST,
        None,
    )
    .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

pub fn hash_password(plain: &str, time_cost: u32) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = kdf(time_cost)?
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Verification reads the parameters and salt embedded in the PHC string,
/// and the comparison inside argon2 is constant-time.
pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Minimum complexity: configured length, plus mixed case or a digit.
pub fn check_password_policy(plain: &str, min_len: usize) -> Result<(), AppError> {
    if plain.chars().count() < min_len {
        return Err(AppError::InvalidInput(format!(
            "password must be at least {min_len} characters"
        )));
    }
    let has_upper = plain.chars().any(|c| c.is_uppercase());
    let has_lower = plain.chars().any(|c| c.is_lowercase());
    let has_digit = plain.chars().any(|c| c.is_ascii_digit());
    if (has_upper && has_lower) || has_digit {
        Ok(())
    } else {
        Err(AppError::InvalidInput(
            "password must mix upper and lower case or contain a digit".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password, 2).expect("hashing should succeed");
        assert!(verify_password(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let password = "correct-horse-battery-staple7";
        let hash = hash_password(password, 2).expect("hashing should succeed");
        assert!(!verify_password("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn same_password_hashes_differently() {
        // Fresh random salt per hash.
        let a = hash_password("Secret123", 2).unwrap();
        let b = hash_password("Secret123", 2).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn policy_rejects_short_passwords() {
        assert!(check_password_policy("Ab1", 8).is_err());
    }

    #[test]
    fn policy_rejects_single_case_without_digit() {
        assert!(check_password_policy("lowercaseonly", 8).is_err());
    }

    #[test]
    fn policy_accepts_mixed_case_or_digit() {
        assert!(check_password_policy("MixedCasePass", 8).is_ok());
        assert!(check_password_policy("alldigits123", 8).is_ok());
    }
}
