use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;

// Argon2id work factor: 19 MiB, 2 passes, 1 lane.
const MEMORY_KIB: u32 = 19 * 1024;
const ITERATIONS: u32 = 2;
const LANES: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("password not set")]
    NotSet,

    #[error("malformed password hash: {0}")]
    Malformed(String),

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

fn hasher() -> Result<Argon2<'static>, CredentialError> {
    let params = Params::new(MEMORY_KIB, ITERATIONS, LANES, None)
        .map_err(|e| CredentialError::Hash(e.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes `plain` with a fresh random salt into a PHC string.
pub fn hash_password(plain: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher()?
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            CredentialError::Hash(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Checks `plain` against a PHC string. The salt and parameters come from the
/// hash itself and the final comparison is constant-time.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool, CredentialError> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        CredentialError::Malformed(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Like [`verify_password`], but for a record that may never have had a
/// password. A missing hash is reported as [`CredentialError::NotSet`].
pub fn verify_stored(plain: &str, stored: Option<&str>) -> Result<bool, CredentialError> {
    let hash = stored.ok_or(CredentialError::NotSet)?;
    verify_password(plain, hash)
}

/// Runs [`hash_password`] on the blocking pool.
pub async fn spawn_hash(plain: String) -> Result<String, CredentialError> {
    tokio::task::spawn_blocking(move || hash_password(&plain)).await?
}

/// Runs [`verify_stored`] on the blocking pool.
pub async fn spawn_verify(plain: String, stored: Option<String>) -> Result<bool, CredentialError> {
    tokio::task::spawn_blocking(move || verify_stored(&plain, stored.as_deref())).await?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(verify_password(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let password = "correct-horse-battery-staple";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(!verify_password("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn same_password_hashes_differently() {
        let a = hash_password("p1").expect("hash a");
        let b = hash_password("p1").expect("hash b");
        assert_ne!(a, b);
        assert!(verify_password("p1", &a).unwrap());
        assert!(verify_password("p1", &b).unwrap());
    }

    #[test]
    fn hash_is_argon2id_phc_string() {
        let hash = hash_password("p1").unwrap();
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert!(matches!(err, CredentialError::Malformed(_)));
    }

    #[test]
    fn missing_hash_is_not_set() {
        let err = verify_stored("anything", None).unwrap_err();
        assert!(matches!(err, CredentialError::NotSet));
    }

    #[tokio::test]
    async fn offloaded_hash_and_verify() {
        let hash = spawn_hash("p1".into()).await.expect("hash");
        assert!(spawn_verify("p1".into(), Some(hash.clone())).await.unwrap());
        assert!(!spawn_verify("wrong".into(), Some(hash)).await.unwrap());
    }
}
