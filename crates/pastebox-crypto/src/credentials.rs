use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::{SaltString, rand_core::OsRng},
};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("password hashing failed: {0}")]
    Hash(argon2::password_hash::Error),

    #[error("invalid argon2 parameters: {0}")]
    Params(argon2::Error),
}

/// Salted, adaptive password hashing.
///
/// An empty plaintext hashes to the empty string, which stands for "no
/// password set". Verifying anything against an empty hash succeeds.
#[derive(Clone, Default)]
pub struct CredentialGuard {
    argon2: Argon2<'static>,
}

impl CredentialGuard {
    /// Argon2id with explicit cost: memory in KiB, iterations, lanes.
    pub fn with_cost(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, CredentialError> {
        let params = Params::new(m_cost, t_cost, p_cost, None).map_err(CredentialError::Params)?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    pub fn hash(&self, plaintext: &str) -> Result<String, CredentialError> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(CredentialError::Hash)?;
        Ok(hash.to_string())
    }

    pub fn verify(&self, plaintext: &str, hash: &str) -> bool {
        if hash.is_empty() {
            return true;
        }

        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Stored password hash is malformed: {}", e);
                return false;
            }
        };

        // Parameters come from the PHC string, so hashes made with an older
        // cost still verify.
        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> CredentialGuard {
        CredentialGuard::with_cost(8, 1, 1).unwrap()
    }

    #[test]
    fn verify_accepts_matching_password() {
        let g = guard();
        for p in ["12345", "correct horse battery staple", "ünïcødé", " "] {
            let hash = g.hash(p).unwrap();
            assert!(g.verify(p, &hash), "failed for {:?}", p);
        }
    }

    #[test]
    fn verify_rejects_other_password() {
        let g = guard();
        let hash = g.hash("secret").unwrap();
        assert!(!g.verify("Secret", &hash));
        assert!(!g.verify("", &hash));
    }

    #[test]
    fn hashes_are_salted() {
        let g = guard();
        let a = g.hash("same").unwrap();
        let b = g.hash("same").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2id$"));
    }

    #[test]
    fn empty_hash_means_no_password() {
        let g = guard();
        assert_eq!(g.hash("").unwrap(), "");
        assert!(g.verify("anything", ""));
        assert!(g.verify("", ""));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!guard().verify("x", "not-a-phc-string"));
    }

    #[test]
    fn default_cost_hashes_verify_under_custom_guard() {
        let hash = CredentialGuard::default().hash("pw").unwrap();
        assert!(guard().verify("pw", &hash));
    }
}
