use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

/// Hashes with Argon2id and a fresh random salt, returning the PHC string.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("argon2 hash_password: {e}"))?
        .to_string();
    Ok(hash)
}

/// True iff `plain` produced `hash`. A digest that does not parse is a mismatch.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let hash = hash_password("secret123").expect("hashing should succeed");
        assert!(verify_password("secret123", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn digest_is_not_the_plaintext() {
        let hash = hash_password("secret123").expect("hashing should succeed");
        assert_ne!(hash, "secret123");
        assert!(hash.starts_with("$argon2"));
    }

    #[test]
    fn same_password_hashes_differently_but_both_verify() {
        let a = hash_password("correct-horse-battery-staple").unwrap();
        let b = hash_password("correct-horse-battery-staple").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("correct-horse-battery-staple", &a));
        assert!(verify_password("correct-horse-battery-staple", &b));
    }

    #[test]
    fn malformed_digest_is_false_not_error() {
        assert!(!verify_password("anything", "not-a-valid-hash"));
        assert!(!verify_password("anything", ""));
        assert!(!verify_password("anything", "$argon2id$v=19$m=19456,t=2,p=1$truncated"));
    }
}
