use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;

use super::{
    clock::Clock,
    dto::{RegisterRequest, TokenResponse},
    error::AuthError,
    jwt::JwtKeys,
    password::{hash_password, verify_password},
};
use crate::users::{
    repo::UserStore,
    repo_types::{NewUser, User},
};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Well-formed Argon2id digest with default parameters that no password matches.
/// Verified against when the login identity is unknown.
const DUMMY_PASSWORD_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// argon2 hashing runs on the blocking pool
async fn blocking<T, F>(f: F) -> anyhow::Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .context("password task panicked")
}

/// Hashes the password and inserts the account. Input is expected to be validated.
pub async fn create_account(
    users: &dyn UserStore,
    req: RegisterRequest,
) -> Result<User, AuthError> {
    let password = req.password;
    let password_hash = blocking(move || hash_password(&password)).await??;

    let user = users
        .create(NewUser {
            name: req.name.trim().to_string(),
            email: normalize_email(&req.email),
            role: req.role,
            website: req.website,
            age: req.age,
            photo: req.photo,
            password_hash,
            is_active: true,
        })
        .await?;
    Ok(user)
}

/// Checks an email/password pair. Unknown email and wrong password are
/// indistinguishable to the caller.
pub async fn authenticate(
    users: &dyn UserStore,
    email: &str,
    password: &str,
) -> Result<User, AuthError> {
    let found = users.find_by_identity(&normalize_email(email)).await?;

    // unknown identities pay the same argon2 cost as a wrong password
    let plain = password.to_owned();
    let hash = found
        .as_ref()
        .map_or_else(|| DUMMY_PASSWORD_HASH.to_owned(), |u| u.password_hash.clone());
    let matched = blocking(move || verify_password(&plain, &hash)).await?;

    let user = match found {
        Some(user) if matched => user,
        _ => return Err(AuthError::InvalidCredentials),
    };
    if !user.is_active {
        return Err(AuthError::Inactive);
    }
    Ok(user)
}

/// Mints an access token for `user` with the configured lifetime.
pub fn token_for(keys: &JwtKeys, clock: &dyn Clock, user: User) -> Result<TokenResponse, AuthError> {
    let now = clock.now();
    let issued = keys.issue(clock, &user.email, None)?;
    Ok(TokenResponse {
        access_token: issued.token,
        token_type: "bearer".into(),
        expires_in: (issued.expires_at - now).whole_seconds(),
        user: user.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::memory::MemoryUserStore;

    fn register_req(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Queens".into(),
            email: email.into(),
            password: password.into(),
            role: "Developer".into(),
            website: Some("queensdev.com".into()),
            age: Some(65),
            photo: None,
        }
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("queens@example.com"));
        assert!(!is_valid_email("queens@example"));
        assert!(!is_valid_email("not an email@example.com"));
        assert!(!is_valid_email(""));
    }

    #[tokio::test]
    async fn create_account_normalizes_and_hashes() {
        let store = MemoryUserStore::new();
        let user = create_account(&store, register_req("  Queens@Example.COM ", "secret123"))
            .await
            .expect("create");
        assert_eq!(user.email, "queens@example.com");
        assert_ne!(user.password_hash, "secret123");
        assert!(verify_password("secret123", &user.password_hash));
    }

    #[tokio::test]
    async fn duplicate_account_conflicts() {
        let store = MemoryUserStore::new();
        create_account(&store, register_req("q@example.com", "secret123"))
            .await
            .unwrap();
        let err = create_account(&store, register_req("Q@example.com", "other-pass"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Conflict));
    }

    #[tokio::test]
    async fn authenticate_checks_password_and_identity() {
        let store = MemoryUserStore::new();
        create_account(&store, register_req("q@example.com", "secret123"))
            .await
            .unwrap();

        let user = authenticate(&store, "Q@example.com", "secret123")
            .await
            .expect("login");
        assert_eq!(user.email, "q@example.com");

        assert!(matches!(
            authenticate(&store, "q@example.com", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            authenticate(&store, "nobody@example.com", "secret123").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn dummy_hash_parses_and_matches_nothing() {
        use argon2::password_hash::PasswordHash;

        let parsed = PasswordHash::new(DUMMY_PASSWORD_HASH).expect("well-formed PHC string");
        assert_eq!(parsed.algorithm.as_str(), "argon2id");
        assert!(parsed.hash.is_some());
        for guess in ["", "secret123", "password", "somesaltsomesalt"] {
            assert!(!verify_password(guess, DUMMY_PASSWORD_HASH));
        }
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_fail_the_same_way() {
        let store = MemoryUserStore::new();
        create_account(&store, register_req("q@example.com", "secret123"))
            .await
            .unwrap();

        let unknown = authenticate(&store, "not-an-email", "secret123")
            .await
            .unwrap_err();
        let wrong = authenticate(&store, "q@example.com", "secret124")
            .await
            .unwrap_err();
        assert_eq!(unknown.to_string(), wrong.to_string());
        assert!(matches!(unknown, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn authenticate_rejects_inactive_user() {
        use crate::users::repo_types::UserPatch;

        let store = MemoryUserStore::new();
        let user = create_account(&store, register_req("q@example.com", "secret123"))
            .await
            .unwrap();
        store
            .update(
                user.id,
                UserPatch {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(matches!(
            authenticate(&store, "q@example.com", "secret123").await,
            Err(AuthError::Inactive)
        ));
    }
}
