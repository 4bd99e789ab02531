use tracing::debug;

use super::{clock::Clock, error::AuthError, jwt::JwtKeys};
use crate::users::{repo::UserStore, repo_types::User};

/// Turns a raw bearer token into the live, active user it was issued for.
///
/// * bad signature, malformed or expired token -> [`AuthError::InvalidCredentials`]
/// * subject with no user record -> [`AuthError::NotFound`]
/// * user exists but is deactivated -> [`AuthError::Inactive`]
///
/// Holds no state of its own; every collaborator is passed in.
pub async fn resolve_current_user(
    keys: &JwtKeys,
    clock: &dyn Clock,
    users: &dyn UserStore,
    token: &str,
) -> Result<User, AuthError> {
    let subject = keys.verify(clock, token)?;

    let user = users
        .find_by_identity(&subject)
        .await?
        .ok_or(AuthError::NotFound)?;

    if !user.is_active {
        debug!(user_id = %user.id, "token owner is inactive");
        return Err(AuthError::Inactive);
    }
    Ok(user)
}
