use lazy_static::lazy_static;
use tracing::{debug, warn};

use crate::auth::{
    password::{hash_password, verify_password},
    repo::UserRepository,
};

lazy_static! {
    /// Verified against for unknown users so both failures cost one argon2 run.
    static ref DUMMY_HASH: Option<String> = hash_password("mealcost-unknown-user").ok();
}

/// True when `username` exists and `password` matches its stored hash.
pub async fn authenticate(
    users: &dyn UserRepository,
    username: &str,
    password: &str,
) -> anyhow::Result<bool> {
    let Some(hash) = users.find_password_hash(username).await? else {
        debug!(%username, "sign in for unknown user");
        if let Some(dummy) = DUMMY_HASH.as_deref() {
            verify_password(password, dummy)?;
        }
        return Ok(false);
    };

    let ok = verify_password(password, &hash)?;
    if !ok {
        warn!(%username, "sign in with invalid password");
    }
    Ok(ok)
}
