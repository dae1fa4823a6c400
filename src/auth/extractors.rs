use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, Method},
    response::Response,
};
use tracing::debug;

use super::session::Session;
use crate::{meals::store::MealStore, state::AppState};

/// A signed-in request: the session plus a store scoped to its user.
///
/// Anonymous requests are redirected to the sign-in page; for GET requests
/// the original path is kept in the session so signing in can return there.
pub struct SignedIn {
    pub session: Session,
    pub store: MealStore,
}

#[async_trait]
impl FromRequestParts<AppState> for SignedIn {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let mut session = Session::from_request_parts(parts, state)
            .await
            .unwrap_or_else(|never| match never {});

        if let Some(username) = session.username() {
            let store = MealStore::new(state.meals.clone(), username);
            return Ok(SignedIn { session, store });
        }

        debug!(uri = %parts.uri, "anonymous request, redirecting to sign in");
        if parts.method == Method::GET {
            let path = parts
                .uri
                .path_and_query()
                .map(|p| p.as_str())
                .unwrap_or("/meals");
            session.remember_path(path);
        }
        Err(session.redirect("/users/signin"))
    }
}
