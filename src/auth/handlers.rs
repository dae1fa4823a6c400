use axum::{
    extract::State,
    response::Response,
    routing::{get, post},
    Form, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{SignInForm, SignInView},
        services::authenticate,
        session::{FlashKind, Session},
    },
    error::AppResult,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/users/signin", get(signin_form).post(signin))
        .route("/users/signout", post(signout))
}

#[instrument(skip(session))]
pub async fn signin_form(mut session: Session) -> Response {
    session.flash(FlashKind::Info, "Please sign in.");
    session.render("signin", SignInView { username: None })
}

#[instrument(skip(state, session, form))]
pub async fn signin(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<SignInForm>,
) -> AppResult<Response> {
    let username = form.username.trim();

    if !authenticate(state.users.as_ref(), username, &form.password).await? {
        session.flash(FlashKind::Error, "Invalid credentials.");
        return Ok(session.render(
            "signin",
            SignInView {
                username: Some(form.username.clone()),
            },
        ));
    }

    info!(%username, "user signed in");
    session.sign_in(username);
    match session.take_return_to() {
        Some(path) => Ok(session.redirect(&path)),
        None => {
            session.flash(FlashKind::Info, "Welcome!");
            Ok(session.redirect("/meals"))
        }
    }
}

#[instrument(skip(session))]
pub async fn signout(mut session: Session) -> Response {
    if let Some(username) = session.username() {
        info!(%username, "user signed out");
    }
    session.sign_out();
    session.redirect("/users/signin")
}
