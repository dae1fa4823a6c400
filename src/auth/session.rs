use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::{config::SessionConfig, error::AppError, state::AppState, views::Rendered};

pub const SESSION_COOKIE: &str = "meal-cost-session-id";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Error,
    Success,
    Info,
}

/// One-shot notice shown on the next rendered page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

/// Everything a browser session carries between requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flash: Vec<Flash>,
    /// Where to send the user after signing in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_to: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    #[serde(flatten)]
    data: SessionData,
    iat: usize, // issued at (unix timestamp)
    exp: usize, // expires at (unix timestamp)
    iss: String,
    aud: String,
}

/// Signing keys and cookie settings for the session cookie.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
    secure: bool,
}

impl SessionKeys {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            ttl: Duration::days(config.ttl_days),
            secure: config.cookie_secure,
        }
    }

    pub fn encode(&self, data: &SessionData) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let claims = SessionClaims {
            data: data.clone(),
            iat: now.unix_timestamp() as usize,
            exp: (now + self.ttl).unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    pub fn decode(&self, token: &str) -> anyhow::Result<SessionData> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let token = decode::<SessionClaims>(token, &self.decoding, &validation)?;
        Ok(token.claims.data)
    }

    fn cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(self.ttl)
            .build()
    }
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

/// The current request's session. Every response built through it carries
/// the updated session cookie.
pub struct Session {
    data: SessionData,
    keys: SessionKeys,
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = SessionKeys::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        let data = match jar.get(SESSION_COOKIE) {
            Some(cookie) => keys.decode(cookie.value()).unwrap_or_else(|e| {
                debug!(error = %e, "discarding invalid session cookie");
                SessionData::default()
            }),
            None => SessionData::default(),
        };
        Ok(Self { data, keys })
    }
}

fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\")
}

impl Session {
    pub fn username(&self) -> Option<&str> {
        self.data.username.as_deref()
    }

    pub fn flash(&mut self, kind: FlashKind, message: impl Into<String>) {
        self.data.flash.push(Flash {
            kind,
            message: message.into(),
        });
    }

    pub fn sign_in(&mut self, username: impl Into<String>) {
        self.data.username = Some(username.into());
    }

    pub fn sign_out(&mut self) {
        self.data.username = None;
        self.data.return_to = None;
    }

    /// Remembers `path` for the redirect after signing in. Paths that would
    /// leave the site are ignored.
    pub fn remember_path(&mut self, path: &str) {
        if is_local_path(path) {
            self.data.return_to = Some(path.to_string());
        }
    }

    pub fn take_return_to(&mut self) -> Option<String> {
        self.data.return_to.take()
    }

    /// Renders `view`, consuming the pending flash messages.
    pub fn render<T: Serialize>(mut self, view: &str, context: T) -> Response {
        let flash = std::mem::take(&mut self.data.flash);
        let response = Json(Rendered {
            view,
            signed_in: self.data.username.is_some(),
            current_user: self.data.username.as_deref(),
            flash,
            context,
        })
        .into_response();
        self.finish(response)
    }

    /// Redirects to `to`, keeping the flash messages for the next page.
    pub fn redirect(self, to: &str) -> Response {
        self.finish(Redirect::to(to).into_response())
    }

    fn finish(self, response: Response) -> Response {
        match self.keys.encode(&self.data) {
            Ok(token) => (CookieJar::new().add(self.keys.cookie(token)), response).into_response(),
            Err(e) => AppError::Internal(e.context("encode session")).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::http::{header, StatusCode};

    fn keys() -> SessionKeys {
        SessionKeys::from_config(&AppConfig::test().session)
    }

    fn session(data: SessionData) -> Session {
        Session { data, keys: keys() }
    }

    fn cookie_data(response: &Response) -> SessionData {
        let header = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("session cookie set")
            .to_str()
            .unwrap();
        let cookie = Cookie::parse(header.to_string()).unwrap();
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        keys().decode(cookie.value()).unwrap()
    }

    #[test]
    fn session_data_survives_the_cookie() {
        let data = SessionData {
            username: Some("alice".into()),
            flash: vec![Flash {
                kind: FlashKind::Success,
                message: "Saved.".into(),
            }],
            return_to: Some("/meals/3".into()),
        };
        let token = keys().encode(&data).unwrap();
        assert_eq!(keys().decode(&token).unwrap(), data);
    }

    #[test]
    fn cookies_signed_with_another_secret_are_rejected() {
        let mut config = AppConfig::test().session;
        config.secret = "someone-else".into();
        let forged = SessionKeys::from_config(&config)
            .encode(&SessionData {
                username: Some("mallory".into()),
                ..Default::default()
            })
            .unwrap();
        assert!(keys().decode(&forged).is_err());
        assert!(keys().decode("garbage").is_err());
    }

    #[test]
    fn only_local_paths_are_remembered() {
        let mut s = session(SessionData::default());
        s.remember_path("https://evil.example/");
        assert_eq!(s.take_return_to(), None);
        s.remember_path("//evil.example/");
        assert_eq!(s.take_return_to(), None);
        s.remember_path("/meals?page=2");
        assert_eq!(s.take_return_to().as_deref(), Some("/meals?page=2"));
        assert_eq!(s.take_return_to(), None);
    }

    #[tokio::test]
    async fn render_consumes_flash_messages() {
        let mut s = session(SessionData {
            username: Some("alice".into()),
            ..Default::default()
        });
        s.flash(FlashKind::Error, "Nope.");
        let response = s.render("meals", serde_json::json!({ "page": 1 }));

        assert_eq!(response.status(), StatusCode::OK);
        assert!(cookie_data(&response).flash.is_empty());

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["view"], "meals");
        assert_eq!(json["current_user"], "alice");
        assert_eq!(json["page"], 1);
        assert_eq!(json["flash"][0]["kind"], "error");
        assert_eq!(json["flash"][0]["message"], "Nope.");
    }

    #[test]
    fn redirect_keeps_flash_messages() {
        let mut s = session(SessionData::default());
        s.flash(FlashKind::Success, "Done.");
        let response = s.redirect("/meals");

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/meals");
        assert_eq!(cookie_data(&response).flash[0].message, "Done.");
    }

    #[test]
    fn sign_out_forgets_the_user() {
        let mut s = session(SessionData {
            username: Some("alice".into()),
            return_to: Some("/meals".into()),
            ..Default::default()
        });
        s.sign_out();
        assert_eq!(s.username(), None);
        assert_eq!(s.take_return_to(), None);
    }
}
