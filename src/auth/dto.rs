use serde::{Deserialize, Serialize};

/// Sign-in form body.
#[derive(Debug, Deserialize)]
pub struct SignInForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignInView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}
