use serde::Serialize;

use crate::auth::session::Flash;

/// View model handed to the templating layer: the template name, the
/// signed-in state, the flash messages consumed by this page load and the
/// page-specific context.
#[derive(Debug, Serialize)]
pub struct Rendered<'a, T: Serialize> {
    pub view: &'a str,
    pub signed_in: bool,
    pub current_user: Option<&'a str>,
    pub flash: Vec<Flash>,
    #[serde(flatten)]
    pub context: T,
}
