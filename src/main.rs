use std::io::{self, BufRead};

use anyhow::Context;

mod app;
mod auth;
mod config;
mod db;
mod error;
mod meals;
#[cfg(test)]
mod memory;
mod state;
mod views;

use crate::{app::build_app, state::AppState};

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "mealcost=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

/// `mealcost hash-password` reads a password from stdin and prints the hash
/// to store in the `users` table.
fn hash_password_from_stdin() -> anyhow::Result<()> {
    let mut password = String::new();
    io::stdin()
        .lock()
        .read_line(&mut password)
        .context("read password from stdin")?;
    let password = password.trim_end_matches(['\r', '\n']);
    anyhow::ensure!(!password.is_empty(), "password must not be empty");

    println!("{}", auth::password::hash_password(password)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    if std::env::args().nth(1).as_deref() == Some("hash-password") {
        return hash_password_from_stdin();
    }

    init_tracing();

    let app_state = AppState::init().await?;
    app::serve(build_app(app_state)).await
}
