use std::sync::Arc;

use anyhow::{anyhow, Result};
use fw_api_http::ApiHttpServer;
use fw_auth::{encrypt_password, CookieAuth, InMemoryUsers, PasswordAuth};
use fw_hash_argon2::argon2::Argon2Hash;
use tokio_util::sync::CancellationToken;

mod app;
mod config_path;

#[tokio::main]
async fn main() -> Result<()> {
    let config = fw_config::from_path(&config_path::get())?;

    fw_log::init(config.log().display_level(), config.log().level_filter())
        .map_err(|err| anyhow!(err))?;

    fw_log::info(Some("🚀"), "[Formwork] Starting");

    let argon2_hash = Arc::new(
        Argon2Hash::new(
            config.hash().argon2().algorithm(),
            config.hash().argon2().version(),
        )
        .map_err(|err| anyhow!("Invalid argon2 configuration: {err}"))?,
    );

    let users = InMemoryUsers::new();
    for user in config.auth().users() {
        users.add(user.login(), &encrypt_password(&argon2_hash, user.password())?)?;
    }
    if config.auth().users().is_empty() {
        fw_log::warn(None, "[Formwork] No users configured, nobody can log in");
    }

    let auth = Arc::new(
        CookieAuth::new(PasswordAuth::new(users, argon2_hash))
            .with_cookie_name(config.auth().cookie_name())
            .with_cookie_path(config.auth().cookie_path()),
    );

    let api_http_server = ApiHttpServer::new(
        config.api().http().host(),
        config.api().http().port(),
        config.api().http().workers(),
        Arc::new(app::app(&auth, config.auth())),
        Arc::new(app::templates()?),
    );

    let cancel_token = CancellationToken::new();

    match api_http_server.run(cancel_token.clone()).await {
        Ok(_) => fw_log::info(Some("👋"), "[Formwork] Turned off"),
        Err(err) => {
            fw_log::warn(None, "[Formwork] Shutting down all running components");
            cancel_token.cancel();
            fw_log::warn(
                Some("👋"),
                format!("[Formwork] Turned off with error: {err}"),
            );
        }
    }

    Ok(())
}
