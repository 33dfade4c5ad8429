//! Login and registration.

use crate::credentials::{password_hash, CredentialStore};
use crate::session::protocol::Response;
use crate::{LabError, Result};
use serde_json::Map;
use tracing::info;

pub(super) fn login(store: &dyn CredentialStore, username: &str, password: &str) -> Result<Response> {
    let hash = password_hash(password);
    if !store.authenticate(username, &hash)? {
        return Err(LabError::InvalidCredentials);
    }

    info!("User {} logged in", username);
    Ok(Response::success(Map::new())
        .with_data("message", "login successful")
        .with_data("username", username))
}

pub(super) fn register(
    store: &dyn CredentialStore,
    username: &str,
    password: &str,
) -> Result<Response> {
    let hash = password_hash(password);
    store.register(username, &hash)?;

    info!("User {} registered", username);
    Ok(Response::success(Map::new()).with_data("message", "registration successful"))
}
