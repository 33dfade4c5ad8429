//! Server assembly: credential store, dispatcher, session server.

use cipherlab_core::{
    Dispatcher, ServerHandle, SessionServer, SqliteCredentialStore, StegoLimits,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Runtime settings gathered from the command line.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub database: PathBuf,
    pub stego_limits: StegoLimits,
}

/// Open the credential store and start accepting connections.
///
/// Returns the handle of the running server; dropping it stops the server.
pub async fn start_server(settings: &ServerSettings) -> anyhow::Result<ServerHandle> {
    let store = SqliteCredentialStore::open_at(&settings.database)?;
    info!("Credential store: {}", settings.database.display());

    let dispatcher = Dispatcher::new(Arc::new(store)).with_stego_limits(settings.stego_limits);

    let addr = format!("{}:{}", settings.host, settings.port);
    let handle = SessionServer::start(Arc::new(dispatcher), addr.as_str()).await?;
    Ok(handle)
}
