//! Cipherlab Core - engines, dispatcher and TCP session layer.
//!
//! This crate provides everything the cipherlab server does except process
//! startup: the three algorithmic engines, the credential store, the request
//! dispatcher, and the JSON-over-TCP session layer with its client.
//!
//! # Example
//!
//! ```rust,ignore
//! use cipherlab_core::{Dispatcher, MemoryCredentialStore, SessionClient, SessionServer};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> cipherlab_core::Result<()> {
//!     let dispatcher = Dispatcher::new(Arc::new(MemoryCredentialStore::new()));
//!     let server = SessionServer::start(Arc::new(dispatcher), "127.0.0.1:0").await?;
//!
//!     let client = SessionClient::connect(server.addr()).await?;
//!     let response = client.solve("x^2-2", 0.0, 2.0, None, None).await?;
//!     println!("root = {}", response.data["root"]);
//!
//!     Ok(())
//! }
//! ```

pub mod cipher;
pub mod config;
pub mod credentials;
pub mod dispatch;
pub mod error;
pub mod session;
pub mod solver;
pub mod stego;

// Re-export commonly used types
pub use cipher::{generate_key, CipherError, TripleCipher};
pub use config::{ClientConfig, ServerConfig, SolverConfig, StegoConfig, StegoLimits};
pub use credentials::{
    password_hash, CredentialStore, MemoryCredentialStore, SqliteCredentialStore,
};
pub use dispatch::{Dispatcher, Request};
pub use error::{ErrorCategory, LabError, Result};
pub use session::{
    MessageHandler, RequestKind, Response, ServerHandle, ServerOptions, SessionClient,
    SessionServer, Status, WireRequest,
};
pub use solver::{parse_equation, solve_equation, ChordSolution, Polynomial, SolverError};
pub use stego::{LsbCodec, StegoError};
