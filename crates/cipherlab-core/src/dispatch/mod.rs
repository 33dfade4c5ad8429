//! Request dispatch, split by domain.
//!
//! Every message turns into exactly one [`Response`]. Validation happens in
//! [`Request::decode`] before any engine runs; engine and store errors are
//! converted to error responses here.

mod auth;
mod cipher;
mod params;
mod request;
mod solver;
mod stego;

pub use request::{CipherKeys, Request};

use crate::config::StegoLimits;
use crate::credentials::CredentialStore;
use crate::session::protocol::{RequestKind, Response};
use crate::session::server::MessageHandler;
use crate::stego::LsbCodec;
use crate::LabError;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Routes validated requests to the engines and the credential store.
pub struct Dispatcher {
    store: Arc<dyn CredentialStore>,
    stego: LsbCodec,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            stego: LsbCodec::default(),
        }
    }

    /// Override the minimum image size for hide and extract.
    pub fn with_stego_limits(mut self, limits: StegoLimits) -> Self {
        self.stego = LsbCodec::new(limits);
        self
    }

    /// Decode a raw message and handle it.
    pub fn handle_message(&self, message: Value) -> Response {
        match Request::decode(message) {
            Ok(request) => self.handle(request),
            Err(e) => error_response(&e, None),
        }
    }

    /// Run one validated request.
    pub fn handle(&self, request: Request) -> Response {
        let kind = request.kind();
        debug!("Handling {} request", kind);

        let result = match request {
            Request::Login { username, password } => {
                auth::login(self.store.as_ref(), &username, &password)
            }
            Request::Register { username, password } => {
                auth::register(self.store.as_ref(), &username, &password)
            }
            Request::Encrypt { text, keys } => cipher::encrypt(&text, &keys),
            Request::Decrypt { ciphertext, keys } => cipher::decrypt(&ciphertext, &keys),
            Request::Solve {
                equation,
                a,
                b,
                epsilon,
                max_iterations,
            } => Ok(solver::solve(&equation, a, b, epsilon, max_iterations)),
            Request::Hide { image, message } => stego::hide(&self.stego, &image, &message),
            Request::Extract { image } => stego::extract(&self.stego, &image),
        };

        match result {
            Ok(response) => {
                if !response.is_success() {
                    warn!("{} request failed: {}", kind, response.error_message);
                }
                response
            }
            Err(e) => error_response(&e, Some(kind)),
        }
    }
}

fn error_response(error: &LabError, kind: Option<RequestKind>) -> Response {
    match kind {
        Some(kind) => warn!("{} request failed ({}): {}", kind, error.category(), error),
        None => warn!("Rejected request ({}): {}", error.category(), error),
    }
    Response::error(error.to_string())
}

impl MessageHandler for Dispatcher {
    fn handle_message(&self, message: Value) -> Response {
        Dispatcher::handle_message(self, message)
    }
}
