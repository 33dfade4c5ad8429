//! Typed, validated requests.

use super::params::{
    get_f64_param, get_i64_param, require_base64_param, require_f64_param, require_str_param,
};
use crate::config::{SolverConfig, StegoConfig};
use crate::session::protocol::{RequestKind, WireRequest};
use crate::stego::is_printable;
use crate::{LabError, Result};
use serde_json::{Map, Value};

/// Key material for the three cipher passes, already base64-decoded.
#[derive(Clone, PartialEq, Eq)]
pub struct CipherKeys(pub [Vec<u8>; 3]);

impl std::fmt::Debug for CipherKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CipherKeys(..)")
    }
}

/// A request whose fields have passed validation.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Login {
        username: String,
        password: String,
    },
    Register {
        username: String,
        password: String,
    },
    Encrypt {
        text: String,
        keys: CipherKeys,
    },
    Decrypt {
        ciphertext: Vec<u8>,
        keys: CipherKeys,
    },
    Solve {
        equation: String,
        a: f64,
        b: f64,
        epsilon: f64,
        max_iterations: u32,
    },
    Hide {
        image: Vec<u8>,
        message: String,
    },
    Extract {
        image: Vec<u8>,
    },
}

impl Request {
    pub fn kind(&self) -> RequestKind {
        match self {
            Request::Login { .. } => RequestKind::Login,
            Request::Register { .. } => RequestKind::Register,
            Request::Encrypt { .. } => RequestKind::CipherEncrypt,
            Request::Decrypt { .. } => RequestKind::CipherDecrypt,
            Request::Solve { .. } => RequestKind::SolveEquation,
            Request::Hide { .. } => RequestKind::StegoHide,
            Request::Extract { .. } => RequestKind::StegoExtract,
        }
    }

    /// Decode a raw JSON message into a validated request.
    pub fn decode(message: Value) -> Result<Self> {
        let wire: WireRequest =
            serde_json::from_value(message).map_err(|e| LabError::MalformedRequest {
                message: e.to_string(),
            })?;
        Self::from_wire(wire)
    }

    /// Validate a wire request's payload for its operation.
    pub fn from_wire(wire: WireRequest) -> Result<Self> {
        let kind = RequestKind::try_from(wire.kind)?;
        let data = &wire.data;

        Ok(match kind {
            RequestKind::Login => Request::Login {
                username: require_str_param(data, "username")?,
                password: require_str_param(data, "password")?,
            },
            RequestKind::Register => Request::Register {
                username: require_str_param(data, "username")?,
                password: require_str_param(data, "password")?,
            },
            RequestKind::CipherEncrypt => Request::Encrypt {
                text: require_str_param(data, "text")?,
                keys: cipher_keys(data)?,
            },
            RequestKind::CipherDecrypt => Request::Decrypt {
                ciphertext: require_base64_param(data, "encrypted_text")?,
                keys: cipher_keys(data)?,
            },
            RequestKind::SolveEquation => solve_request(data)?,
            RequestKind::StegoHide => Request::Hide {
                image: require_base64_param(data, "image")?,
                message: hide_message(data)?,
            },
            RequestKind::StegoExtract => Request::Extract {
                image: require_base64_param(data, "image")?,
            },
        })
    }
}

fn cipher_keys(data: &Map<String, Value>) -> Result<CipherKeys> {
    Ok(CipherKeys([
        require_base64_param(data, "key1")?,
        require_base64_param(data, "key2")?,
        require_base64_param(data, "key3")?,
    ]))
}

fn solve_request(data: &Map<String, Value>) -> Result<Request> {
    let equation = require_str_param(data, "equation")?;
    let a = require_f64_param(data, "a")?;
    let b = require_f64_param(data, "b")?;
    if a >= b {
        return Err(LabError::invalid_params(
            "interval start a must be less than end b",
        ));
    }

    let epsilon = get_f64_param(data, "epsilon")?.unwrap_or(SolverConfig::DEFAULT_EPSILON);
    if epsilon <= 0.0 {
        return Err(LabError::invalid_params("epsilon must be positive"));
    }

    let max_iterations = match get_i64_param(data, "max_iterations")? {
        None => SolverConfig::DEFAULT_MAX_ITERATIONS,
        Some(n) if n > 0 => u32::try_from(n)
            .map_err(|_| LabError::invalid_params("max_iterations is too large"))?,
        Some(_) => return Err(LabError::invalid_params("max_iterations must be positive")),
    };

    Ok(Request::Solve {
        equation,
        a,
        b,
        epsilon,
        max_iterations,
    })
}

fn hide_message(data: &Map<String, Value>) -> Result<String> {
    let message = require_str_param(data, "message")?;
    if message.chars().count() > StegoConfig::MAX_MESSAGE_CHARS {
        return Err(LabError::invalid_params(format!(
            "message is too long, maximum length is {} characters",
            StegoConfig::MAX_MESSAGE_CHARS
        )));
    }
    if !message.chars().all(is_printable) {
        return Err(LabError::invalid_params(
            "message contains unsupported characters",
        ));
    }
    Ok(message)
}
