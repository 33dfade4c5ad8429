//! TCP session layer.
//!
//! Bare JSON messages over TCP, one request in flight per connection.
//!
//! # Architecture
//!
//! - **Server**: accepts connections, frames messages, runs a [`MessageHandler`]
//! - **Client**: connects to a server and performs typed round trips
//! - **Protocol**: wire types and the framing buffer shared by both

pub mod client;
pub mod protocol;
pub mod server;

pub use client::SessionClient;
pub use protocol::{MessageBuffer, RequestKind, Response, Status, WireRequest};
pub use server::{MessageHandler, ServerHandle, ServerOptions, SessionServer};
