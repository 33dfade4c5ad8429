//! Centralized configuration for cipherlab.
//!
//! Compile-time constants grouped by concern, plus [`StegoLimits`] for the
//! one floor that operators may tune at startup.

use std::time::Duration;

/// Listening socket and per-connection limits.
pub struct ServerConfig;

impl ServerConfig {
    pub const DEFAULT_PORT: u16 = 12345;
    pub const DEFAULT_HOST: &'static str = "0.0.0.0";
    pub const DEFAULT_DATABASE: &'static str = "server.db";
    pub const MAX_CONNECTIONS: usize = 256;
    /// Cap on a single connection's undecoded accumulator.
    pub const MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;
    pub const READ_CHUNK_SIZE: usize = 16 * 1024;
}

/// Client-side round-trip settings.
pub struct ClientConfig;

impl ClientConfig {
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
    pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);
}

/// Chord-method defaults applied when a request omits them.
pub struct SolverConfig;

impl SolverConfig {
    pub const DEFAULT_EPSILON: f64 = 0.0001;
    pub const DEFAULT_MAX_ITERATIONS: u32 = 100;
    /// Denominators smaller than this abort the iteration.
    pub const MIN_DENOMINATOR: f64 = 1e-10;
}

/// Steganography constants.
pub struct StegoConfig;

impl StegoConfig {
    /// Pixels reserved for the 32-bit length prefix.
    pub const LENGTH_PREFIX_BITS: usize = 32;
    pub const MAX_MESSAGE_CHARS: usize = 10_000;
    pub const DEFAULT_MIN_SIDE: u32 = 10;
    pub const DEFAULT_MIN_PIXELS: u64 = 100;
}

/// Minimum viable image size for hiding or extracting a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StegoLimits {
    pub min_width: u32,
    pub min_height: u32,
    pub min_pixels: u64,
}

impl StegoLimits {
    pub fn new(min_side: u32, min_pixels: u64) -> Self {
        Self {
            min_width: min_side,
            min_height: min_side,
            min_pixels,
        }
    }

    /// Whether an image of the given dimensions meets the floor.
    pub fn admits(&self, width: u32, height: u32) -> bool {
        width >= self.min_width
            && height >= self.min_height
            && u64::from(width) * u64::from(height) >= self.min_pixels
    }
}

impl Default for StegoLimits {
    fn default() -> Self {
        Self::new(StegoConfig::DEFAULT_MIN_SIDE, StegoConfig::DEFAULT_MIN_PIXELS)
    }
}
