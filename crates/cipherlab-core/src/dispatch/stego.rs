//! Message hiding and extraction.

use crate::session::protocol::Response;
use crate::stego::{decode_image, encode_png, LsbCodec};
use crate::Result;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::Map;
use tracing::debug;

pub(super) fn hide(codec: &LsbCodec, image: &[u8], message: &str) -> Result<Response> {
    let source = decode_image(image)?;
    let carrier = codec.hide(&source, message)?;
    let png = encode_png(&carrier)?;
    debug!(
        "Hid {} bytes in a {}x{} image",
        message.len(),
        carrier.width(),
        carrier.height()
    );

    Ok(Response::success(Map::new())
        .with_data("image", STANDARD.encode(png))
        .with_data("message", "message hidden successfully"))
}

pub(super) fn extract(codec: &LsbCodec, image: &[u8]) -> Result<Response> {
    let source = decode_image(image)?;
    let message = codec.extract(&source)?;
    Ok(Response::success(Map::new()).with_data("message", message))
}
