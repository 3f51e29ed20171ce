use tiny_skia::Pixmap;

use crate::error::EncodingError;

/// Serializes a rendered card to PNG bytes.
pub fn encode_png(surface: &Pixmap) -> Result<Vec<u8>, EncodingError> {
    surface
        .encode_png()
        .map_err(|e| EncodingError(e.to_string()))
}
