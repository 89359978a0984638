use thiserror::Error;

use super::design;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Scans image bytes for a QR code carrying a design identifier.
///
/// Returns `Ok(None)` when no grid is found, a grid fails to decode, or the
/// payload carries no digit run. Bytes that are not a readable image are an
/// error so callers can report the file.
pub fn decode_design(bytes: &[u8]) -> Result<Option<String>, DecodeError> {
    let decoded = image::load_from_memory(bytes)?;
    let mut prepared = rqrr::PreparedImage::prepare(decoded.to_luma8());
    for grid in prepared.detect_grids() {
        let Ok((_, payload)) = grid.decode() else {
            continue;
        };
        if let Some(design) = design::extract_design_number(&payload) {
            return Ok(Some(design));
        }
    }
    Ok(None)
}
