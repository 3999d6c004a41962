//! QR code recovery from uploaded images

use crate::error::Error;
use crate::record::IdentityRecord;
use crate::Result;

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
const JPEG_MAGIC: &[u8] = &[0xff, 0xd8, 0xff];

fn check_magic(bytes: &[u8]) -> Result<()> {
    if bytes.starts_with(PNG_MAGIC) || bytes.starts_with(JPEG_MAGIC) {
        Ok(())
    } else {
        Err(Error::InvalidImage(
            "not a PNG or JPEG image".to_string(),
        ))
    }
}

/// Decode a QR code out of PNG or JPEG bytes and run the extraction
/// chain over its payload. CPU-bound; callers on an async runtime
/// should run this on a blocking thread.
pub fn extract_image(bytes: &[u8]) -> Result<IdentityRecord> {
    check_magic(bytes)?;

    let image = image::load_from_memory(bytes)
        .map_err(|e| Error::InvalidImage(e.to_string()))?
        .to_luma8();

    let mut prepared = rqrr::PreparedImage::prepare(image);
    let grids = prepared.detect_grids();
    if grids.is_empty() {
        return Err(Error::InvalidImage("no QR code found".to_string()));
    }

    // Multi-grid images: first decodable grid wins
    let mut last_error = None;
    for grid in grids {
        match grid.decode() {
            Ok((_, payload)) => return super::extract_payload(&payload),
            Err(e) => last_error = Some(e),
        }
    }
    Err(Error::InvalidImage(match last_error {
        Some(e) => format!("QR decode failed: {e}"),
        None => "QR decode failed".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_wrong_magic() {
        let err = extract_image(b"GIF89a not a supported format").unwrap_err();
        assert!(matches!(err, Error::InvalidImage(_)));
    }

    #[test]
    fn test_rejects_truncated_png() {
        let mut bytes = PNG_MAGIC.to_vec();
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        assert!(extract_image(&bytes).is_err());
    }

    #[test]
    fn test_rejects_empty_input() {
        assert!(extract_image(&[]).is_err());
    }
}
