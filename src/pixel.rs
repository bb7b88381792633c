//! The tracking pixel: a fixed 1x1 transparent PNG.
//!
//! The response to a pixel fetch must be byte-identical regardless of how
//! the observation was classified, so nothing about tracking outcomes can
//! be inferred from the image itself. Cache-disabling headers ensure the
//! client re-fetches on every open instead of serving a cached copy.

use std::sync::LazyLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Base64 form of the 1x1 transparent PNG served for every tracking id.
const PIXEL_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";

/// Decoded pixel bytes, decoded once at first use.
pub static PIXEL_PNG: LazyLock<Vec<u8>> = LazyLock::new(|| {
    STANDARD
        .decode(PIXEL_PNG_BASE64)
        .expect("embedded pixel constant is valid base64")
});

/// `Cache-Control` value disabling all caching of the pixel.
pub const CACHE_CONTROL_VALUE: &str = "no-store, no-cache, must-revalidate, private";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_is_a_png() {
        assert_eq!(PIXEL_PNG.len(), 70);
        // PNG signature
        assert_eq!(&PIXEL_PNG[..8], &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]);
    }
}
