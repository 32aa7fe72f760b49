use crate::error::FrameError;
use base64::{engine::general_purpose::STANDARD, Engine};
use image::DynamicImage;

const HEADER_DELIMITER: char = ',';

/// Turns inbound text payloads into image data.
///
/// Payloads are base64, optionally prefixed by a data-URI header such as
/// `data:image/jpeg;base64,`. Everything up to the first comma is treated as
/// the header and discarded.
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadDecoder;

impl PayloadDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Returns the encoded segment of a payload, without its header.
    pub fn encoded_segment(payload: &str) -> &str {
        match payload.split_once(HEADER_DELIMITER) {
            Some((_header, encoded)) => encoded.trim(),
            None => payload.trim(),
        }
    }

    pub fn decode_payload(&self, payload: &str) -> Result<Vec<u8>, FrameError> {
        let encoded = Self::encoded_segment(payload);
        if encoded.is_empty() {
            return Err(FrameError::PayloadDecode("empty payload".to_string()));
        }
        Ok(STANDARD.decode(encoded)?)
    }

    pub fn decode_image(&self, bytes: &[u8]) -> Result<DynamicImage, FrameError> {
        Ok(image::load_from_memory(bytes)?)
    }

    /// Payload straight to a raster image.
    pub fn decode_frame(&self, payload: &str) -> Result<DynamicImage, FrameError> {
        let bytes = self.decode_payload(payload)?;
        self.decode_image(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::png_payload;

    #[test]
    fn round_trips_arbitrary_bytes_without_header() {
        let bytes: Vec<u8> = (0..=255u8).cycle().take(1031).collect();
        let encoded = STANDARD.encode(&bytes);
        assert_eq!(PayloadDecoder::new().decode_payload(&encoded).unwrap(), bytes);
    }

    #[test]
    fn round_trips_arbitrary_bytes_with_header() {
        let bytes = vec![0u8, 1, 2, 253, 254, 255];
        let payload = format!("data:application/octet-stream;base64,{}", STANDARD.encode(&bytes));
        assert_eq!(PayloadDecoder::new().decode_payload(&payload).unwrap(), bytes);
    }

    #[test]
    fn only_the_first_comma_delimits_the_header() {
        assert_eq!(PayloadDecoder::encoded_segment("a,b,c"), "b,c");
        assert_eq!(PayloadDecoder::encoded_segment("  abc  "), "abc");
    }

    #[test]
    fn malformed_base64_is_a_payload_error() {
        let err = PayloadDecoder::new()
            .decode_payload("data:image/png;base64,@@not-base64@@")
            .unwrap_err();
        assert!(matches!(err, FrameError::PayloadDecode(_)));
    }

    #[test]
    fn empty_segment_is_a_payload_error() {
        let err = PayloadDecoder::new().decode_payload("data:image/png;base64,").unwrap_err();
        assert!(matches!(err, FrameError::PayloadDecode(_)));
    }

    #[test]
    fn non_image_bytes_are_an_image_error() {
        let payload = STANDARD.encode(b"definitely not an image");
        let err = PayloadDecoder::new().decode_frame(&payload).unwrap_err();
        assert!(matches!(err, FrameError::ImageDecode(_)));
    }

    #[test]
    fn decodes_png_frames() {
        let image = PayloadDecoder::new().decode_frame(&png_payload(8, 4, 0)).unwrap();
        assert_eq!((image.width(), image.height()), (8, 4));
    }
}
