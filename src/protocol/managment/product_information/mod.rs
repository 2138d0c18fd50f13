//! Product Information (PGN 126996) payload, sent as a fast packet in answer
//! to an ISO request.
use crate::config::ProductInformation;

pub const PGN_PRODUCT_INFORMATION: u32 = 126996;

/// Width of each text field.
const TEXT_FIELD_LEN: usize = 32;

/// Encoded payload length: two u16, four text fields and two u8.
pub const PRODUCT_INFORMATION_LEN: usize = 2 + 2 + 4 * TEXT_FIELD_LEN + 2;

/// Text fields are truncated to 32 bytes and padded with `0xFF`.
fn put_text(out: &mut [u8], text: &str) {
    let bytes = text.as_bytes();
    let len = bytes.len().min(TEXT_FIELD_LEN);
    out[..len].copy_from_slice(&bytes[..len]);
    out[len..TEXT_FIELD_LEN].fill(0xFF);
}

pub fn encode(info: &ProductInformation) -> [u8; PRODUCT_INFORMATION_LEN] {
    let mut out = [0xFF; PRODUCT_INFORMATION_LEN];
    out[0..2].copy_from_slice(&info.n2k_version.to_le_bytes());
    out[2..4].copy_from_slice(&info.product_code.to_le_bytes());

    let texts = [
        info.model_id,
        info.software_version,
        info.model_version,
        info.model_serial_code,
    ];
    for (i, text) in texts.iter().enumerate() {
        let start = 4 + i * TEXT_FIELD_LEN;
        put_text(&mut out[start..start + TEXT_FIELD_LEN], text);
    }

    out[PRODUCT_INFORMATION_LEN - 2] = info.certification_level;
    out[PRODUCT_INFORMATION_LEN - 1] = info.load_equivalency;
    out
}
