//! Base85 text encoding (RFC 1924 alphabet).
//!
//! Input is zero-padded to a multiple of four bytes; every four-byte group is
//! read big-endian and written as five digits, most significant first. The
//! lookup script decodes the padded stream and never reads past the real end
//! of the data, so the padding is not stripped on decode.

const ALPHABET: &[u8; 85] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz!#$%&()*+-;<=>?@^_`{|}~";

/// Encode `data` as padded base85 text
pub fn encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len().div_ceil(4) * 5);
    for chunk in data.chunks(4) {
        let mut group = [0u8; 4];
        group[..chunk.len()].copy_from_slice(chunk);
        let mut value = u32::from_be_bytes(group);

        let mut digits = [0u8; 5];
        for digit in digits.iter_mut().rev() {
            *digit = ALPHABET[(value % 85) as usize];
            value /= 85;
        }
        out.extend(digits.iter().map(|&d| d as char));
    }
    out
}

fn digit_value(c: u8) -> Option<u32> {
    ALPHABET.iter().position(|&a| a == c).map(|p| p as u32)
}

/// Decode padded base85 text. Returns `None` on a length that is not a
/// multiple of five, a character outside the alphabet or a group overflow.
pub fn decode(text: &str) -> Option<Vec<u8>> {
    let bytes = text.as_bytes();
    if bytes.len() % 5 != 0 {
        return None;
    }

    let mut out = Vec::with_capacity(bytes.len() / 5 * 4);
    for group in bytes.chunks(5) {
        let mut value: u64 = 0;
        for &c in group {
            value = value * 85 + digit_value(c)? as u64;
        }
        let value = u32::try_from(value).ok()?;
        out.extend_from_slice(&value.to_be_bytes());
    }
    Some(out)
}
