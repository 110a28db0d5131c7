// Identifier and timestamp helpers shared by the domain models

use chrono::Utc;
use uuid::Uuid;

/// Length of every identifier produced by [`new_id`]
pub const ID_LENGTH: usize = 26;

const ENCODING: &[u8; 32] = b"ybndrfg8ejkmcpqxot1uwisza345h769";

/// Generates a new 26 character identifier
///
/// A random v4 UUID is base32 encoded with a URL-safe, lowercase alphabet
/// and the padding is dropped.
///
/// # Example
/// ```
/// use platform_store::domain::ids::{new_id, ID_LENGTH};
///
/// assert_eq!(new_id().len(), ID_LENGTH);
/// ```
pub fn new_id() -> String {
    encode_id(Uuid::new_v4().as_bytes())
}

/// Current time in milliseconds since the Unix epoch
pub fn get_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn encode_id(bytes: &[u8; 16]) -> String {
    let mut out = String::with_capacity(ID_LENGTH);
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;

    for byte in bytes {
        buffer = (buffer << 8) | u32::from(*byte);
        bits += 8;

        while bits >= 5 {
            bits -= 5;
            out.push(ENCODING[((buffer >> bits) & 0x1f) as usize] as char);
        }
        buffer &= (1 << bits) - 1;
    }

    if bits > 0 {
        out.push(ENCODING[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }

    out
}
