use crate::frame::OpCode;
use crate::mask::apply_mask;
use bytes::BytesMut;

/// Builds the byte sequence that [`crate::parser::FrameParser::parse`] would
/// decode back to `(opcode, payload, fin)`.
///
/// The length field is always encoded in the shortest form RFC 6455 allows
/// for `payload.len()`: inline for `< 126`, the 2-byte extended form for
/// `<= 65535`, the 8-byte form otherwise. The MASK bit is set, and the key
/// emitted, iff `mask` is `Some`; servers never mask outbound frames (RFC
/// 6455 §5.1), so `send_frame` always calls this with `mask: None`. The
/// `mask` parameter exists for builder-level completeness and is exercised
/// directly in the frame-codec tests.
pub fn build_frame(opcode: OpCode, payload: &[u8], fin: bool, mask: Option<[u8; 4]>) -> BytesMut {
    let mut out = BytesMut::with_capacity(payload.len() + 14);

    let first_byte = (fin as u8) << 7 | opcode.as_u8();
    out.extend_from_slice(&[first_byte]);

    let len = payload.len();
    let mask_bit = if mask.is_some() { 0x80 } else { 0x00 };

    if len <= 125 {
        out.extend_from_slice(&[mask_bit | len as u8]);
    } else if len <= 0xFFFF {
        out.extend_from_slice(&[mask_bit | 126]);
        out.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        out.extend_from_slice(&[mask_bit | 127]);
        out.extend_from_slice(&(len as u64).to_be_bytes());
    }

    match mask {
        Some(key) => {
            out.extend_from_slice(&key);
            let mut masked = payload.to_vec();
            apply_mask(&mut masked, key);
            out.extend_from_slice(&masked);
        }
        None => out.extend_from_slice(payload),
    }

    out
}
