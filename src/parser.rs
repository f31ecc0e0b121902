use crate::error::Error;
use crate::frame::{Frame, OpCode};
use bytes::{Buf, BytesMut};

/// A restartable, streaming RFC 6455 frame parser.
///
/// The parser owns no I/O; it only drains a [`BytesMut`] that the caller
/// (the connection protocol) fills from the transport. `parse` consumes as
/// many complete frames as the buffer currently holds and stops cleanly the
/// moment it would need more bytes than are available, leaving the
/// unconsumed prefix in the buffer verbatim. Bytes are only ever removed
/// from `buf` once an entire frame — header, optional mask key, and
/// payload — has been decoded, so a caller that feeds the same byte stream
/// in arbitrarily different chunk sizes always observes the same sequence
/// of decoded frames.
pub struct FrameParser {
    need_mask: bool,
    max_frame_size: Option<u64>,
}

impl FrameParser {
    /// `need_mask` is always `true` for server-side connections per RFC
    /// 6455 §5.1: every frame a server receives from a client must be
    /// masked.
    pub fn new(need_mask: bool, max_frame_size: Option<u64>) -> Self {
        Self { need_mask, max_frame_size }
    }

    /// Drains every complete frame currently sitting in `buf`.
    pub fn parse(&self, buf: &mut BytesMut) -> Result<Vec<Frame>, Error> {
        let mut frames = Vec::new();
        while let Some(frame) = self.parse_one(buf)? {
            frames.push(frame);
        }
        Ok(frames)
    }

    /// Decodes at most one frame. Returns `Ok(None)` when `buf` doesn't yet
    /// hold a complete frame — the exact cut points required by the wire
    /// format (after 0/1 header bytes, mid extended-length, mid mask key,
    /// mid payload, ...) all fall out of the bounds checks below, each
    /// returning before anything is removed from `buf`.
    fn parse_one(&self, buf: &mut BytesMut) -> Result<Option<Frame>, Error> {
        if buf.len() < 2 {
            return Ok(None);
        }

        let first = buf[0];
        let second = buf[1];

        let fin = first & 0b1000_0000 != 0;
        let rsv1 = first & 0b0100_0000 != 0;
        let rsv2 = first & 0b0010_0000 != 0;
        let rsv3 = first & 0b0001_0000 != 0;
        if rsv1 || rsv2 || rsv3 {
            return Err(Error::ReservedFlag(first));
        }

        let opcode = OpCode::from_u8(first & 0b0000_1111)?;

        if !fin && opcode.is_control() {
            return Err(Error::ControlFramesFragmented);
        }

        let masked = second & 0b1000_0000 != 0;
        let len7 = second & 0b0111_1111;

        if opcode.is_control() && len7 > 125 {
            return Err(Error::ControlFramePayloadSize);
        }

        if opcode == OpCode::Close && len7 == 1 {
            return Err(Error::InvalidClosePayload);
        }

        if self.need_mask && !masked {
            return Err(Error::MaskingViolation);
        }

        let mut offset = 2usize;

        let payload_len: u64 = match len7 {
            0..=125 => len7 as u64,
            126 => {
                if buf.len() < offset + 2 {
                    return Ok(None);
                }
                let len = u16::from_be_bytes([buf[offset], buf[offset + 1]]) as u64;
                offset += 2;
                len
            }
            127 => {
                if buf.len() < offset + 8 {
                    return Ok(None);
                }
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&buf[offset..offset + 8]);
                // RFC 6455 §5.2: the most significant bit of the 64-bit
                // length must be zero.
                if raw[0] & 0x80 != 0 {
                    return Err(Error::InvalidPayloadLength);
                }
                let len = u64::from_be_bytes(raw);
                offset += 8;
                len
            }
            _ => unreachable!("7-bit field can't exceed 127"),
        };

        if let Some(max) = self.max_frame_size {
            if payload_len > max {
                return Err(Error::MaxFrameSize);
            }
        }

        let mask_key = if masked {
            if buf.len() < offset + 4 {
                return Ok(None);
            }
            let mut key = [0u8; 4];
            key.copy_from_slice(&buf[offset..offset + 4]);
            offset += 4;
            Some(key)
        } else {
            None
        };

        let payload_len = payload_len as usize;
        if buf.len() < offset + payload_len {
            return Ok(None);
        }

        // Only now that the whole frame is known to be present do we
        // atomically remove it from the buffer.
        buf.advance(offset);
        let mut payload = buf.split_to(payload_len).to_vec();

        if let Some(key) = mask_key {
            crate::mask::apply_mask(&mut payload, key);
        }

        Ok(Some(Frame::new(fin, opcode, payload)))
    }
}
