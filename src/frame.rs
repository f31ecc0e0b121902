use crate::error::Error;

/// The default close code this crate reports for a CLOSE frame with an
/// empty payload. The core never synthesizes any other close code.
pub const DEFAULT_CLOSE_CODE: u16 = 1000;
pub const DEFAULT_CLOSE_REASON: &str = "No reason given";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    Continue,
    Text,
    Binary,
    Close,
    Ping,
    Pong,
}

impl OpCode {
    pub fn from_u8(byte: u8) -> Result<Self, Error> {
        match byte {
            0x0 => Ok(OpCode::Continue),
            0x1 => Ok(OpCode::Text),
            0x2 => Ok(OpCode::Binary),
            0x8 => Ok(OpCode::Close),
            0x9 => Ok(OpCode::Ping),
            0xA => Ok(OpCode::Pong),
            other => Err(Error::UnknownOpcode(other)),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            OpCode::Continue => 0x0,
            OpCode::Text => 0x1,
            OpCode::Binary => 0x2,
            OpCode::Close => 0x8,
            OpCode::Ping => 0x9,
            OpCode::Pong => 0xA,
        }
    }

    /// Per RFC 6455 §5.5, control frames are CLOSE, PING and PONG: they
    /// can't be fragmented and their payload is capped at 125 bytes.
    pub fn is_control(&self) -> bool {
        matches!(self, OpCode::Close | OpCode::Ping | OpCode::Pong)
    }
}

/// A decoded WebSocket frame, as produced by the parser and consumed by the
/// builder. For `Close` frames, `payload` is the raw wire bytes; use
/// [`decode_close_payload`] to get at the `(code, reason)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub fin: bool,
    pub opcode: OpCode,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(fin: bool, opcode: OpCode, payload: Vec<u8>) -> Self {
        Self { fin, opcode, payload }
    }
}

/// Decodes a CLOSE frame's payload into `(code, reason)`.
///
/// An empty payload decodes as `(1000, "No reason given")`. A payload of
/// length 1 is malformed (the code itself is two bytes); the parser rejects
/// it with `Error::InvalidClosePayload` before a `Frame` is ever produced,
/// but this function checks again rather than trust that invariant across
/// its own boundary.
pub fn decode_close_payload(payload: &[u8]) -> Result<(u16, String), Error> {
    if payload.is_empty() {
        return Ok((DEFAULT_CLOSE_CODE, DEFAULT_CLOSE_REASON.to_string()));
    }
    if payload.len() == 1 {
        return Err(Error::InvalidClosePayload);
    }
    let code = u16::from_be_bytes([payload[0], payload[1]]);
    let reason = String::from_utf8(payload[2..].to_vec())?;
    Ok((code, reason))
}

/// Encodes a `(code, reason)` pair into a CLOSE frame payload.
pub fn encode_close_payload(code: u16, reason: &str) -> Vec<u8> {
    let mut payload = Vec::with_capacity(2 + reason.len());
    payload.extend_from_slice(&code.to_be_bytes());
    payload.extend_from_slice(reason.as_bytes());
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_round_trips() {
        for byte in [0x0, 0x1, 0x2, 0x8, 0x9, 0xA] {
            let op = OpCode::from_u8(byte).unwrap();
            assert_eq!(op.as_u8(), byte);
        }
    }

    #[test]
    fn opcode_rejects_unknown_values() {
        let err = OpCode::from_u8(0xF).unwrap_err();
        assert_eq!(err.to_string(), "Unknown opcode 15 in frame");
    }

    #[test]
    fn control_opcodes_are_marked_control() {
        assert!(OpCode::Close.is_control());
        assert!(OpCode::Ping.is_control());
        assert!(OpCode::Pong.is_control());
        assert!(!OpCode::Text.is_control());
        assert!(!OpCode::Binary.is_control());
        assert!(!OpCode::Continue.is_control());
    }

    #[test]
    fn empty_close_payload_decodes_to_default() {
        let (code, reason) = decode_close_payload(&[]).unwrap();
        assert_eq!(code, 1000);
        assert_eq!(reason, "No reason given");
    }

    #[test]
    fn one_byte_close_payload_is_rejected() {
        let err = decode_close_payload(&[0xff]).unwrap_err();
        assert!(matches!(err, Error::InvalidClosePayload));
    }

    #[test]
    fn close_payload_round_trips_code_and_reason() {
        let payload = encode_close_payload(1000, "No reason");
        let (code, reason) = decode_close_payload(&payload).unwrap();
        assert_eq!(code, 1000);
        assert_eq!(reason, "No reason");
    }
}
