use crate::error::Error;

const MAX_HEADERS: usize = 64;

/// A parsed HTTP request line plus headers, as seen by the handshake
/// validator. Parsing is a pure function over whatever bytes have arrived
/// so far on the transport — it never itself reads from the network — so
/// the HTTP layer can keep accumulating bytes across multiple reads before
/// a full request line is available, the same streaming posture as the
/// frame parser.
#[derive(Debug, Clone)]
pub struct HandshakeRequest {
    pub method: String,
    pub path: String,
    headers: Vec<(String, String)>,
}

impl HandshakeRequest {
    /// Attempts to parse one HTTP request out of the front of `buf`.
    ///
    /// Returns `Ok(None)` if `buf` doesn't yet contain a full request line
    /// and header block (no terminating blank line), mirroring
    /// [`crate::parser::FrameParser`]'s "not enough bytes yet" contract.
    /// On success, also returns the number of bytes the request consumed,
    /// so the caller can advance its own buffer past the header block
    /// (the body, if any, is the caller's concern — the handshake itself
    /// never has one).
    pub fn parse(buf: &[u8]) -> Result<Option<(Self, usize)>, Error> {
        let mut header_storage = [httparse::EMPTY_HEADER; MAX_HEADERS];
        let mut raw = httparse::Request::new(&mut header_storage);

        let consumed = match raw.parse(buf)? {
            httparse::Status::Partial => return Ok(None),
            httparse::Status::Complete(n) => n,
        };

        let method = raw.method.ok_or(Error::MalformedHttpRequest)?.to_string();
        let path = raw.path.ok_or(Error::MalformedHttpRequest)?.to_string();
        let headers = raw
            .headers
            .iter()
            .map(|h| (h.name.to_string(), String::from_utf8_lossy(h.value).into_owned()))
            .collect();

        Ok(Some((Self { method, path, headers }, consumed)))
    }

    /// Case-insensitive header lookup, as RFC 7230 §3.2 requires.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether `name`'s value, read as a comma-separated list (as
    /// `Connection` and `Upgrade` are), contains `token` case-insensitively.
    /// Handles the common `Connection: keep-alive, Upgrade` shape.
    pub fn header_has_token(&self, name: &str, token: &str) -> bool {
        self.header(name)
            .map(|value| value.split(',').any(|t| t.trim().eq_ignore_ascii_case(token)))
            .unwrap_or(false)
    }
}
