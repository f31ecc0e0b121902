use crate::error::Error;
use crate::request::HandshakeRequest;
use base64::prelude::*;
use sha1::{Digest, Sha1};

const GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Derives the `Sec-WebSocket-Accept` value from the client's
/// `Sec-WebSocket-Key`, per RFC 6455 §1.3: base64 of the SHA-1 of the key
/// concatenated with the protocol GUID.
pub fn accept_token(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(GUID.as_bytes());
    BASE64_STANDARD.encode(hasher.finalize())
}

/// Picks an application subprotocol from the client's offered list. Only
/// consulted when the request carries a `Sec-WebSocket-Protocol` header;
/// returning `None` means none of the candidates are acceptable.
pub type LookupProtocol =
    Box<dyn Fn(&[&str], &HandshakeRequest) -> Option<String> + Send + Sync>;

/// The outcome of a successful handshake validation.
pub struct Validated {
    pub accept: String,
    pub protocol: Option<String>,
}

/// Runs the RFC 6455 §4.2.1 opening-handshake checks a server must make,
/// in the order a reader would expect to find them violated: method,
/// `Upgrade`, `Connection`, key, version, and finally subprotocol
/// negotiation.
pub fn validate(
    request: &HandshakeRequest,
    lookup_protocol: Option<&LookupProtocol>,
) -> Result<Validated, Error> {
    if !request.method.eq_ignore_ascii_case("GET") {
        return Err(Error::InvalidMethod);
    }
    if !request.header_has_token("Upgrade", "websocket") {
        return Err(Error::NoUpgradeHeaderPresent);
    }
    if !request.header_has_token("Connection", "Upgrade") {
        return Err(Error::NoConnectionHeaderPresent);
    }
    let key = request.header("Sec-WebSocket-Key").ok_or(Error::NoSecWebsocketKey)?;
    if request.header("Sec-WebSocket-Version") != Some("13") {
        return Err(Error::UnsupportedVersion);
    }

    let protocol = match request.header("Sec-WebSocket-Protocol") {
        Some(offered) => {
            let candidates: Vec<&str> = offered.split(',').map(str::trim).collect();
            let chosen = lookup_protocol
                .and_then(|lookup| lookup(&candidates, request))
                .ok_or(Error::NoProtocol)?;
            Some(chosen)
        }
        None => None,
    };

    Ok(Validated { accept: accept_token(key), protocol })
}

/// Builds the `101 Switching Protocols` response for a validated request.
pub fn switching_protocols_response(accept: &str, protocol: Option<&str>) -> String {
    let mut response = format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {accept}\r\n"
    );
    if let Some(protocol) = protocol {
        response.push_str(&format!("Sec-WebSocket-Protocol: {protocol}\r\n"));
    }
    response.push_str("\r\n");
    response
}

/// Builds the plain HTTP rejection for a validation failure. Every case
/// other than an unsupported version or a protocol-negotiation failure
/// gets a bare 400: the handshake doesn't try to explain which header was
/// wrong, matching the RFC's "just refuse" posture for opening-handshake
/// violations.
pub fn rejection_response(error: &Error) -> String {
    match error {
        Error::UnsupportedVersion => {
            "HTTP/1.1 400 Bad Request\r\nSec-WebSocket-Version: 13\r\n\r\n".to_string()
        }
        Error::NoProtocol | Error::NoApplicationProtocol => {
            "HTTP/1.1 502 Bad Gateway\r\n\r\n".to_string()
        }
        _ => "HTTP/1.1 400 Bad Request\r\n\r\n".to_string(),
    }
}

/// Mirrors Twisted's `WebSocketsResource`: a WebSocket endpoint is a leaf,
/// not a hierarchical HTTP resource. Attaching or looking up a child is a
/// programming error in the server that embeds this resource, not a
/// runtime condition to recover from.
pub struct Resource {
    lookup_protocol: Option<LookupProtocol>,
}

impl Resource {
    pub fn new(lookup_protocol: Option<LookupProtocol>) -> Self {
        Self { lookup_protocol }
    }

    pub fn validate(&self, request: &HandshakeRequest) -> Result<Validated, Error> {
        validate(request, self.lookup_protocol.as_ref())
    }

    pub fn put_child(&mut self, _path: &str, _child: ()) {
        panic!("WebSocket resources do not support child resources");
    }

    pub fn get_child_with_default(&self, _path: &str, _request: &HandshakeRequest) -> ! {
        panic!("WebSocket resources do not support child resources");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(extra_headers: &str) -> HandshakeRequest {
        let raw = format!(
            "GET /chat HTTP/1.1\r\n\
             Host: example.com\r\n\
             Upgrade: websocket\r\n\
             Connection: Upgrade\r\n\
             Sec-WebSocket-Version: 13\r\n\
             {extra_headers}\r\n"
        );
        HandshakeRequest::parse(raw.as_bytes()).unwrap().unwrap().0
    }

    #[test]
    fn accept_token_matches_rfc_sample() {
        assert_eq!(
            accept_token("dGhlIHNhbXBsZSBub25jZQ=="),
            "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
        );
    }

    #[test]
    fn accept_token_matches_secure_key() {
        assert_eq!(accept_token("secure"), "oYBv54i42V5dw6KnZqOFroecUTc=");
    }

    #[test]
    fn validates_a_well_formed_request() {
        let req = request("Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n");
        let validated = validate(&req, None).unwrap();
        assert_eq!(validated.accept, "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");
        assert!(validated.protocol.is_none());
    }

    #[test]
    fn rejects_missing_key() {
        let req = request("");
        assert!(matches!(validate(&req, None), Err(Error::NoSecWebsocketKey)));
    }

    #[test]
    fn rejects_wrong_version() {
        let raw = "GET /chat HTTP/1.1\r\n\
             Host: example.com\r\n\
             Upgrade: websocket\r\n\
             Connection: Upgrade\r\n\
             Sec-WebSocket-Version: 8\r\n\
             Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\r\n";
        let req = HandshakeRequest::parse(raw.as_bytes()).unwrap().unwrap().0;
        let err = validate(&req, None).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion));
        assert_eq!(
            rejection_response(&err),
            "HTTP/1.1 400 Bad Request\r\nSec-WebSocket-Version: 13\r\n\r\n"
        );
    }

    #[test]
    fn rejects_missing_upgrade_header() {
        let raw = "GET /chat HTTP/1.1\r\n\
             Host: example.com\r\n\
             Connection: Upgrade\r\n\
             Sec-WebSocket-Version: 13\r\n\
             Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\r\n";
        let req = HandshakeRequest::parse(raw.as_bytes()).unwrap().unwrap().0;
        assert!(matches!(validate(&req, None), Err(Error::NoUpgradeHeaderPresent)));
    }

    #[test]
    fn rejects_post_method() {
        let raw = "POST /chat HTTP/1.1\r\n\
             Host: example.com\r\n\
             Upgrade: websocket\r\n\
             Connection: Upgrade\r\n\
             Sec-WebSocket-Version: 13\r\n\
             Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\r\n";
        let req = HandshakeRequest::parse(raw.as_bytes()).unwrap().unwrap().0;
        assert!(matches!(validate(&req, None), Err(Error::InvalidMethod)));
    }

    #[test]
    fn negotiates_subprotocol_when_offered_and_lookup_present() {
        let raw = "GET /chat HTTP/1.1\r\n\
             Host: example.com\r\n\
             Upgrade: websocket\r\n\
             Connection: Upgrade\r\n\
             Sec-WebSocket-Version: 13\r\n\
             Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
             Sec-WebSocket-Protocol: chat, superchat\r\n\r\n";
        let req = HandshakeRequest::parse(raw.as_bytes()).unwrap().unwrap().0;
        let lookup: LookupProtocol =
            Box::new(|candidates, _req| candidates.iter().find(|c| **c == "superchat").map(|s| s.to_string()));
        let validated = validate(&req, Some(&lookup)).unwrap();
        assert_eq!(validated.protocol.as_deref(), Some("superchat"));
    }

    #[test]
    fn offered_protocol_with_no_lookup_hook_fails_negotiation() {
        let raw = "GET /chat HTTP/1.1\r\n\
             Host: example.com\r\n\
             Upgrade: websocket\r\n\
             Connection: Upgrade\r\n\
             Sec-WebSocket-Version: 13\r\n\
             Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
             Sec-WebSocket-Protocol: chat\r\n\r\n";
        let req = HandshakeRequest::parse(raw.as_bytes()).unwrap().unwrap().0;
        let err = validate(&req, None).unwrap_err();
        assert!(matches!(err, Error::NoProtocol));
        assert_eq!(rejection_response(&err), "HTTP/1.1 502 Bad Gateway\r\n\r\n");
    }

    #[test]
    fn switching_protocols_response_includes_protocol_when_negotiated() {
        let response = switching_protocols_response("abc123", Some("chat"));
        assert!(response.starts_with("HTTP/1.1 101 Switching Protocols\r\n"));
        assert!(response.contains("Sec-WebSocket-Accept: abc123\r\n"));
        assert!(response.contains("Sec-WebSocket-Protocol: chat\r\n"));
        assert!(response.ends_with("\r\n\r\n"));
    }

    #[test]
    #[should_panic]
    fn resource_put_child_panics() {
        let mut resource = Resource::new(None);
        resource.put_child("foo", ());
    }

    #[test]
    #[should_panic]
    fn resource_get_child_with_default_panics() {
        let resource = Resource::new(None);
        let req = request("Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n");
        resource.get_child_with_default("foo", &req);
    }
}
