#![no_main]

use libfuzzer_sys::fuzz_target;
use socket_flow::handshake::validate;
use socket_flow::request::HandshakeRequest;

// Feeds arbitrary bytes as a raw HTTP request through request parsing and
// handshake validation. Neither step should ever panic on malformed input.
fuzz_target!(|data: &[u8]| {
    if let Ok(Some((request, _))) = HandshakeRequest::parse(data) {
        let _ = validate(&request, None);
    }
});
