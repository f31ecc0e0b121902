#![no_main]

use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use socket_flow::parser::FrameParser;

// Feeds arbitrary bytes straight into the frame parser. The parser must
// never panic: every malformed input is either a clean "not enough bytes
// yet" (no frames, `Ok`) or a typed `Error`.
fuzz_target!(|data: &[u8]| {
    let parser = FrameParser::new(true, Some(64 << 20));
    let mut buf = BytesMut::from(data);
    let _ = parser.parse(&mut buf);
});
