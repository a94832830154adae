//! Framed codec for GTP exchanges.
//!
//! GTP is line-oriented: a request is a single newline-terminated line, a
//! response is zero or more lines followed by a blank line. The codec frames
//! on the blank-line terminator and works over any AsyncRead/AsyncWrite
//! (pipes, sockets), regardless of read granularity.

use std::io;

use tokio_util::bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

/// Codec framing requests as newline-terminated lines and responses as
/// blank-line-terminated text blocks.
///
/// A peer that emits a literal blank line mid-payload is indistinguishable
/// from end-of-frame; that is an inherent property of the wire protocol and
/// is preserved here.
#[derive(Debug, Default)]
pub struct GtpCodec {
    // Index up to which the buffer has already been scanned for a terminator.
    next_index: usize,
}

impl GtpCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for GtpCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Back up one byte so a terminator split across reads is still seen.
        let search_from = self.next_index.saturating_sub(1);
        match src[search_from..].windows(2).position(|w| w == b"\n\n") {
            Some(pos) => {
                let end = search_from + pos;
                let frame = src.split_to(end + 2);
                self.next_index = 0;
                let payload = std::str::from_utf8(&frame[..end])
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                Ok(Some(payload.to_string()))
            }
            None => {
                self.next_index = src.len();
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() => Ok(None),
            None => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stream closed before response terminator",
            )),
        }
    }
}

impl Encoder<String> for GtpCodec {
    type Error = io::Error;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(line.len() + 1);
        dst.extend_from_slice(line.as_bytes());
        if !line.ends_with('\n') {
            dst.extend_from_slice(b"\n");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(line: &str) -> BytesMut {
        let mut codec = GtpCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(line.to_string(), &mut buf).unwrap();
        buf
    }

    #[test]
    fn encode_appends_missing_newline() {
        assert_eq!(&encoded("genmove b")[..], b"genmove b\n");
    }

    #[test]
    fn encode_is_idempotent_on_terminated_lines() {
        assert_eq!(&encoded("genmove b\n")[..], b"genmove b\n");
    }

    #[test]
    fn decode_waits_for_blank_line() {
        let mut codec = GtpCodec::new();
        let mut buf = BytesMut::from(&b"= D4\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(b"\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("= D4".to_string()));
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_returns_bytes_preceding_the_terminator() {
        let mut codec = GtpCodec::new();
        let mut buf = BytesMut::from(&b"= A\nB\nC\n\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("= A\nB\nC".to_string()));
    }

    #[test]
    fn decode_handles_terminator_split_across_chunks() {
        let mut codec = GtpCodec::new();
        let mut buf = BytesMut::new();
        for chunk in [&b"= PA"[..], b"SS\n", b"\n"] {
            buf.extend_from_slice(chunk);
            if let Some(frame) = codec.decode(&mut buf).unwrap() {
                assert_eq!(frame, "= PASS");
                return;
            }
        }
        panic!("terminator never recognized");
    }

    #[test]
    fn decode_blank_line_alone_is_an_empty_frame() {
        let mut codec = GtpCodec::new();
        let mut buf = BytesMut::from(&b"\n\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(String::new()));
    }

    #[test]
    fn eof_with_partial_frame_is_an_error() {
        let mut codec = GtpCodec::new();
        let mut buf = BytesMut::from(&b"= D4\n"[..]);
        let err = codec.decode_eof(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn eof_with_empty_buffer_ends_the_stream() {
        let mut codec = GtpCodec::new();
        let mut buf = BytesMut::new();
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
    }
}
