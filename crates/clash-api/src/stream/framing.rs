// Newline framing for streamed response bodies.
//
// The controller writes one JSON document per line with no other framing.
// Chunks from the socket arrive at arbitrary boundaries, so bytes are
// buffered until a `\n` shows up.

use bytes::{Bytes, BytesMut};
use serde::de::DeserializeOwned;

use crate::error::Error;

/// Upper bound on a single buffered line (1 MiB).
pub(crate) const MAX_LINE_BYTES: usize = 1024 * 1024;

pub(crate) struct LineFramer {
    buf: BytesMut,
    /// Prefix of `buf` already known to contain no newline.
    scanned: usize,
    limit: usize,
}

impl LineFramer {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            scanned: 0,
            limit,
        }
    }

    pub(crate) fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Pop the next complete line, without its terminator.
    pub(crate) fn next_line(&mut self) -> Result<Option<Bytes>, Error> {
        let Some(offset) = self.buf[self.scanned..].iter().position(|&b| b == b'\n') else {
            self.scanned = self.buf.len();
            if self.buf.len() > self.limit {
                return Err(Error::LineTooLong { limit: self.limit });
            }
            return Ok(None);
        };

        let end = self.scanned + offset;
        if end > self.limit {
            return Err(Error::LineTooLong { limit: self.limit });
        }

        let mut line = self.buf.split_to(end + 1);
        line.truncate(end);
        self.scanned = 0;
        Ok(Some(line.freeze()))
    }

    /// Whatever is left once the body has ended without a final newline.
    pub(crate) fn finish(self) -> Option<Bytes> {
        if self.buf.is_empty() {
            None
        } else {
            Some(self.buf.freeze())
        }
    }
}

/// Decode one line. Surrounding whitespace is trimmed; an empty line is a
/// decode failure like any other.
pub(crate) fn decode_line<T: DeserializeOwned>(line: &[u8]) -> Result<T, Error> {
    let trimmed = line.trim_ascii();
    serde_json::from_slice(trimmed)
        .map_err(|e| Error::malformed(&e, String::from_utf8_lossy(trimmed).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Traffic;

    fn drain(framer: &mut LineFramer) -> Vec<Bytes> {
        let mut lines = Vec::new();
        while let Some(line) = framer.next_line().unwrap() {
            lines.push(line);
        }
        lines
    }

    #[test]
    fn lines_split_across_chunks() {
        let mut framer = LineFramer::new(MAX_LINE_BYTES);
        framer.push(b"{\"up\":1,");
        assert!(drain(&mut framer).is_empty());
        framer.push(b"\"down\":2}\n{\"up\":3");
        assert_eq!(drain(&mut framer), vec![Bytes::from_static(b"{\"up\":1,\"down\":2}")]);
        framer.push(b",\"down\":4}\n");
        assert_eq!(drain(&mut framer), vec![Bytes::from_static(b"{\"up\":3,\"down\":4}")]);
        assert!(framer.finish().is_none());
    }

    #[test]
    fn several_lines_in_one_chunk_keep_order() {
        let mut framer = LineFramer::new(MAX_LINE_BYTES);
        framer.push(b"a\nb\r\nc\n");
        let lines = drain(&mut framer);
        assert_eq!(lines.len(), 3);
        assert_eq!(&lines[0][..], b"a");
        assert_eq!(&lines[1][..], b"b\r");
        assert_eq!(&lines[2][..], b"c");
    }

    #[test]
    fn unterminated_tail_is_returned_by_finish() {
        let mut framer = LineFramer::new(MAX_LINE_BYTES);
        framer.push(b"one\ntwo");
        assert_eq!(drain(&mut framer).len(), 1);
        assert_eq!(framer.finish(), Some(Bytes::from_static(b"two")));
    }

    #[test]
    fn oversized_partial_line_fails() {
        let mut framer = LineFramer::new(8);
        framer.push(b"0123456789");
        assert!(matches!(framer.next_line(), Err(Error::LineTooLong { limit: 8 })));
    }

    #[test]
    fn oversized_complete_line_fails() {
        let mut framer = LineFramer::new(4);
        framer.push(b"abc\n0123456789\n");
        assert_eq!(&framer.next_line().unwrap().unwrap()[..], b"abc");
        assert!(matches!(framer.next_line(), Err(Error::LineTooLong { limit: 4 })));
    }

    #[test]
    fn decode_trims_surrounding_whitespace() {
        let traffic: Traffic = decode_line(b"  {\"up\":5,\"down\":6}\r").unwrap();
        assert_eq!(traffic, Traffic { up: 5, down: 6 });
    }

    #[test]
    fn decode_rejects_blank_line() {
        for line in [&b""[..], &b" \r"[..]] {
            match decode_line::<Traffic>(line) {
                Err(Error::MalformedResponse { body, .. }) => assert!(body.is_empty()),
                other => panic!("unexpected result: {other:?}"),
            }
        }
    }

    #[test]
    fn decode_reports_bad_line() {
        let err = decode_line::<Traffic>(b"not json").unwrap_err();
        match err {
            Error::MalformedResponse { body, .. } => assert_eq!(body, "not json"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
