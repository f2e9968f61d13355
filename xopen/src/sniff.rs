use crate::buffer::BufferedStream;
use crate::compression::gzip;
use std::io::{self, Read};

/// Checks whether the stream starts with `signature` without consuming it.
///
/// Input shorter than the signature, including empty input, is not a match.
/// Other I/O errors are returned.
pub fn looks_like<R: Read>(r: &mut BufferedStream<R>, signature: &[u8]) -> io::Result<bool> {
    let head = r.peek(signature.len())?;
    Ok(head == signature)
}

pub fn is_gzip<R: Read>(r: &mut BufferedStream<R>) -> io::Result<bool> {
    looks_like(r, gzip::MAGIC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gz_from(data: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    fn sniff(data: &[u8]) -> (bool, Vec<u8>) {
        let mut b = BufferedStream::with_capacity(64, data);
        let is = is_gzip(&mut b).unwrap();
        let mut rest = Vec::new();
        b.read_to_end(&mut rest).unwrap();
        (is, rest)
    }

    #[test]
    fn test_is_gzip() {
        assert_eq!(sniff(b"asdf"), (false, b"asdf".to_vec()));

        let gz = gz_from(b"asdf");
        assert_eq!(sniff(&gz), (true, gz.clone()));
    }

    #[test]
    fn test_near_miss() {
        assert!(!sniff(&[0x1f, 0x8c, 0x00]).0);
        assert!(!sniff(&[0x8b, 0x1f]).0);
    }

    #[test]
    fn test_empty_input_is_not_gzip() {
        assert_eq!(sniff(b""), (false, Vec::new()));
    }

    #[test]
    fn test_short_input_is_not_gzip() {
        // A lone first magic byte must not count as a match either.
        assert_eq!(sniff(&[0x1f]), (false, vec![0x1f]));
        assert_eq!(sniff(b"a"), (false, b"a".to_vec()));
    }

    #[test]
    fn test_read_error_propagates() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::ConnectionReset, "boom"))
            }
        }

        let mut b = BufferedStream::with_capacity(16, Broken);
        let err = is_gzip(&mut b).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
    }

    #[test]
    fn test_longer_signature() {
        let mut b = BufferedStream::with_capacity(16, &b"#!/bin/sh\necho"[..]);
        assert!(looks_like(&mut b, b"#!/bin/sh").unwrap());
        assert!(!looks_like(&mut b, b"#!/bin/bash").unwrap());
    }
}
