use std::cmp::min;
use std::fmt;
use std::io::{self, BufRead, Read};

/// A fixed-capacity read buffer that can look ahead without consuming.
///
/// Unlike `std::io::BufReader`, `peek` keeps pulling from the inner reader
/// until the requested number of bytes is buffered, so a pipe that hands out
/// one byte at a time still gets sniffed correctly.
pub struct BufferedStream<R> {
    inner: R,
    buf: Box<[u8]>,
    pos: usize,
    filled: usize,
}

impl<R: Read> BufferedStream<R> {
    pub fn with_capacity(capacity: usize, inner: R) -> Self {
        Self {
            inner,
            buf: vec![0u8; capacity.max(1)].into_boxed_slice(),
            pos: 0,
            filled: 0,
        }
    }

    /// Returns the inner reader. Any buffered bytes are lost.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Returns the next `n` bytes without consuming them. The returned slice is
    /// shorter than `n` only when the inner reader hit end-of-data first.
    pub fn peek(&mut self, n: usize) -> io::Result<&[u8]> {
        if n > self.buf.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot peek {} bytes with a {} byte buffer", n, self.buf.len()),
            ));
        }

        if self.filled - self.pos < n {
            if self.pos + n > self.buf.len() {
                self.buf.copy_within(self.pos..self.filled, 0);
                self.filled -= self.pos;
                self.pos = 0;
            }

            while self.filled - self.pos < n {
                match self.inner.read(&mut self.buf[self.filled..]) {
                    Ok(0) => break,
                    Ok(count) => self.filled += count,
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                    Err(err) => return Err(err),
                }
            }
        }

        let end = min(self.pos + n, self.filled);
        Ok(&self.buf[self.pos..end])
    }
}

impl<R: Read> Read for BufferedStream<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        // Large reads on an empty buffer skip the copy.
        if self.pos == self.filled && out.len() >= self.buf.len() {
            return self.inner.read(out);
        }

        let avail = self.fill_buf()?;
        let count = min(avail.len(), out.len());
        out[..count].copy_from_slice(&avail[..count]);
        self.consume(count);
        Ok(count)
    }
}

impl<R: Read> BufRead for BufferedStream<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        if self.pos >= self.filled {
            let count = self.inner.read(&mut self.buf)?;
            self.pos = 0;
            self.filled = count;
        }

        Ok(&self.buf[self.pos..self.filled])
    }

    fn consume(&mut self, amt: usize) {
        self.pos = min(self.pos + amt, self.filled);
    }
}

impl<R> fmt::Debug for BufferedStream<R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("BufferedStream")
            .field("capacity", &self.buf.len())
            .field("buffered", &(self.filled - self.pos))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out at most one byte per read, like a slow pipe.
    struct Trickle<'a>(&'a [u8]);

    impl<'a> Read for Trickle<'a> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.0.is_empty() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.0[0];
            self.0 = &self.0[1..];
            Ok(1)
        }
    }

    #[test]
    fn peek_does_not_consume() {
        let mut b = BufferedStream::with_capacity(8, &b"hello world"[..]);
        assert_eq!(b.peek(2).unwrap(), b"he");
        assert_eq!(b.peek(5).unwrap(), b"hello");

        let mut s = String::new();
        b.read_to_string(&mut s).unwrap();
        assert_eq!(s, "hello world");
    }

    #[test]
    fn peek_gathers_short_reads() {
        let mut b = BufferedStream::with_capacity(16, Trickle(b"abcdef"));
        assert_eq!(b.peek(4).unwrap(), b"abcd");
        assert_eq!(b.fill_buf().unwrap(), b"abcd");
    }

    #[test]
    fn peek_past_end_is_short() {
        let mut b = BufferedStream::with_capacity(16, &b"x"[..]);
        assert_eq!(b.peek(2).unwrap(), b"x");
        let mut b = BufferedStream::with_capacity(16, &b""[..]);
        assert_eq!(b.peek(2).unwrap(), b"");
    }

    #[test]
    fn peek_compacts_near_end_of_buffer() {
        let mut b = BufferedStream::with_capacity(4, Trickle(b"0123456789"));
        let mut two = [0u8; 3];
        b.peek(4).unwrap();
        b.read_exact(&mut two).unwrap();
        assert_eq!(&two, b"012");
        assert_eq!(b.peek(4).unwrap(), b"3456");

        let mut rest = Vec::new();
        b.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"3456789");
    }

    #[test]
    fn peek_larger_than_capacity_fails() {
        let mut b = BufferedStream::with_capacity(2, &b"abc"[..]);
        let err = b.peek(3).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
