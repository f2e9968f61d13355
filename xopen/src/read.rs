use crate::buffer::BufferedStream;
use crate::compression::{self, close_quietly, Buffered, Decompressor};
use crate::error::Result;
use crate::options::Options;
use crate::sniff;
use crate::source::{open_source, NoClose, Source};
use log::debug;
use std::fmt;
use std::io::{self, BufRead, Read};

enum Inner {
    Plain(Buffered),
    Decompressed(BufferedStream<Box<dyn Decompressor>>),
}

/// A buffered input that decompresses gzip data transparently.
///
/// Owns the raw stream and the decoder in front of it. `close` releases the
/// decoder first and the raw stream second. Dropping a `Reader` without
/// closing it still frees its handles but swallows any error.
pub struct Reader {
    inner: Inner,
}

impl Reader {
    pub fn new(source: Box<dyn Source>, opts: &Options) -> Result<Self> {
        let mut b = BufferedStream::with_capacity(opts.buffer_size, source);
        let df = compression::gzip_decompressor_factory(opts);

        let matched = match sniff::looks_like(&mut b, df.magic()) {
            Ok(matched) => matched,
            Err(err) => {
                close_quietly(b.into_inner());
                return Err(err.into());
            }
        };

        if !matched {
            return Ok(Self {
                inner: Inner::Plain(b),
            });
        }

        debug!("decompressing with {}", df.name());
        let dc = df.create_decompressor(b)?;
        Ok(Self {
            inner: Inner::Decompressed(BufferedStream::with_capacity(opts.buffer_size, dc)),
        })
    }

    /// Wraps a reader that has nothing to close, such as an in-memory buffer.
    pub fn from_read<R: Read + Send + 'static>(r: R, opts: &Options) -> Result<Self> {
        Self::new(Box::new(NoClose(r)), opts)
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self.inner, Inner::Decompressed(_))
    }

    /// Releases the decoder (if any), then the raw stream.
    pub fn close(self) -> io::Result<()> {
        let raw = match self.inner {
            Inner::Plain(b) => b,
            Inner::Decompressed(b) => b.into_inner().finish()?,
        };

        debug!("closing input");
        raw.into_inner().close()
    }
}

impl Read for Reader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            Inner::Plain(b) => b.read(buf),
            Inner::Decompressed(b) => b.read(buf),
        }
    }
}

impl BufRead for Reader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match &mut self.inner {
            Inner::Plain(b) => b.fill_buf(),
            Inner::Decompressed(b) => b.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match &mut self.inner {
            Inner::Plain(b) => b.consume(amt),
            Inner::Decompressed(b) => b.consume(amt),
        }
    }
}

impl fmt::Debug for Reader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Reader")
            .field("compressed", &self.is_compressed())
            .finish()
    }
}

/// Opens a file, `-` (piped stdin), `|command args` or an http(s) URL for
/// buffered reading, decompressing gzip input.
pub fn ropen(name: &str) -> Result<Reader> {
    ropen_with(name, &Options::default())
}

pub fn ropen_with(name: &str, opts: &Options) -> Result<Reader> {
    let source = open_source(name)?;
    let reader = Reader::new(source, opts)?;
    debug!(
        "opened {} for reading ({})",
        name,
        if reader.is_compressed() { "gzip" } else { "plain" }
    );
    Ok(reader)
}
