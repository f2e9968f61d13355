use crate::compression::Encoder;
use crate::error::Result;
use crate::options::Options;
use crate::source::{create_sink, Sink};
use log::debug;
use std::fmt;
use std::io::{self, BufWriter, Write};

/// A buffered output, gzip-compressed when created for a `.gz` name.
///
/// `flush` drains the buffer into the encoder, then flushes the encoder into
/// the destination. `close` flushes, writes the gzip trailer and closes
/// the destination. Data is only guaranteed to be complete after `close`.
pub struct Writer {
    w: BufWriter<Encoder>,
}

impl Writer {
    pub fn new(sink: Box<dyn Sink>, gzip: bool, opts: &Options) -> Self {
        Self {
            w: BufWriter::with_capacity(opts.buffer_size, Encoder::new(sink, gzip, opts.level)),
        }
    }

    pub fn is_compressed(&self) -> bool {
        self.w.get_ref().is_gzip()
    }

    /// Flushes, finishes the encoder and closes the destination. Every
    /// step runs even if an earlier one failed; the first error is returned.
    pub fn close(mut self) -> io::Result<()> {
        let mut result = self.w.flush();

        // The buffer is empty unless the flush failed, and then it is lost.
        let (encoder, _) = self.w.into_parts();
        match encoder.finish() {
            Ok(sink) => {
                let closed = sink.close();
                if result.is_ok() {
                    result = closed;
                }
            }
            Err(err) => {
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }

        debug!("closed output");
        result
    }
}

impl Write for Writer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.w.write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.w.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.w.flush()
    }
}

impl fmt::Debug for Writer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Writer")
            .field("compressed", &self.is_compressed())
            .field("buffered", &self.w.buffer().len())
            .finish()
    }
}

/// Destinations ending in `.gz` are gzip-compressed.
pub fn wants_gzip(name: &str) -> bool {
    name.ends_with(".gz")
}

/// Opens `name` for buffered writing. `-` is stdout; names ending in `.gz`
/// are gzip-compressed.
pub fn wopen(name: &str) -> Result<Writer> {
    wopen_with(name, &Options::default())
}

pub fn wopen_with(name: &str, opts: &Options) -> Result<Writer> {
    let sink = create_sink(name)?;
    let writer = Writer::new(sink, wants_gzip(name), opts);
    debug!(
        "opened {} for writing ({})",
        name,
        if writer.is_compressed() { "gzip" } else { "plain" }
    );
    Ok(writer)
}
