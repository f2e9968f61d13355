use crate::source::Sink;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{self, Write};

/// The stage between a writer's buffer and its destination.
pub enum Encoder {
    Plain(Box<dyn Sink>),
    Gzip(GzEncoder<Box<dyn Sink>>),
}

impl Encoder {
    pub fn new(sink: Box<dyn Sink>, gzip: bool, level: u32) -> Self {
        if gzip {
            Encoder::Gzip(GzEncoder::new(sink, Compression::new(level)))
        } else {
            Encoder::Plain(sink)
        }
    }

    pub fn is_gzip(&self) -> bool {
        matches!(self, Encoder::Gzip(_))
    }

    /// Writes the gzip trailer, if any, and hands back the destination
    /// without closing it.
    pub fn finish(self) -> io::Result<Box<dyn Sink>> {
        match self {
            Encoder::Plain(sink) => Ok(sink),
            Encoder::Gzip(mut enc) => {
                enc.try_finish()?;
                enc.finish()
            }
        }
    }
}

impl Write for Encoder {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Encoder::Plain(sink) => sink.write(buf),
            Encoder::Gzip(enc) => enc.write(buf),
        }
    }

    /// For gzip this emits a sync-flush block, so everything written so far
    /// can be decoded from the destination.
    fn flush(&mut self) -> io::Result<()> {
        match self {
            Encoder::Plain(sink) => sink.flush(),
            Encoder::Gzip(enc) => enc.flush(),
        }
    }
}
