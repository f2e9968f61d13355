use super::{Buffered, Decompressor, DecompressorFactory};
use flate2;
use std::io::{self, Read};

pub const MAGIC: &[u8] = &[0x1f, 0x8b];

/// In-process decoder. Concatenated members are decoded as one stream, the
/// way zcat treats them.
struct GzipDecompressor {
    r: flate2::bufread::MultiGzDecoder<Buffered>,
}

impl Read for GzipDecompressor {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.r.read(buf)
    }
}

impl Decompressor for GzipDecompressor {
    fn finish(self: Box<Self>) -> io::Result<Buffered> {
        Ok(self.r.into_inner())
    }
}

pub struct GzipDecompressorFactory {}

impl GzipDecompressorFactory {
    pub fn new() -> Self {
        Self {}
    }
}

impl DecompressorFactory for GzipDecompressorFactory {
    fn create_decompressor(&self, r: Buffered) -> io::Result<Box<dyn Decompressor>> {
        Ok(Box::new(GzipDecompressor {
            r: flate2::bufread::MultiGzDecoder::new(r),
        }))
    }

    fn magic(&self) -> &'static [u8] {
        MAGIC
    }

    fn name(&self) -> &'static str {
        "in-process gzip"
    }
}
