use crate::buffer::BufferedStream;
use crate::options::Options;
use crate::source::Source;
use std::io::{self, Read};

pub mod gzip;
pub use self::gzip::GzipDecompressorFactory;

pub mod zcat;
pub use self::zcat::{has_zcat, ZcatDecompressorFactory};

pub mod encoder;
pub use self::encoder::Encoder;

/// A raw input stream behind its first buffering layer.
pub type Buffered = BufferedStream<Box<dyn Source>>;

pub trait Decompressor: Read + Send {
    /// Releases the decoder and hands back the stream it was reading from.
    fn finish(self: Box<Self>) -> io::Result<Buffered>;
}

pub trait DecompressorFactory {
    /// On failure the stream has already been closed.
    fn create_decompressor(&self, r: Buffered) -> io::Result<Box<dyn Decompressor>>;

    /// Leading bytes that mark input this factory can decode.
    fn magic(&self) -> &'static [u8];

    fn name(&self) -> &'static str;
}

/// Picks the gzip decoder for one stream: an external `zcat` when allowed
/// and installed, the in-process decoder otherwise.
pub fn gzip_decompressor_factory(opts: &Options) -> Box<dyn DecompressorFactory> {
    if opts.external_decompressor && has_zcat() {
        Box::new(ZcatDecompressorFactory::new())
    } else {
        Box::new(GzipDecompressorFactory::new())
    }
}

/// Closes a raw stream on a path that is already returning another error.
pub(crate) fn close_quietly(source: Box<dyn Source>) {
    if let Err(err) = source.close() {
        log::warn!("failed to close input after error: {}", err);
    }
}
