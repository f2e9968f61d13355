//! Gzip decoding through an external `zcat` process.
//!
//! zlib decodes faster than the in-process decoder on large inputs, and the
//! work moves to a second core. The buffered input is pumped into the child
//! by a feeder thread and the decoded bytes are read back from its stdout.

use super::{close_quietly, gzip, Buffered, Decompressor, DecompressorFactory};
use log::{debug, warn};
use once_cell::sync::OnceCell;
use std::io::{self, BufRead, Read, Write};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

pub const ZCAT: &str = "zcat";

static HAS_ZCAT: OnceCell<bool> = OnceCell::new();

/// Whether `zcat` can be started. Checked once per process.
pub fn has_zcat() -> bool {
    *HAS_ZCAT.get_or_init(|| has_program(ZCAT))
}

fn has_program(program: &str) -> bool {
    let child = Command::new(program)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();

    match child {
        Ok(mut child) => {
            let _ = child.kill();
            let _ = child.wait();
            debug!("found {}", program);
            true
        }
        Err(err) => {
            debug!("{} is unavailable: {}", program, err);
            false
        }
    }
}

/// The raw stream handed back by the feeder thread, with the error that
/// stopped reading it, if any.
struct Fed {
    r: Buffered,
    read_err: Option<io::Error>,
}

/// Copies `r` into `w` until end-of-data. Returns the read error that ended
/// the copy; write errors only mean the child stopped reading.
fn feed<W: Write>(r: &mut Buffered, w: &mut W) -> Option<io::Error> {
    loop {
        let chunk = match r.fill_buf() {
            Ok(chunk) if chunk.is_empty() => return None,
            Ok(chunk) => chunk,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Some(err),
        };

        let len = chunk.len();
        if let Err(err) = w.write_all(chunk) {
            debug!("stopped feeding {}: {}", ZCAT, err);
            return None;
        }
        r.consume(len);
    }
}

/// Tears down a half-built decompressor: kills and reaps the child and closes
/// the raw stream before `err` is returned.
fn abandon(mut child: Child, r: Buffered, err: io::Error) -> io::Error {
    let _ = child.kill();
    let _ = child.wait();
    close_quietly(r.into_inner());
    err
}

struct ZcatDecompressor {
    child: Child,
    stdout: Option<ChildStdout>,
    feeder: Option<JoinHandle<Option<Fed>>>,
    fed: Option<Fed>,
    reaped: bool,
}

impl ZcatDecompressor {
    fn reap(&mut self) -> io::Result<()> {
        if self.reaped {
            return Ok(());
        }
        self.reaped = true;

        if self.child.try_wait()?.is_none() {
            let _ = self.child.kill();
        }
        self.child.wait()?;
        Ok(())
    }

    fn join_feeder(&mut self) -> io::Result<()> {
        let feeder = match self.feeder.take() {
            Some(feeder) => feeder,
            None => return Ok(()),
        };

        match feeder.join() {
            Ok(Some(fed)) => {
                self.fed = Some(fed);
                Ok(())
            }
            Ok(None) => Err(io::Error::new(
                io::ErrorKind::Other,
                "zcat feeder never received its input",
            )),
            Err(_) => Err(io::Error::new(
                io::ErrorKind::Other,
                "zcat feeder thread panicked",
            )),
        }
    }
}

impl Read for ZcatDecompressor {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let stdout = match self.stdout.as_mut() {
            Some(stdout) => stdout,
            None => return Ok(0),
        };

        let count = stdout.read(buf)?;
        if count > 0 || buf.is_empty() || self.reaped {
            return Ok(count);
        }

        // End of output. zcat only stops once its input is exhausted, so the
        // feeder is done too. A failure reading the raw stream takes
        // precedence over whatever zcat made of the cut-off input.
        self.reaped = true;
        let status = self.child.wait()?;
        self.join_feeder()?;
        if let Some(err) = self.fed.as_mut().and_then(|fed| fed.read_err.take()) {
            return Err(err);
        }

        match status.code() {
            Some(0) => Ok(0),
            // gzip reports warnings such as trailing garbage with status 2
            Some(2) => {
                warn!("{} finished with warnings", ZCAT);
                Ok(0)
            }
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{} failed: {}", ZCAT, status),
            )),
        }
    }
}

impl Decompressor for ZcatDecompressor {
    fn finish(mut self: Box<Self>) -> io::Result<Buffered> {
        drop(self.stdout.take());
        if let Err(err) = self.reap() {
            warn!("failed to reap {}: {}", ZCAT, err);
        }

        self.join_feeder()?;
        match self.fed.take() {
            Some(fed) => Ok(fed.r),
            None => Err(io::Error::new(
                io::ErrorKind::Other,
                "zcat input already released",
            )),
        }
    }
}

impl Drop for ZcatDecompressor {
    fn drop(&mut self) {
        drop(self.stdout.take());
        let _ = self.reap();
    }
}

pub struct ZcatDecompressorFactory {}

impl ZcatDecompressorFactory {
    pub fn new() -> Self {
        Self {}
    }
}

impl DecompressorFactory for ZcatDecompressorFactory {
    fn create_decompressor(&self, r: Buffered) -> io::Result<Box<dyn Decompressor>> {
        let spawned = Command::new(ZCAT)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(err) => {
                close_quietly(r.into_inner());
                return Err(err);
            }
        };

        let (mut stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                let err = io::Error::new(io::ErrorKind::Other, "zcat pipes were not captured");
                return Err(abandon(child, r, err));
            }
        };

        // The raw stream goes over a channel so it is still ours to close if
        // the thread cannot be started.
        let (tx, rx) = mpsc::channel::<Buffered>();
        let feeder = thread::Builder::new()
            .name("zcat-feeder".into())
            .spawn(move || {
                let mut r = rx.recv().ok()?;
                let read_err = feed(&mut r, &mut stdin);
                drop(stdin);
                Some(Fed { r, read_err })
            });

        let feeder = match feeder {
            Ok(feeder) => feeder,
            Err(err) => return Err(abandon(child, r, err)),
        };

        if let Err(mpsc::SendError(r)) = tx.send(r) {
            let _ = feeder.join();
            let err = io::Error::new(io::ErrorKind::Other, "zcat feeder exited early");
            return Err(abandon(child, r, err));
        }

        debug!("started {} (pid {})", ZCAT, child.id());
        Ok(Box::new(ZcatDecompressor {
            child,
            stdout: Some(stdout),
            feeder: Some(feeder),
            fed: None,
            reaped: false,
        }))
    }

    fn magic(&self) -> &'static [u8] {
        gzip::MAGIC
    }

    fn name(&self) -> &'static str {
        ZCAT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BufferedStream;
    use crate::source::{NoClose, Source};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn buffered(data: Vec<u8>) -> Buffered {
        let src: Box<dyn Source> = Box::new(NoClose(io::Cursor::new(data)));
        BufferedStream::with_capacity(64, src)
    }

    /// Yields its data and then a reset, counting how often it was closed.
    struct Reset {
        r: io::Cursor<Vec<u8>>,
        closed: Arc<AtomicUsize>,
    }

    impl Read for Reset {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.r.read(buf)? {
                0 => Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
                n => Ok(n),
            }
        }
    }

    impl Source for Reset {
        fn close(self: Box<Self>) -> io::Result<()> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn reset(data: Vec<u8>) -> (Buffered, Arc<AtomicUsize>) {
        let closed = Arc::new(AtomicUsize::new(0));
        let src: Box<dyn Source> = Box::new(Reset {
            r: io::Cursor::new(data),
            closed: closed.clone(),
        });
        (BufferedStream::with_capacity(64, src), closed)
    }

    struct Full;

    impl Write for Full {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_feed_keeps_read_error() {
        let (mut r, _) = reset(b"some bytes before the reset".to_vec());
        let mut out = Vec::new();
        let err = feed(&mut r, &mut out).unwrap();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
        assert_eq!(out, b"some bytes before the reset");

        let mut r = buffered(b"all of it".to_vec());
        let mut out = Vec::new();
        assert!(feed(&mut r, &mut out).is_none());
        assert_eq!(out, b"all of it");
    }

    #[test]
    fn test_feed_ignores_write_error() {
        let (mut r, _) = reset(b"unread".to_vec());
        assert!(feed(&mut r, &mut Full).is_none());
    }

    #[test]
    fn test_abandon_closes_input() {
        if !has_zcat() {
            return;
        }

        let child = Command::new(ZCAT)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .unwrap();
        let (r, closed) = reset(Vec::new());
        let err = abandon(child, r, io::Error::new(io::ErrorKind::WouldBlock, "no thread"));
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_transport_error_wins() {
        if !has_zcat() {
            return;
        }

        let full = gz(b"asdf");
        let mut cut = full.clone();
        cut.truncate(cut.len() - 6);

        for data in [full, cut] {
            let (r, closed) = reset(data);
            let mut dc = ZcatDecompressorFactory::new().create_decompressor(r).unwrap();
            let mut out = Vec::new();
            let err = dc.read_to_end(&mut out).unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);

            let raw = dc.finish().unwrap();
            raw.into_inner().close().unwrap();
            assert_eq!(closed.load(Ordering::SeqCst), 1);
        }
    }

    fn gz(data: &[u8]) -> Vec<u8> {
        let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn test_lookup_is_memoized() {
        let first = has_zcat();
        assert_eq!(HAS_ZCAT.get(), Some(&first));
        assert_eq!(has_zcat(), first);
    }

    #[test]
    fn test_missing_program() {
        assert!(!has_program("xopen-no-such-program-here"));
    }

    #[test]
    fn test_decode_through_zcat() {
        if !has_zcat() {
            return;
        }

        let payload: Vec<u8> = (0..200_000u32).map(|x| (x % 251) as u8).collect();
        let mut dc = ZcatDecompressorFactory::new()
            .create_decompressor(buffered(gz(&payload)))
            .unwrap();

        let mut out = Vec::new();
        dc.read_to_end(&mut out).unwrap();
        assert_eq!(out, payload);
        assert_eq!(dc.read(&mut [0u8; 16]).unwrap(), 0);
        dc.finish().unwrap();
    }

    #[test]
    fn test_finish_before_end() {
        if !has_zcat() {
            return;
        }

        let payload = vec![b'x'; 1 << 20];
        let mut dc = ZcatDecompressorFactory::new()
            .create_decompressor(buffered(gz(&payload)))
            .unwrap();

        let mut head = [0u8; 10];
        dc.read_exact(&mut head).unwrap();
        assert_eq!(&head, b"xxxxxxxxxx");
        dc.finish().unwrap();
    }

    #[test]
    fn test_bad_stream() {
        if !has_zcat() {
            return;
        }

        let mut data = gz(b"this will be cut short");
        data.truncate(data.len() - 10);
        let mut dc = ZcatDecompressorFactory::new()
            .create_decompressor(buffered(data))
            .unwrap();

        let mut out = Vec::new();
        let err = dc.read_to_end(&mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        dc.finish().unwrap();
    }
}
