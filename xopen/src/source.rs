//! Resolution of names into raw byte streams.
//!
//! Inputs: `-` (piped stdin), `|cmd args` (stdout of a subprocess),
//! `http://` and `https://` URLs, and local paths with `~` expansion.
//! Outputs: `-` (stdout) or a local file that is created or truncated.

use crate::error::{Error, Result};
use crate::platform;
use crate::util::expand_user;
use log::debug;
use std::fs::File;
use std::io::{self, Read, Write};
use std::process::{Child, ChildStdout, Command, Stdio};

/// A raw input stream that knows how to release itself.
pub trait Source: Read + Send {
    fn close(self: Box<Self>) -> io::Result<()>;
}

/// A raw output stream that knows how to release itself.
pub trait Sink: Write + Send {
    fn close(self: Box<Self>) -> io::Result<()>;
}

/// Adapts a stream that has nothing to release, such as an in-memory buffer.
/// Closing it only drops it (after a flush, for writers).
pub struct NoClose<T>(pub T);

impl<R: Read> Read for NoClose<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl<W: Write> Write for NoClose<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl<R: Read + Send> Source for NoClose<R> {
    fn close(self: Box<Self>) -> io::Result<()> {
        Ok(())
    }
}

impl<W: Write + Send> Sink for NoClose<W> {
    fn close(mut self: Box<Self>) -> io::Result<()> {
        self.0.flush()
    }
}

impl Source for File {
    fn close(self: Box<Self>) -> io::Result<()> {
        drop(self);
        Ok(())
    }
}

impl Sink for File {
    fn close(mut self: Box<Self>) -> io::Result<()> {
        self.flush()
    }
}

// The process-wide stdin/stdout handles stay open for the rest of the program.
impl Source for io::Stdin {
    fn close(self: Box<Self>) -> io::Result<()> {
        Ok(())
    }
}

impl Sink for io::Stdout {
    fn close(mut self: Box<Self>) -> io::Result<()> {
        self.flush()
    }
}

/// Response body of a successful HTTP GET.
pub struct HttpBody {
    r: Box<dyn Read + Send + Sync>,
}

impl Read for HttpBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.r.read(buf)
    }
}

impl Source for HttpBody {
    fn close(self: Box<Self>) -> io::Result<()> {
        drop(self);
        Ok(())
    }
}

/// Standard output of a spawned command.
pub struct ProcessOutput {
    command: String,
    child: Child,
    stdout: ChildStdout,
}

impl Read for ProcessOutput {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stdout.read(buf)
    }
}

impl Source for ProcessOutput {
    /// Closes the pipe and reaps the child. A command that is still writing
    /// gets a broken pipe and exits on its own.
    fn close(self: Box<Self>) -> io::Result<()> {
        let Self {
            command,
            mut child,
            stdout,
        } = *self;
        drop(stdout);
        let status = child.wait()?;
        debug!("{:?} exited with {}", command, status);
        Ok(())
    }
}

/// Opens `name` for reading.
pub fn open_source(name: &str) -> Result<Box<dyn Source>> {
    if name == "-" {
        if !platform::is_stdin() {
            return Err(Error::StdinNotDetected);
        }
        debug!("reading from stdin");
        return Ok(Box::new(io::stdin()));
    }

    if let Some(command) = name.strip_prefix('|') {
        return spawn_command(command);
    }

    if name.starts_with("http://") || name.starts_with("https://") {
        return fetch(name);
    }

    let path = expand_user(name)?;
    debug!("opening {}", path.display());
    Ok(Box::new(File::open(path)?))
}

/// Opens `name` for writing.
pub fn create_sink(name: &str) -> Result<Box<dyn Sink>> {
    if name == "-" {
        debug!("writing to stdout");
        return Ok(Box::new(io::stdout()));
    }

    let path = expand_user(name)?;
    debug!("creating {}", path.display());
    Ok(Box::new(File::create(path)?))
}

/// Splits on whitespace; quoting is not understood.
pub fn split_command(command: &str) -> Option<(&str, Vec<&str>)> {
    let mut parts = command.split_whitespace();
    let program = parts.next()?;
    Some((program, parts.collect()))
}

fn spawn_command(command: &str) -> Result<Box<dyn Source>> {
    let (program, args) = match split_command(command) {
        Some(split) => split,
        None => return Err(Error::EmptyCommand(command.to_string())),
    };

    debug!("spawning {:?} with args {:?}", program, args);
    let mut child = Command::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .spawn()
        .map_err(|source| Error::Spawn {
            command: command.to_string(),
            source,
        })?;

    let stdout = match child.stdout.take() {
        Some(stdout) => stdout,
        None => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::Spawn {
                command: command.to_string(),
                source: io::Error::new(io::ErrorKind::Other, "stdout was not captured"),
            });
        }
    };

    Ok(Box::new(ProcessOutput {
        command: command.to_string(),
        child,
        stdout,
    }))
}

fn fetch(url: &str) -> Result<Box<dyn Source>> {
    debug!("fetching {}", url);
    match ureq::get(url).call() {
        Ok(resp) if resp.status() == 200 => Ok(Box::new(HttpBody {
            r: resp.into_reader(),
        })),
        Ok(resp) => Err(Error::HttpStatus {
            url: url.to_string(),
            status: format!("{} {}", resp.status(), resp.status_text()),
        }),
        Err(ureq::Error::Status(code, resp)) => Err(Error::HttpStatus {
            url: url.to_string(),
            status: format!("{} {}", code, resp.status_text()),
        }),
        Err(err) => Err(Error::Http {
            url: url.to_string(),
            source: Box::new(err),
        }),
    }
}
