use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("stdin not detected")]
    StdinNotDetected,

    #[error("empty command: {0:?}")]
    EmptyCommand(String),

    #[error("failed to start {command:?}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot find home directory for {0:?}")]
    UnknownUser(String),

    #[error("http error downloading {url}. status: {status}")]
    HttpStatus { url: String, status: String },

    #[error("http request for {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
