//! Buffered readers and writers for files, stdin, URLs and subprocess pipes,
//! with transparent gzip handling.
//!
//! `ropen` sniffs the first bytes of the input and decompresses gzip data on
//! the fly. `wopen` compresses when the destination name ends in `.gz`.

pub mod buffer;
pub mod compression;
pub mod error;
pub mod options;
pub mod platform;
pub mod read;
pub mod sniff;
pub mod source;
pub mod util;
pub mod write;

pub use error::{Error, Result};
pub use options::Options;
pub use read::{ropen, ropen_with, Reader};
pub use write::{wants_gzip, wopen, wopen_with, Writer};
