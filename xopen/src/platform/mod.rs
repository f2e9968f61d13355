#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub use unix::{home_dir, is_stdin, page_size};

#[cfg(not(unix))]
mod generic;
#[cfg(not(unix))]
pub use generic::{home_dir, is_stdin, page_size};
