use log::warn;
use std::env;
use std::io::{self, IsTerminal};
use std::path::PathBuf;

pub fn is_stdin() -> bool {
    !io::stdin().is_terminal()
}

pub fn page_size() -> usize {
    4096
}

pub fn home_dir(user: Option<&str>) -> Option<PathBuf> {
    if user.is_some() {
        warn!("looking up other users' home directories is unsupported on this platform");
        return None;
    }

    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
