use libc;
use std::env;
use std::ffi::{CStr, CString, OsStr};
use std::mem::MaybeUninit;
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;

/// True when stdin is not a character device, i.e. data is piped or
/// redirected in rather than typed at a terminal.
pub fn is_stdin() -> bool {
    let mut st = MaybeUninit::<libc::stat>::uninit();
    let ret = unsafe { libc::fstat(libc::STDIN_FILENO, st.as_mut_ptr()) };
    if ret != 0 {
        return false;
    }

    let st = unsafe { st.assume_init() };
    (st.st_mode & libc::S_IFMT) != libc::S_IFCHR
}

pub fn page_size() -> usize {
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 {
        size as usize
    } else {
        4096
    }
}

/// Home directory of `user`, or of the current user when `None`.
pub fn home_dir(user: Option<&str>) -> Option<PathBuf> {
    match user {
        Some(name) => {
            let name = CString::new(name).ok()?;
            passwd_home(|pw, buf, len, result| unsafe {
                libc::getpwnam_r(name.as_ptr(), pw, buf, len, result)
            })
        }
        // Containers often run with a uid that has no passwd entry.
        None => passwd_home(|pw, buf, len, result| unsafe {
            libc::getpwuid_r(libc::getuid(), pw, buf, len, result)
        })
        .or_else(|| env::var_os("HOME").map(PathBuf::from)),
    }
}

fn passwd_home<F>(lookup: F) -> Option<PathBuf>
where
    F: Fn(*mut libc::passwd, *mut libc::c_char, libc::size_t, *mut *mut libc::passwd) -> libc::c_int,
{
    let mut pw = MaybeUninit::<libc::passwd>::uninit();
    let mut buf = vec![0 as libc::c_char; 1024];
    let mut result: *mut libc::passwd = std::ptr::null_mut();

    loop {
        let ret = lookup(
            pw.as_mut_ptr(),
            buf.as_mut_ptr(),
            buf.len(),
            &mut result as *mut *mut libc::passwd,
        );
        if ret == libc::ERANGE && buf.len() < 1 << 20 {
            buf.resize(buf.len() * 2, 0);
            continue;
        }
        if ret != 0 || result.is_null() {
            return None;
        }
        break;
    }

    // 'result' points at 'pw', whose string fields point into 'buf'
    let pw = unsafe { pw.assume_init() };
    if pw.pw_dir.is_null() {
        return None;
    }
    let dir = unsafe { CStr::from_ptr(pw.pw_dir) };
    Some(PathBuf::from(OsStr::from_bytes(dir.to_bytes())))
}
