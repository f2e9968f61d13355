#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::{Cursor, Read};
use xopen::{Options, Reader};

fuzz_target!(|data: &[u8]| {
    let opts = Options::new().with_external_decompressor(false).with_buffer_size(64);
    let mut r = match Reader::from_read(Cursor::new(data.to_vec()), &opts) {
        Ok(r) => r,
        Err(_) => return,
    };

    let mut out = Vec::new();
    let _ = r.read_to_end(&mut out);
    let _ = r.close();
});
