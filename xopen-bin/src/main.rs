use anyhow::{Context, Result};
use clap::Parser;
use log::debug;
use std::io;
use xopen::{ropen_with, wopen_with, Options, Writer};

/// Concatenate files, URLs, command output or stdin into one output,
/// decompressing gzip input on the fly.
#[derive(Parser, Debug)]
#[command(name = "xcat", version, about)]
struct Args {
    /// Inputs: paths, '-' for stdin, http(s) URLs or '|command args'
    #[arg(default_value = "-")]
    inputs: Vec<String>,

    /// Output path; '-' is stdout and a '.gz' suffix compresses
    #[arg(short, long, default_value = "-")]
    output: String,

    /// Gzip level for '.gz' outputs
    #[arg(short, long, default_value_t = 6, value_parser = clap::value_parser!(u32).range(0..=9))]
    level: u32,

    /// Buffer size in bytes [default: two memory pages]
    #[arg(short, long)]
    buffer_size: Option<usize>,

    /// Always decompress in-process, even if zcat is installed
    #[arg(long)]
    no_zcat: bool,
}

impl Args {
    fn options(&self) -> Options {
        let opts = Options::new()
            .with_level(self.level)
            .with_external_decompressor(!self.no_zcat);

        match self.buffer_size {
            Some(size) => opts.with_buffer_size(size),
            None => opts,
        }
    }
}

fn copy_input(name: &str, w: &mut Writer, opts: &Options) -> Result<u64> {
    let mut r = ropen_with(name, opts).with_context(|| format!("cannot open {}", name))?;

    // Close even when the copy failed; the copy error wins.
    let copied = io::copy(&mut r, w);
    let closed = r.close();
    let count = copied.with_context(|| format!("failed to copy {}", name))?;
    closed.with_context(|| format!("failed to close {}", name))?;

    debug!("copied {} bytes from {}", count, name);
    Ok(count)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let opts = args.options();

    let mut w = wopen_with(&args.output, &opts)
        .with_context(|| format!("cannot open {} for writing", args.output))?;

    for input in &args.inputs {
        if let Err(err) = copy_input(input, &mut w, &opts) {
            if let Err(close_err) = w.close() {
                log::warn!("failed to close {}: {}", args.output, close_err);
            }
            return Err(err);
        }
    }

    w.close()
        .with_context(|| format!("failed to finish {}", args.output))?;
    Ok(())
}
