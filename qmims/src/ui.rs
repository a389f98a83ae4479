//! User-facing terminal output.
//!
//! Everything the CLI prints for humans goes through [`write_line`], which owns
//! the platform line terminator. Diagnostics go through `tracing` instead (see
//! [`crate::logging`]).

use std::io::{self, Write};

use console::style;

#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

/// Destination stream for a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Write `text` followed by the platform line ending.
///
/// Output errors (closed pipe) are ignored; there is nowhere left to report them.
pub fn write_line(stream: Stream, text: &str) {
    let _ = match stream {
        Stream::Stdout => write_to(&mut io::stdout().lock(), text),
        Stream::Stderr => write_to(&mut io::stderr().lock(), text),
    };
}

fn write_to<W: Write>(out: &mut W, text: &str) -> io::Result<()> {
    out.write_all(text.as_bytes())?;
    out.write_all(LINE_ENDING.as_bytes())?;
    out.flush()
}

/// Plain result output (scan listings, config values).
pub fn print(text: &str) {
    write_line(Stream::Stdout, text);
}

pub fn info(text: &str) {
    write_line(Stream::Stderr, &format!("{} {text}", style("info").cyan().bold()));
}

pub fn success(text: &str) {
    write_line(Stream::Stderr, &format!("{} {text}", style("done").green().bold()));
}

pub fn warn(text: &str) {
    write_line(
        Stream::Stderr,
        &format!("{} {text}", style("warning").yellow().bold()),
    );
}

pub fn error(text: &str) {
    write_line(Stream::Stderr, &format!("{} {text}", style("error").red().bold()));
}
