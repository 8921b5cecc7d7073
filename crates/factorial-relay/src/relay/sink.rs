//! Console output.
//!
//! Everything the relay writes to stdout goes through [`ConsoleSink`]: one
//! `N: <n>, A: <value>` line per result, the shutdown banner and the closing
//! line. Logs go to stderr and never through here.

use factorial_core::FactorialResult;
use parking_lot::Mutex;
use std::{
    io::{self, Write},
    sync::Arc,
};

/// Printed by the shutdown coordinator when an interrupt is received.
pub const SHUTDOWN_BANNER: &str = "Cleaning up and shutting down.";

/// Printed once the run is over.
pub const FAREWELL: &str = "See you later.";

/// A [`ConsoleSink`] shared between the result consumer and the shutdown
/// coordinator. Holding the lock orders a printed result relative to the
/// banner.
pub type SharedSink<W> = Arc<Mutex<ConsoleSink<W>>>;

#[derive(Debug)]
pub struct ConsoleSink<W> {
    out: W,
}

impl ConsoleSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleSink<W> {
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    pub fn shared(self) -> SharedSink<W> {
        Arc::new(Mutex::new(self))
    }

    pub fn emit(&mut self, result: &FactorialResult) -> io::Result<()> {
        self.line(format_args!("{result}"))
    }

    pub fn announce_shutdown(&mut self) -> io::Result<()> {
        self.line(format_args!("{SHUTDOWN_BANNER}"))
    }

    pub fn farewell(&mut self) -> io::Result<()> {
        self.line(format_args!("{FAREWELL}"))
    }

    pub const fn get_ref(&self) -> &W {
        &self.out
    }

    fn line(&mut self, args: core::fmt::Arguments<'_>) -> io::Result<()> {
        self.out.write_fmt(args)?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }
}
