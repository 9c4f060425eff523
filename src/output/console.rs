//! Standard output sink, for bench use and simulation.

use std::io;
use std::io::Write;

use super::{LineSink, Result};

/// Line sink writing to the process's standard output.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl StdoutSink {
    /// Create the sink.
    pub fn new() -> StdoutSink {
        StdoutSink
    }
}

impl LineSink for StdoutSink {
    fn name(&self) -> &str {
        "stdout"
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{}", line)?;
        handle.flush()?;
        Ok(())
    }
}
