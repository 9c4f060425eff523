/*! Frame output.

Frames go to one or more [`LineSink`]s through a [`FrameEmitter`].
Sinks are independent: a sink that fails part way through a frame is skipped for the rest of
that frame and the remaining sinks still receive it.
 */

use std::error;
use std::fmt;
use std::fmt::{Debug, Display};
use std::io;

use rppal::uart;
use tracing::{debug, error, trace};

use crate::matrix::Frame;

pub mod console;
pub mod serial;

pub use console::StdoutSink;
pub use serial::SerialSink;

/// Status line written to every sink once at startup.
pub const STARTUP_STATUS: &str = "Initialization complete, starting channel scan...";

/// Output result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while writing to a sink.
#[derive(Debug)]
pub enum Error {
    /// The sink has no connected peer.
    Disconnected(String),
    /// Standard I/O error.
    IO(io::Error),
    /// The UART accepted no data.
    Stalled(String),
    /// UART configuration or transfer error.
    UART(uart::Error),
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::IO(ref e) => Some(e),
            Error::UART(ref e) => Some(e),
            _ => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Error::*;
        match self {
            Disconnected(ref name) => write!(f, "sink '{}' is not connected", name),
            IO(ref e) => write!(f, "I/O error: {}", e),
            Stalled(ref name) => write!(f, "sink '{}' stopped accepting data", name),
            UART(ref e) => write!(f, "UART error: {}", e),
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::IO(e)
    }
}

impl From<uart::Error> for Error {
    fn from(e: uart::Error) -> Self {
        Error::UART(e)
    }
}

/// Destination for lines of text.
pub trait LineSink: Debug {
    /// Human-readable name of the sink.
    fn name(&self) -> &str;

    /// Write one line; the sink supplies the line terminator.
    fn write_line(&mut self, line: &str) -> Result<()>;
}

/// How the emitter treats a sink's failures.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Delivery {
    /// Failures are errors worth reporting.
    Required,
    /// Failures are expected (e.g., no peer) and only noted at debug level.
    BestEffort,
}

#[derive(Debug)]
struct Slot {
    sink: Box<dyn LineSink>,
    delivery: Delivery,
}

/// Writes frames to every attached sink.
#[derive(Debug, Default)]
pub struct FrameEmitter {
    slots: Vec<Slot>,
}

impl FrameEmitter {
    /// Create an emitter with no sinks.
    pub fn new() -> FrameEmitter {
        FrameEmitter::default()
    }

    /// Attach a sink.
    pub fn attach(&mut self, sink: Box<dyn LineSink>, delivery: Delivery) {
        debug!(sink = sink.name(), ?delivery, "attached sink");
        self.slots.push(Slot { sink, delivery });
    }

    /// Builder-style [`FrameEmitter::attach`].
    pub fn with_sink(mut self, sink: Box<dyn LineSink>, delivery: Delivery) -> FrameEmitter {
        self.attach(sink, delivery);
        self
    }

    /// Returns the number of attached sinks.
    pub fn sink_count(&self) -> usize {
        self.slots.len()
    }

    /// Write the startup status line to every sink.
    ///
    /// Returns the number of sinks that accepted it.
    pub fn announce(&mut self) -> usize {
        self.write_all(&[STARTUP_STATUS.to_string()])
    }

    /// Write a frame to every sink.
    ///
    /// Returns the number of sinks that received the whole frame.
    pub fn emit(&mut self, frame: &Frame<'_>) -> usize {
        self.write_all(&frame.lines())
    }

    fn write_all(&mut self, lines: &[String]) -> usize {
        let mut delivered = 0;
        for slot in &mut self.slots {
            match write_lines(slot.sink.as_mut(), lines) {
                Ok(()) => {
                    trace!(sink = slot.sink.name(), lines = lines.len(), "delivered");
                    delivered += 1;
                },
                Err(e) => match slot.delivery {
                    Delivery::Required =>
                        error!(sink = slot.sink.name(), "write failed: {}", e),
                    Delivery::BestEffort =>
                        debug!(sink = slot.sink.name(), "write skipped: {}", e),
                },
            }
        }

        delivered
    }
}

fn write_lines(sink: &mut dyn LineSink, lines: &[String]) -> Result<()> {
    for line in lines {
        sink.write_line(line)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{SensorMatrix, COLS, ROWS};
    use crate::sim::MemorySink;

    fn two_sinks() -> (FrameEmitter, MemorySink, MemorySink) {
        let wired = MemorySink::new("wired");
        let wireless = MemorySink::new("wireless");
        let emitter = FrameEmitter::new()
            .with_sink(Box::new(wired.clone()), Delivery::Required)
            .with_sink(Box::new(wireless.clone()), Delivery::BestEffort);
        (emitter, wired, wireless)
    }

    #[test]
    fn announce_reaches_every_sink() {
        let (mut emitter, wired, wireless) = two_sinks();
        assert_eq!(emitter.announce(), 2);
        assert_eq!(wired.lines(), vec![STARTUP_STATUS.to_string()]);
        assert_eq!(wireless.lines(), wired.lines());
    }

    #[test]
    fn sinks_mirror_the_same_frame() {
        let (mut emitter, wired, wireless) = two_sinks();
        let matrix = SensorMatrix::from_rows([[0.5; COLS]; ROWS]);

        assert_eq!(emitter.emit(&matrix.frame()), 2);
        assert_eq!(wired.lines().len(), ROWS + 1);
        assert_eq!(wired.lines(), wireless.lines());
    }

    #[test]
    fn failing_optional_sink_does_not_block_wired() {
        let (mut emitter, wired, wireless) = two_sinks();
        wireless.set_failing(true);
        let matrix = SensorMatrix::from_rows([[0.5; COLS]; ROWS]);

        assert_eq!(emitter.emit(&matrix.frame()), 1);
        assert_eq!(wired.lines().len(), ROWS + 1);
        assert!(wireless.lines().is_empty());
    }

    #[test]
    fn failing_wired_sink_does_not_block_optional() {
        let (mut emitter, wired, wireless) = two_sinks();
        wired.set_failing(true);
        let matrix = SensorMatrix::from_rows([[0.5; COLS]; ROWS]);

        assert_eq!(emitter.emit(&matrix.frame()), 1);
        assert!(wired.lines().is_empty());
        assert_eq!(wireless.lines().len(), ROWS + 1);
    }

    #[test]
    fn empty_emitter_delivers_nowhere() {
        let mut emitter = FrameEmitter::new();
        let matrix = SensorMatrix::from_rows([[0.5; COLS]; ROWS]);
        assert_eq!(emitter.sink_count(), 0);
        assert_eq!(emitter.emit(&matrix.frame()), 0);
    }
}
