//! Drivers and abstractions for the scanner's hardware.

use std::error;
use std::fmt;
use std::fmt::Display;

use rppal::spi;

pub mod hal;
pub mod mcp3208;

pub use hal::{ADC, ADCChannel, AnalogInput, Delay, DigitalOutput, ThreadDelay};
pub use mcp3208::MCP3208;

/// Hardware result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while talking to the acquisition hardware.
#[derive(Debug)]
pub enum Error {
    /// SPI transfer or configuration error.
    Spi(spi::Error),
    /// The converter does not have the requested input channel.
    NoSuchChannel(u8),
    /// The converter returned fewer bytes than a conversion needs.
    ShortTransfer(usize),
    /// Fault injected by the simulated backend.
    Simulated(&'static str),
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Spi(ref e) => Some(e),
            _ => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Error::*;
        match self {
            Spi(ref e) => write!(f, "error with SPI interface: {}", e),
            NoSuchChannel(channel) => write!(f, "converter has no input channel {}", channel),
            ShortTransfer(len) => write!(f, "conversion transfer ended after {} byte(s)", len),
            Simulated(msg) => write!(f, "simulated hardware fault: {}", msg),
        }
    }
}

impl From<spi::Error> for Error {
    fn from(e: spi::Error) -> Self {
        Error::Spi(e)
    }
}
