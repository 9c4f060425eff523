//! Startup errors.

use std::error;
use std::fmt;
use std::fmt::Display;

use crate::config;
use crate::hw;
use crate::io;
use crate::output;

/// Errors that prevent the scanner from starting.
#[derive(Debug)]
pub enum Error {
    /// Configuration could not be loaded.
    Config(config::Error),
    /// Converter or GPIO initialization failed.
    Hardware(hw::Error),
    /// Address pins could not be acquired.
    IO(io::Error),
    /// The wired sink could not be opened.
    Output(output::Error),
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        use Error::*;
        match self {
            Config(ref e) => Some(e),
            Hardware(ref e) => Some(e),
            IO(ref e) => Some(e),
            Output(ref e) => Some(e),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Error::*;
        match self {
            Config(ref e) => write!(f, "configuration error: {}", e),
            Hardware(ref e) => write!(f, "hardware error: {}", e),
            IO(ref e) => write!(f, "I/O error: {}", e),
            Output(ref e) => write!(f, "output error: {}", e),
        }
    }
}

impl From<config::Error> for Error {
    fn from(e: config::Error) -> Self {
        Error::Config(e)
    }
}

impl From<hw::Error> for Error {
    fn from(e: hw::Error) -> Self {
        Error::Hardware(e)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::IO(e)
    }
}

impl From<output::Error> for Error {
    fn from(e: output::Error) -> Self {
        Error::Output(e)
    }
}
