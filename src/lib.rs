//! Scanning a multiplexed grid of analog sensors and streaming it as text frames.

#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod hw;
pub mod io;
pub mod matrix;
pub mod mux;
pub mod output;
pub mod sample;
pub mod scanner;
pub mod sim;

pub use error::Error;
