/*! Acquiring the Raspberry Pi I/O the scanner drives.

This module checks that the multiplexer address pins form a usable plan (no pin used twice,
none overlapping the SPI0 bus or the built-in UART) before claiming them from the GPIO driver.
 */

use std::collections::HashSet;
use std::convert::From;
use std::fmt;
use std::fmt::Display;

use rppal::gpio;
use rppal::gpio::{Gpio, OutputPin};
use tracing::debug;

use crate::mux::ADDRESS_LINES;
use crate::output::serial::UART;

/// Scanner I/O result type.
pub type Result<T> = std::result::Result<T, Error>;

/// BCM pins of SPI0 (CE1, CE0, MISO, MOSI, SCLK), used by the converter.
const SPI0_PINS: [u8; 5] = [7, 8, 9, 10, 11];
/// BCM pins of the built-in UART (TX, RX).
const PL011_PINS: [u8; 2] = [14, 15];

/// Errors related to acquiring and configuring I/O.
#[derive(Debug)]
pub enum Error {
    /// GPIO-specific error.
    Gpio(gpio::Error),
    /// A pin is assigned to more than one address line.
    InUse(u8),
    /// An address pin overlaps the converter's SPI bus.
    SPIUnavailable(u8),
    /// An address pin overlaps the UART used by the wired sink.
    UARTUnavailable(u8),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Gpio(ref gpio_error) => Some(gpio_error),
            _ => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Error::*;
        match self {
            Gpio(ref e) => write!(f, "error with GPIO interface: {}", e),
            InUse(pin_no) => write!(f, "pin {} assigned to more than one address line", pin_no),
            SPIUnavailable(pin_no) => write!(f, "pin {} is part of the SPI0 bus (7-11)", pin_no),
            UARTUnavailable(pin_no) => write!(f, "pin {} is used by the UART (14, 15)", pin_no),
        }
    }
}

impl From<gpio::Error> for Error {
    fn from(e: gpio::Error) -> Self {
        Error::Gpio(e)
    }
}

/// Address pins for both multiplexers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinPlan {
    /// Outer multiplexer S0..S3.
    pub outer: [u8; ADDRESS_LINES],
    /// Inner multiplexer S0..S3.
    pub inner: [u8; ADDRESS_LINES],
}

impl PinPlan {
    /** Validate the plan against the other peripherals in use.

    # Errors
    - `Error::InUse` if a pin appears twice.
    - `Error::SPIUnavailable` if a pin belongs to SPI0.
    - `Error::UARTUnavailable` if a pin belongs to the built-in UART and `wired` is that UART.
     */
    pub fn check(&self, wired: &UART) -> Result<()> {
        let mut seen = HashSet::new();
        for &pin_no in self.outer.iter().chain(self.inner.iter()) {
            if !seen.insert(pin_no) {
                return Err(Error::InUse(pin_no));
            }
            if SPI0_PINS.contains(&pin_no) {
                return Err(Error::SPIUnavailable(pin_no));
            }
            if *wired == UART::PL011 && PL011_PINS.contains(&pin_no) {
                return Err(Error::UARTUnavailable(pin_no));
            }
        }

        Ok(())
    }

    /** Claim the address pins as outputs, driven low.

    The pins must not be held elsewhere in the program.
     */
    pub fn claim(&self, gpio: &Gpio) -> Result<([OutputPin; ADDRESS_LINES], [OutputPin; ADDRESS_LINES])> {
        Ok((claim_lines(gpio, &self.outer)?, claim_lines(gpio, &self.inner)?))
    }
}

impl Display for PinPlan {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Address lines:\n")?;
        write!(f, "{:^5} {:^7} {:^7}\n", "line", "outer", "inner")?;
        for (bit, (outer, inner)) in self.outer.iter().zip(self.inner.iter()).enumerate() {
            write!(f, " S{}    P{:02}     P{:02}\n", bit, outer, inner)?;
        }

        Ok(())
    }
}

fn claim_lines(gpio: &Gpio, pins: &[u8; ADDRESS_LINES]) -> Result<[OutputPin; ADDRESS_LINES]> {
    let [s0, s1, s2, s3] = *pins;
    let lines = [
        claim_line(gpio, s0)?,
        claim_line(gpio, s1)?,
        claim_line(gpio, s2)?,
        claim_line(gpio, s3)?,
    ];
    Ok(lines)
}

fn claim_line(gpio: &Gpio, pin_no: u8) -> Result<OutputPin> {
    let mut pin = gpio.get(pin_no)?.into_output();
    pin.set_low();
    debug!(pin = pin_no, "claimed address line");
    Ok(pin)
}
