/*! Scanner configuration.

The constants below are the build-time configuration of the scanner.
[`ScanConfig`] carries them at runtime and may be overridden field by field from a JSON file:

```json
{
    "_version": 1,
    "settle_delay_us": 750,
    "outer_mux_pins": [5, 6, 13, 19]
}
```
 */

use std::error;
use std::fmt;
use std::fmt::Display;
use std::fs::File;
use std::io;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::matrix::{COLS, ROWS};
use crate::mux::ADDRESS_LINES;

/// Outer (row) multiplexer S0..S3, BCM GPIO numbering.
pub const OUTER_MUX_PINS: [u8; ADDRESS_LINES] = [5, 6, 13, 19];
/// Inner (column) multiplexer S0..S3, BCM GPIO numbering.
pub const INNER_MUX_PINS: [u8; ADDRESS_LINES] = [12, 16, 20, 21];
/// Converter input wired to the multiplexers' common pin.
pub const ANALOG_CHANNEL: u8 = 0;
/// SPI clock for the converter.
pub const SPI_CLOCK_HZ: u32 = 1_000_000;

/// Conversions averaged per sensor point.
pub const SAMPLES_PER_POINT: u32 = 3;
/// Delay between matrix scans, in milliseconds.
pub const SCAN_DELAY_MS: u32 = 100;
/// Delay after switching a multiplexer, in microseconds.
pub const SETTLE_DELAY_US: u32 = 500;
/// Delay after each conversion, in microseconds.
pub const SAMPLE_DELAY_US: u32 = 10;

/// Converter reference voltage.
pub const REFERENCE_VOLTAGE: f64 = 3.3;
/// Largest raw code (12-bit).
pub const MAX_RAW_CODE: u16 = 4095;

/// Wired serial sink.
pub const WIRED_UART_PATH: &str = "/dev/ttyAMA0";
/// Line speed of both serial sinks.
pub const UART_LINE_SPEED: u32 = 115_200;
/// Name the wireless sink announces itself under.
pub const WIRELESS_DEVICE_NAME: &str = "MuxScan-Matrix";

/// Longest scan delay a [`Delay`](crate::hw::Delay) can count in microseconds.
pub const MAX_SCAN_DELAY_MS: u32 = u32::MAX / 1_000;

/// Supported configuration file version.
const CONFIG_VERSION: u32 = 1;

type Result<T> = std::result::Result<T, Error>;

/// Configuration errors.
#[derive(Debug)]
pub enum Error {
    /// The file could not be read.
    IO(io::Error),
    /// The file is not valid configuration JSON.
    Format(serde_json::Error),
    /// The file's `_version` is not supported.
    Version(u32),
    /// A field holds an unusable value.
    Invalid(&'static str),
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::IO(ref e) => Some(e),
            Error::Format(ref e) => Some(e),
            _ => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Error::*;
        match self {
            IO(ref e) => write!(f, "could not read configuration: {}", e),
            Format(ref e) => write!(f, "configuration format error: {}", e),
            Version(ver) => write!(f, "configuration not compatible (provided: {}, required: {})",
                                   ver, CONFIG_VERSION),
            Invalid(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::IO(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Format(e)
    }
}

/// Runtime view of the scanner configuration.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// File format version, `_version` in JSON.
    #[serde(rename = "_version")]
    pub version: u32,
    /// Outer multiplexer S0..S3 pins.
    pub outer_mux_pins: [u8; ADDRESS_LINES],
    /// Inner multiplexer S0..S3 pins.
    pub inner_mux_pins: [u8; ADDRESS_LINES],
    /// Converter input channel.
    pub analog_channel: u8,
    /// Converter SPI clock.
    pub spi_clock_hz: u32,
    /// Conversions averaged per point.
    pub samples_per_point: u32,
    /// Delay between scans (ms).
    pub scan_delay_ms: u32,
    /// Delay after each multiplexer switch (us).
    pub settle_delay_us: u32,
    /// Delay after each conversion (us).
    pub sample_delay_us: u32,
    /// Voltage of the largest raw code.
    pub reference_voltage: f64,
    /// Largest raw code.
    pub max_raw_code: u16,
    /// Serial sink line speed.
    pub line_speed: u32,
    /// Wireless sink device name.
    pub wireless_name: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            version: CONFIG_VERSION,
            outer_mux_pins: OUTER_MUX_PINS,
            inner_mux_pins: INNER_MUX_PINS,
            analog_channel: ANALOG_CHANNEL,
            spi_clock_hz: SPI_CLOCK_HZ,
            samples_per_point: SAMPLES_PER_POINT,
            scan_delay_ms: SCAN_DELAY_MS,
            settle_delay_us: SETTLE_DELAY_US,
            sample_delay_us: SAMPLE_DELAY_US,
            reference_voltage: REFERENCE_VOLTAGE,
            max_raw_code: MAX_RAW_CODE,
            line_speed: UART_LINE_SPEED,
            wireless_name: WIRELESS_DEVICE_NAME.to_string(),
        }
    }
}

impl ScanConfig {
    /// Read overrides from a JSON file.
    pub fn from_file(path: &Path) -> Result<ScanConfig> {
        let mut text = String::new();
        File::open(path)?.read_to_string(&mut text)?;
        ScanConfig::from_json(&text)
    }

    /// Parse overrides from JSON text; absent fields keep their build-time values.
    pub fn from_json(text: &str) -> Result<ScanConfig> {
        let config: ScanConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the values can drive a scan.
    pub fn validate(&self) -> Result<()> {
        if self.version != CONFIG_VERSION {
            return Err(Error::Version(self.version));
        }
        if self.samples_per_point == 0 {
            return Err(Error::Invalid("samples_per_point must be at least 1"));
        }
        if self.max_raw_code == 0 {
            return Err(Error::Invalid("max_raw_code must be non-zero"));
        }
        if !(self.reference_voltage > 0.0) {
            return Err(Error::Invalid("reference_voltage must be positive"));
        }
        if self.scan_delay_ms > MAX_SCAN_DELAY_MS {
            return Err(Error::Invalid("scan_delay_ms is too long"));
        }

        Ok(())
    }

    /// Blocking time of one full cycle: every settle and sample delay plus the scan delay.
    pub fn cycle_time(&self) -> Duration {
        let per_point = self.settle_delay_us as u64
            + self.samples_per_point as u64 * self.sample_delay_us as u64;
        let per_row = self.settle_delay_us as u64 + COLS as u64 * per_point;
        let scan = ROWS as u64 * per_row;

        Duration::from_micros(scan) + Duration::from_millis(self.scan_delay_ms as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let config = ScanConfig::default();
        assert_eq!(config.samples_per_point, 3);
        assert_eq!(config.settle_delay_us, 500);
        assert_eq!(config.sample_delay_us, 10);
        assert_eq!(config.scan_delay_ms, 100);
        assert_eq!(config.max_raw_code, 4095);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_cycle_time() {
        // 5 * (500 + 3 * (500 + 3 * 10)) us + 100 ms
        assert_eq!(ScanConfig::default().cycle_time(), Duration::from_micros(110_450));
    }

    #[test]
    fn partial_override() {
        let config = ScanConfig::from_json(r#"{ "_version": 1, "settle_delay_us": 750 }"#)
            .unwrap();
        assert_eq!(config.settle_delay_us, 750);
        assert_eq!(config.outer_mux_pins, OUTER_MUX_PINS);
    }

    #[test]
    fn missing_version_means_current() {
        let config = ScanConfig::from_json(r#"{ "inner_mux_pins": [1, 2, 3, 4] }"#).unwrap();
        assert_eq!(config.inner_mux_pins, [1, 2, 3, 4]);
    }

    #[test]
    fn rejects_other_versions() {
        let r = ScanConfig::from_json(r#"{ "_version": 2 }"#);
        assert!(matches!(r, Err(Error::Version(2))));
    }

    #[test]
    fn rejects_unknown_fields() {
        let r = ScanConfig::from_json(r#"{ "sample_count": 4 }"#);
        assert!(matches!(r, Err(Error::Format(_))));
    }

    #[test]
    fn rejects_zero_samples() {
        let r = ScanConfig::from_json(r#"{ "samples_per_point": 0 }"#);
        assert!(matches!(r, Err(Error::Invalid(_))));
    }

    #[test]
    fn longest_scan_delay() {
        let config = ScanConfig::from_json(r#"{ "scan_delay_ms": 4294967 }"#).unwrap();
        assert_eq!(config.scan_delay_ms, MAX_SCAN_DELAY_MS);

        let r = ScanConfig::from_json(r#"{ "scan_delay_ms": 4294968 }"#);
        assert!(matches!(r, Err(Error::Invalid(_))));
    }

    #[test]
    fn rejects_non_positive_reference() {
        let r = ScanConfig::from_json(r#"{ "reference_voltage": 0.0 }"#);
        assert!(matches!(r, Err(Error::Invalid(_))));
    }
}
