//! Support for the MCP3208 12-bit SPI converter.

use rppal::spi::{Bus, Mode, SlaveSelect, Spi};

use super::hal::ADC;
use super::{Error, Result};

/// Start bit plus single-ended mode, left in the first command byte.
const START_SINGLE_ENDED: u8 = 0b0000_0110;

/// Driver for the Microchip MCP3208 8-channel ADC.
#[derive(Debug)]
pub struct MCP3208 {
    spi: Spi,
}

impl MCP3208 {
    const CHANNELS: u8 = 8;

    /// Create a new instance of the driver.
    pub fn new(spi: Spi) -> MCP3208 {
        MCP3208 {
            spi,
        }
    }

    /// Open the converter on SPI0 with the given chip select and clock.
    pub fn open(slave_select: SlaveSelect, clock_hz: u32) -> Result<MCP3208> {
        let spi = Spi::new(Bus::Spi0, slave_select, clock_hz, Mode::Mode0)?;
        Ok(MCP3208::new(spi))
    }

    /// Build the three-byte command requesting a single-ended conversion.
    ///
    /// The channel's top bit ends the first byte; the remaining two bits lead the second.
    fn command(channel_no: u8) -> [u8; 3] {
        [
            START_SINGLE_ENDED | ((channel_no & 0x04) >> 2),
            (channel_no & 0x03) << 6,
            0x00,
        ]
    }

    /// Extract the 12-bit result from the bytes clocked out during a command.
    fn decode(response: &[u8; 3]) -> u16 {
        (((response[1] & 0x0F) as u16) << 8) | (response[2] as u16)
    }
}

impl ADC for MCP3208 {
    fn channels(&self) -> u8 {
        Self::CHANNELS
    }

    fn sample(&mut self, channel_no: u8) -> Result<u16> {
        if channel_no >= Self::CHANNELS {
            return Err(Error::NoSuchChannel(channel_no));
        }

        let command = Self::command(channel_no);
        let mut response = [0u8; 3];
        let transferred = self.spi.transfer(&mut response, &command)?;
        if transferred < response.len() {
            return Err(Error::ShortTransfer(transferred));
        }

        Ok(Self::decode(&response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_for_channel_zero() {
        assert_eq!(MCP3208::command(0), [0b0000_0110, 0b0000_0000, 0]);
    }

    #[test]
    fn command_splits_channel_bits() {
        // Channel 5 = 0b101: D2 in the first byte, D1 D0 at the top of the second.
        assert_eq!(MCP3208::command(5), [0b0000_0111, 0b0100_0000, 0]);
        assert_eq!(MCP3208::command(7), [0b0000_0111, 0b1100_0000, 0]);
    }

    #[test]
    fn decode_ignores_leading_bits() {
        assert_eq!(MCP3208::decode(&[0xFF, 0xFF, 0xFF]), 4095);
        assert_eq!(MCP3208::decode(&[0x00, 0xE8, 0x00]), 0x800);
        assert_eq!(MCP3208::decode(&[0x00, 0x03, 0xE8]), 1000);
    }
}
