//! Traits the scanner is written against, with their Raspberry Pi implementations.

use std::fmt::Debug;
use std::thread;
use std::time::Duration;

use rppal::gpio::OutputPin;

use super::Result;

/// A binary output line, such as a multiplexer address pin.
pub trait DigitalOutput: Debug {
    /// Drive the line high (`true`) or low (`false`).
    fn set_level(&mut self, high: bool);
}

impl DigitalOutput for OutputPin {
    fn set_level(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }
}

/// A multi-channel analog-to-digital converter.
pub trait ADC: Debug {
    /// Number of input channels the converter provides.
    fn channels(&self) -> u8;

    /// Perform a single conversion on a channel and return the raw code.
    fn sample(&mut self, channel_no: u8) -> Result<u16>;
}

/// One analog input yielding raw conversion codes.
pub trait AnalogInput: Debug {
    /// Trigger one conversion and return its raw code.
    fn read_raw(&mut self) -> Result<u16>;
}

/// An ADC bound to one of its channels.
#[derive(Debug)]
pub struct ADCChannel<A> {
    adc: A,
    channel: u8,
}

impl<A: ADC> ADCChannel<A> {
    /// Bind `adc` to `channel`.
    ///
    /// Fails when the converter does not have that channel.
    pub fn new(adc: A, channel: u8) -> Result<ADCChannel<A>> {
        if channel >= adc.channels() {
            return Err(super::Error::NoSuchChannel(channel));
        }

        Ok(ADCChannel {
            adc,
            channel,
        })
    }

    /// Returns the bound channel number.
    pub fn channel(&self) -> u8 {
        self.channel
    }
}

impl<A: ADC> AnalogInput for ADCChannel<A> {
    fn read_raw(&mut self) -> Result<u16> {
        self.adc.sample(self.channel)
    }
}

/// Blocking delay capability.
pub trait Delay: Debug {
    /// Block for `us` microseconds.
    fn delay_us(&mut self, us: u32);

    /// Block for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32) {
        self.delay_us(ms.saturating_mul(1_000));
    }
}

/// Delay backed by sleeping the calling thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadDelay;

impl Delay for ThreadDelay {
    fn delay_us(&mut self, us: u32) {
        thread::sleep(Duration::from_micros(us as u64));
    }

    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(ms as u64));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Converter echoing the channel number back as the code.
    #[derive(Debug)]
    struct EchoADC;

    impl ADC for EchoADC {
        fn channels(&self) -> u8 {
            4
        }

        fn sample(&mut self, channel_no: u8) -> Result<u16> {
            Ok(channel_no as u16 * 100)
        }
    }

    #[test]
    fn channel_reads_its_own_input() {
        let mut input = ADCChannel::new(EchoADC, 3).unwrap();
        assert_eq!(input.channel(), 3);
        assert_eq!(input.read_raw().unwrap(), 300);
    }

    #[test]
    fn rejects_missing_channel() {
        assert!(matches!(ADCChannel::new(EchoADC, 4),
                         Err(crate::hw::Error::NoSuchChannel(4))));
    }
}
