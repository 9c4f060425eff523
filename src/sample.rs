//! Averaged voltage acquisition from a single analog input.

use crate::hw::{self, AnalogInput, Delay};

/// Linear conversion from raw converter codes to volts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoltageScale {
    reference: f64,
    max_raw_code: u16,
}

impl VoltageScale {
    /// Create a scale mapping `max_raw_code` to `reference` volts.
    pub fn new(reference: f64, max_raw_code: u16) -> VoltageScale {
        VoltageScale {
            reference,
            max_raw_code,
        }
    }

    /// Convert a raw code to volts.
    ///
    /// Codes above the maximum are not clamped.
    pub fn volts(&self, raw: u16) -> f64 {
        raw as f64 * (self.reference / self.max_raw_code as f64)
    }
}

/// Takes several conversions at one input and averages them.
#[derive(Clone, Copy, Debug)]
pub struct SampleAcquirer {
    samples: u32,
    sample_delay_us: u32,
    scale: VoltageScale,
}

impl SampleAcquirer {
    /// Create an acquirer averaging `samples` conversions spaced `sample_delay_us` apart.
    ///
    /// `samples` must be non-zero.
    pub fn new(samples: u32, sample_delay_us: u32, scale: VoltageScale) -> SampleAcquirer {
        SampleAcquirer {
            samples,
            sample_delay_us,
            scale,
        }
    }

    /// Read the input `samples` times and return the mean voltage.
    ///
    /// Each conversion is followed by the inter-sample delay, including the last.
    pub fn read_average_voltage<A, D>(&self, input: &mut A, delay: &mut D) -> hw::Result<f64>
    where
        A: AnalogInput,
        D: Delay,
    {
        let mut sum = 0.0;
        for _ in 0..self.samples {
            sum += self.scale.volts(input.read_raw()?);
            delay.delay_us(self.sample_delay_us);
        }

        Ok(sum / self.samples as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimAnalog, VirtualClock};

    fn default_scale() -> VoltageScale {
        VoltageScale::new(3.3, 4095)
    }

    #[test]
    fn scale_endpoints() {
        let scale = default_scale();
        assert_eq!(scale.volts(0), 0.0);
        assert!((scale.volts(4095) - 3.3).abs() < 1e-12);
    }

    #[test]
    fn averages_converted_readings() {
        let scale = default_scale();
        let acquirer = SampleAcquirer::new(3, 10, scale);
        let mut input = SimAnalog::scripted(vec![0, 4095, 2048]);
        let mut clock = VirtualClock::new();

        let volts = acquirer.read_average_voltage(&mut input, &mut clock).unwrap();
        let expected = (scale.volts(0) + scale.volts(4095) + scale.volts(2048)) / 3.0;
        assert!((volts - expected).abs() < 1e-6);
        assert!((volts - 1.650134).abs() < 1e-6);
    }

    #[test]
    fn waits_after_every_conversion() {
        let acquirer = SampleAcquirer::new(3, 10, default_scale());
        let mut input = SimAnalog::constant(100);
        let mut clock = VirtualClock::new();

        acquirer.read_average_voltage(&mut input, &mut clock).unwrap();
        assert_eq!(input.reads(), 3);
        assert_eq!(clock.delays(), vec![10, 10, 10]);
    }

    #[test]
    fn out_of_range_codes_pass_through() {
        let acquirer = SampleAcquirer::new(1, 0, default_scale());
        let mut input = SimAnalog::constant(8190);
        let mut clock = VirtualClock::new();

        let volts = acquirer.read_average_voltage(&mut input, &mut clock).unwrap();
        assert!((volts - 6.6).abs() < 1e-9);
    }

    #[test]
    fn conversion_failure_propagates() {
        let acquirer = SampleAcquirer::new(3, 10, default_scale());
        let mut input = SimAnalog::constant(1).with_fault_at(2);
        let mut clock = VirtualClock::new();

        assert!(acquirer.read_average_voltage(&mut input, &mut clock).is_err());
    }
}
