/*! The acquisition loop.

One scan walks the outer multiplexer over the rows and, within each row, the inner multiplexer
over the columns, letting the analog path settle after every switch before sampling.
 */

use tracing::{debug, error, info};

use crate::config::ScanConfig;
use crate::hw::{self, AnalogInput, Delay, DigitalOutput};
use crate::matrix::{SensorMatrix, COLS, ROWS};
use crate::mux::Multiplexer;
use crate::output::FrameEmitter;
use crate::sample::{SampleAcquirer, VoltageScale};

/// Delays the scanner inserts between steps.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScanTiming {
    /// After each multiplexer switch, in microseconds.
    pub settle_us: u32,
    /// After each full scan, in milliseconds.
    pub scan_delay_ms: u32,
}

impl From<&ScanConfig> for ScanTiming {
    fn from(config: &ScanConfig) -> Self {
        ScanTiming {
            settle_us: config.settle_delay_us,
            scan_delay_ms: config.scan_delay_ms,
        }
    }
}

/// Owns the multiplexers, analog input and delay for the lifetime of the scan loop.
#[derive(Debug)]
pub struct MatrixScanner<P, A, D> {
    outer: Multiplexer<P>,
    inner: Multiplexer<P>,
    input: A,
    delay: D,
    acquirer: SampleAcquirer,
    timing: ScanTiming,
}

impl<P, A, D> MatrixScanner<P, A, D>
where
    P: DigitalOutput,
    A: AnalogInput,
    D: Delay,
{
    /// Assemble a scanner from its hardware.
    pub fn new(outer: Multiplexer<P>,
               inner: Multiplexer<P>,
               input: A,
               delay: D,
               acquirer: SampleAcquirer,
               timing: ScanTiming) -> MatrixScanner<P, A, D>
    {
        MatrixScanner {
            outer,
            inner,
            input,
            delay,
            acquirer,
            timing,
        }
    }

    /// Assemble a scanner with acquisition and timing taken from `config`.
    pub fn with_config(outer: Multiplexer<P>,
                       inner: Multiplexer<P>,
                       input: A,
                       delay: D,
                       config: &ScanConfig) -> MatrixScanner<P, A, D>
    {
        let scale = VoltageScale::new(config.reference_voltage, config.max_raw_code);
        let acquirer = SampleAcquirer::new(config.samples_per_point, config.sample_delay_us, scale);
        MatrixScanner::new(outer, inner, input, delay, acquirer, ScanTiming::from(config))
    }

    /// Sample every point of the grid once.
    ///
    /// A conversion failure abandons the scan.
    pub fn scan(&mut self) -> hw::Result<SensorMatrix> {
        let mut cells = [[0.0; COLS]; ROWS];

        for (row_no, row) in (1u8..).zip(cells.iter_mut()) {
            self.outer.select(row_no);
            self.delay.delay_us(self.timing.settle_us);

            for (col_no, cell) in (1u8..).zip(row.iter_mut()) {
                self.inner.select(col_no);
                self.delay.delay_us(self.timing.settle_us);

                *cell = self.acquirer.read_average_voltage(&mut self.input, &mut self.delay)?;
            }
        }

        Ok(SensorMatrix::from_rows(cells))
    }

    /// Run one cycle: scan, emit the frame, then wait the scan delay.
    ///
    /// The scan delay is observed even when the scan fails.
    pub fn cycle(&mut self, emitter: &mut FrameEmitter) -> hw::Result<SensorMatrix> {
        let result = self.scan();
        if let Ok(ref matrix) = result {
            let delivered = emitter.emit(&matrix.frame());
            debug!(delivered, sinks = emitter.sink_count(), "frame emitted");
        }
        self.delay.delay_ms(self.timing.scan_delay_ms);

        result
    }

    /// Announce startup on every sink, then cycle `cycles` times or forever.
    ///
    /// Failed cycles are logged and do not stop the loop. Returns the number of frames emitted.
    pub fn run(&mut self, emitter: &mut FrameEmitter, cycles: Option<u64>) -> u64 {
        emitter.announce();
        info!(outer = self.outer.label(), inner = self.inner.label(), "scanning");

        let mut completed = 0;
        let mut frames = 0;
        while cycles.map_or(true, |limit| completed < limit) {
            match self.cycle(emitter) {
                Ok(_) => frames += 1,
                Err(e) => error!(cycle = completed, "scan failed: {}", e),
            }
            completed += 1;
        }

        info!(cycles = completed, frames, "scanning stopped");
        frames
    }

    /// Returns the delay capability, e.g. to inspect a virtual clock.
    pub fn delay(&self) -> &D {
        &self.delay
    }
}
