/*! In-memory stand-ins for the scanner's hardware.

These back the `--simulate` mode of the binary and the unit tests.
Every type here is cheaply clonable; clones share state, so a test can keep one clone to observe
while the scanner owns the other.
 */

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::hw::{self, AnalogInput, Delay, DigitalOutput};
use crate::output::{self, LineSink};

/// Digital line whose level can be observed through any clone.
#[derive(Clone, Debug, Default)]
pub struct SimLine {
    high: Rc<Cell<bool>>,
    writes: Rc<Cell<u32>>,
}

impl SimLine {
    /// Create a line, initially low.
    pub fn new() -> SimLine {
        SimLine::default()
    }

    /// Create `N` independent lines.
    pub fn bank<const N: usize>() -> [SimLine; N] {
        [(); N].map(|_| SimLine::new())
    }

    /// Returns the level last driven onto the line.
    pub fn is_high(&self) -> bool {
        self.high.get()
    }

    /// Returns how many times the line has been driven.
    pub fn writes(&self) -> u32 {
        self.writes.get()
    }
}

impl DigitalOutput for SimLine {
    fn set_level(&mut self, high: bool) {
        self.high.set(high);
        self.writes.set(self.writes.get() + 1);
    }
}

/// Analog input replaying a script of raw codes.
///
/// The script repeats once exhausted; an empty script reads as zero.
#[derive(Clone, Debug)]
pub struct SimAnalog {
    script: Rc<Vec<u16>>,
    reads: Rc<Cell<usize>>,
    fault_at: Option<usize>,
}

impl SimAnalog {
    /// Input replaying `script` in order.
    pub fn scripted(script: Vec<u16>) -> SimAnalog {
        SimAnalog {
            script: Rc::new(script),
            reads: Rc::new(Cell::new(0)),
            fault_at: None,
        }
    }

    /// Input always returning `raw`.
    pub fn constant(raw: u16) -> SimAnalog {
        SimAnalog::scripted(vec![raw])
    }

    /// Fail the conversion with the given zero-based index.
    pub fn with_fault_at(self, read_no: usize) -> SimAnalog {
        SimAnalog {
            fault_at: Some(read_no),
            ..self
        }
    }

    /// Returns the number of conversions requested so far.
    pub fn reads(&self) -> usize {
        self.reads.get()
    }
}

impl AnalogInput for SimAnalog {
    fn read_raw(&mut self) -> hw::Result<u16> {
        let read_no = self.reads.get();
        self.reads.set(read_no + 1);

        if self.fault_at == Some(read_no) {
            return Err(hw::Error::Simulated("conversion fault"));
        }

        if self.script.is_empty() {
            Ok(0)
        } else {
            Ok(self.script[read_no % self.script.len()])
        }
    }
}

/// Delay that advances a virtual clock instead of sleeping.
#[derive(Clone, Debug, Default)]
pub struct VirtualClock {
    elapsed_us: Rc<Cell<u64>>,
    delays: Rc<RefCell<Vec<u32>>>,
}

impl VirtualClock {
    /// Create a clock at time zero.
    pub fn new() -> VirtualClock {
        VirtualClock::default()
    }

    /// Returns the total time spent in delays, in microseconds.
    pub fn elapsed_us(&self) -> u64 {
        self.elapsed_us.get()
    }

    /// Returns every delay requested so far, in microseconds, in order.
    pub fn delays(&self) -> Vec<u32> {
        self.delays.borrow().clone()
    }
}

impl Delay for VirtualClock {
    fn delay_us(&mut self, us: u32) {
        self.elapsed_us.set(self.elapsed_us.get() + us as u64);
        self.delays.borrow_mut().push(us);
    }
}

/// Line sink collecting everything written to it.
#[derive(Clone, Debug)]
pub struct MemorySink {
    name: String,
    lines: Rc<RefCell<Vec<String>>>,
    failing: Rc<Cell<bool>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new(name: &str) -> MemorySink {
        MemorySink {
            name: name.to_string(),
            lines: Rc::new(RefCell::new(Vec::new())),
            failing: Rc::new(Cell::new(false)),
        }
    }

    /// Make subsequent writes fail (`true`) or succeed (`false`).
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    /// Returns a copy of the lines written so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }
}

impl LineSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_line(&mut self, line: &str) -> output::Result<()> {
        if self.failing.get() {
            return Err(output::Error::Disconnected(self.name.clone()));
        }
        self.lines.borrow_mut().push(line.to_string());
        Ok(())
    }
}
