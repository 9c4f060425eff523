/*! Channel selection for 16-channel analog multiplexers.

A CD4067-style multiplexer connects one of sixteen lines to its common pin according to the
4-bit address presented on S0..S3.
Channels are numbered from 1 here, matching the sensor grid's rows and columns.
 */

use tracing::{trace, warn};

use crate::hw::DigitalOutput;

/// Number of address lines on one multiplexer.
pub const ADDRESS_LINES: usize = 4;

/// Highest 1-based channel number the address lines can express.
pub const MAX_CHANNEL: u8 = 1 << ADDRESS_LINES;

/// Returns the 4-bit address code for a 1-based channel number.
///
/// Channels outside 1..=16 wrap: bits beyond the address width are dropped, so 17 aliases 1
/// and 0 aliases 16.
pub fn address_code(channel: u8) -> u8 {
    channel.wrapping_sub(1) & (MAX_CHANNEL - 1)
}

/// Drive a 1-based channel's address onto four address lines, least significant bit on `lines[0]`.
pub fn select_channel<P: DigitalOutput>(lines: &mut [P; ADDRESS_LINES], channel: u8) {
    if channel == 0 || channel > MAX_CHANNEL {
        warn!(channel, code = address_code(channel), "channel outside 1..=16; address wraps");
    }

    let code = address_code(channel);
    for (bit, line) in lines.iter_mut().enumerate() {
        line.set_level((code >> bit) & 0x01 == 1);
    }
}

/// A multiplexer and the four lines addressing it.
#[derive(Debug)]
pub struct Multiplexer<P> {
    label: &'static str,
    lines: [P; ADDRESS_LINES],
}

impl<P: DigitalOutput> Multiplexer<P> {
    /// Create a multiplexer from its S0..S3 lines, in that order.
    pub fn new(label: &'static str, lines: [P; ADDRESS_LINES]) -> Multiplexer<P> {
        Multiplexer {
            label,
            lines,
        }
    }

    /// Connect the given 1-based channel.
    pub fn select(&mut self, channel: u8) {
        trace!(mux = self.label, channel, "select");
        select_channel(&mut self.lines, channel);
    }

    /// Returns the multiplexer's label.
    pub fn label(&self) -> &'static str {
        self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimLine;

    fn levels(lines: &[SimLine; ADDRESS_LINES]) -> [u8; ADDRESS_LINES] {
        let mut out = [0; ADDRESS_LINES];
        for (level, line) in out.iter_mut().zip(lines.iter()) {
            *level = line.is_high() as u8;
        }
        out
    }

    #[test]
    fn known_addresses() {
        let mut lines = SimLine::bank::<4>();

        select_channel(&mut lines, 1);
        assert_eq!(levels(&lines), [0, 0, 0, 0]);

        select_channel(&mut lines, 6);
        assert_eq!(levels(&lines), [1, 0, 1, 0]);

        select_channel(&mut lines, 16);
        assert_eq!(levels(&lines), [1, 1, 1, 1]);
    }

    #[test]
    fn every_channel_drives_its_binary_code() {
        let mut lines = SimLine::bank::<4>();
        for channel in 1..=MAX_CHANNEL {
            select_channel(&mut lines, channel);
            let code = channel - 1;
            for bit in 0..ADDRESS_LINES {
                assert_eq!(lines[bit].is_high(), (code >> bit) & 1 == 1,
                           "channel {} bit {}", channel, bit);
            }
        }
    }

    #[test]
    fn drives_all_four_lines_every_time() {
        let mut lines = SimLine::bank::<4>();
        select_channel(&mut lines, 1);
        select_channel(&mut lines, 1);
        assert!(lines.iter().all(|line| line.writes() == 2));
    }

    #[test]
    fn repeated_selection_is_stable() {
        let mut lines = SimLine::bank::<4>();
        select_channel(&mut lines, 11);
        let first = levels(&lines);
        select_channel(&mut lines, 11);
        assert_eq!(levels(&lines), first);
    }

    #[test]
    fn out_of_range_channels_wrap() {
        assert_eq!(address_code(17), address_code(1));
        assert_eq!(address_code(0), 0x0F);
        assert_eq!(address_code(20), 3);

        let mut lines = SimLine::bank::<4>();
        select_channel(&mut lines, 0);
        assert_eq!(levels(&lines), [1, 1, 1, 1]);
    }

    #[test]
    fn multiplexer_selects_through_its_lines() {
        let lines = SimLine::bank::<4>();
        let observed = lines.clone();
        let mut mux = Multiplexer::new("rows", lines);
        mux.select(3);
        assert_eq!(levels(&observed), [0, 1, 0, 0]);
        assert_eq!(mux.label(), "rows");
    }
}
