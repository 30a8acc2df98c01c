use std::collections::VecDeque;

use crate::bits::Bit;
use crate::modulation::{BitOrder, Params};

/// Sliding window over the last `bits_per_symbol` received bits that can be demodulated
/// at any bit offset.
///
/// Rather than re-decoding every chip of the window on each bit, the value of the chip
/// ending at the newest bit is computed from a rolling register, and the window maximum is
/// kept in one monotonic deque per chip phase (bit offset modulo `bits_per_chip`). The
/// chips of the current window all share the phase of the newest bit, so a decode only
/// looks at the front of that phase's deque.
///
/// Decoding gives the same value and peak as [crate::modulation::demodulate_symbol] over
/// the same bits, including its tie-breaking.
#[derive(Debug, Clone)]
pub(crate) struct SymbolWindow {
    chips_per_symbol: usize,
    bits_per_chip: usize,
    bit_order: BitOrder,
    /// Value of the chip ending at the newest bit, in transmission-corrected bit order.
    rolling: u64,
    mask: u64,
    /// Bits pushed since the last clear.
    seen: usize,
    /// (bit position of chip end, chip value), values decreasing front to back.
    phases: Vec<VecDeque<(usize, u32)>>,
}

impl SymbolWindow {
    pub fn new(params: &Params) -> Self {
        SymbolWindow {
            chips_per_symbol: params.chips_per_symbol(),
            bits_per_chip: params.bits_per_chip(),
            bit_order: params.bit_order(),
            rolling: 0,
            mask: u64::from(params.pulse()),
            seen: 0,
            phases: (0..params.bits_per_chip())
                .map(|_| VecDeque::with_capacity(params.chips_per_symbol()))
                .collect(),
        }
    }

    fn bits_per_symbol(&self) -> usize {
        self.chips_per_symbol * self.bits_per_chip
    }

    /// True once a full symbol's worth of bits has been pushed.
    pub fn is_full(&self) -> bool {
        self.seen >= self.bits_per_symbol()
    }

    pub fn clear(&mut self) {
        self.rolling = 0;
        self.seen = 0;
        for phase in &mut self.phases {
            phase.clear();
        }
    }

    pub fn push(&mut self, bit: Bit) {
        let pos = self.seen;
        self.seen += 1;
        let bit = u64::from(bit & 1);

        self.rolling = match self.bit_order {
            BitOrder::MsbFirst => ((self.rolling << 1) | bit) & self.mask,
            // The symbol is read reversed, so the newest bit is the most significant.
            BitOrder::LsbFirst => (self.rolling >> 1) | (bit << (self.bits_per_chip - 1)),
        };
        if self.seen < self.bits_per_chip {
            return;
        }

        let chip = self.rolling as u32;
        let bits_per_symbol = self.bits_per_symbol();
        let bit_order = self.bit_order;
        let phase = &mut self.phases[pos % self.bits_per_chip];
        while phase
            .front()
            .is_some_and(|(end, _)| end + bits_per_symbol <= pos)
        {
            phase.pop_front();
        }
        // Ties go to the first chip of the canonical order: the oldest chip for MSB-first
        // and the newest for LSB-first.
        while phase.back().is_some_and(|(_, value)| match bit_order {
            BitOrder::MsbFirst => *value < chip,
            BitOrder::LsbFirst => *value <= chip,
        }) {
            phase.pop_back();
        }
        phase.push_back((pos, chip));
    }

    /// Demodulate the window, returning the symbol value and peak chip value, or `None`
    /// if the window is not yet full.
    pub fn decode(&self) -> Option<(u32, u32)> {
        if !self.is_full() {
            return None;
        }
        let pos = self.seen - 1;
        let (end, peak) = *self.phases[pos % self.bits_per_chip].front()?;
        // Number of chips between the peak and the newest chip.
        let age = (pos - end) / self.bits_per_chip;
        let value = match self.bit_order {
            BitOrder::MsbFirst => age,
            BitOrder::LsbFirst => self.chips_per_symbol - 1 - age,
        };
        Some((value as u32, peak))
    }
}
