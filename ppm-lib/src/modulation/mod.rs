//! Pulse-position modulation of symbol values.
//!
//! A symbol value `v` in a radix of `chips_per_symbol` is transmitted as `chips_per_symbol`
//! chips, each `bits_per_chip` bits wide, where only the chip at index
//! `chips_per_symbol - 1 - v` carries a pulse (all bits set). For example, with 4 chips per
//! symbol and 2 bits per chip the value 1 is sent as `00 00 11 00`.
mod chip;
mod demod;
mod symbol;

pub use chip::*;
pub use demod::*;
pub use symbol::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Transmission order of the bits making up a single symbol.
///
/// This only affects the order bits are sent on the wire. The mapping from chip index to
/// symbol value is fixed and is the same for both orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BitOrder {
    /// The first bit of the first chip is sent first.
    #[default]
    MsbFirst,
    /// The whole per-symbol bit sequence is reversed before transmission.
    LsbFirst,
}

/// Validated modulation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params {
    chips_per_symbol: usize,
    bits_per_chip: usize,
    bit_order: BitOrder,
}

impl Params {
    /// Chip values are held in a `u32`.
    pub const MAX_BITS_PER_CHIP: usize = 32;

    /// Create parameters using [BitOrder::MsbFirst].
    ///
    /// # Errors
    /// [Error::Config] if `chips_per_symbol` is not a power of two >= 2, or `bits_per_chip`
    /// is not in `1..=32`.
    pub fn new(chips_per_symbol: usize, bits_per_chip: usize) -> Result<Self> {
        if chips_per_symbol < 2 || !chips_per_symbol.is_power_of_two() {
            return Err(Error::Config(format!(
                "chips per symbol must be a power of two >= 2; got {chips_per_symbol}"
            )));
        }
        if bits_per_chip == 0 || bits_per_chip > Self::MAX_BITS_PER_CHIP {
            return Err(Error::Config(format!(
                "bits per chip must be in 1..={}; got {bits_per_chip}",
                Self::MAX_BITS_PER_CHIP
            )));
        }
        Ok(Params {
            chips_per_symbol,
            bits_per_chip,
            bit_order: BitOrder::default(),
        })
    }

    #[must_use]
    pub fn with_bit_order(mut self, bit_order: BitOrder) -> Self {
        self.bit_order = bit_order;
        self
    }

    #[must_use]
    pub fn chips_per_symbol(&self) -> usize {
        self.chips_per_symbol
    }

    #[must_use]
    pub fn bits_per_chip(&self) -> usize {
        self.bits_per_chip
    }

    #[must_use]
    pub fn bit_order(&self) -> BitOrder {
        self.bit_order
    }

    /// Number of modulated bits used to transmit one symbol.
    #[must_use]
    pub fn bits_per_symbol(&self) -> usize {
        self.chips_per_symbol * self.bits_per_chip
    }

    /// Number of data bits carried by one symbol, i.e., `log2(chips_per_symbol)`.
    #[must_use]
    pub fn bits_per_value(&self) -> usize {
        self.chips_per_symbol.trailing_zeros() as usize
    }

    /// Number of symbols required to carry `num_bits` data bits.
    #[must_use]
    pub fn symbols_for_bits(&self, num_bits: usize) -> usize {
        num_bits.div_ceil(self.bits_per_value())
    }

    /// Chip value of a pulse, i.e., all bits of the chip set.
    #[must_use]
    pub fn pulse(&self) -> u32 {
        u32::MAX >> (32 - self.bits_per_chip)
    }
}
