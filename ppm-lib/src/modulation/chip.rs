use super::{BitOrder, Params};
use crate::{Bit, Error, Result};

/// Modulate a single symbol value into its chip pattern.
///
/// The result is `chips_per_symbol * bits_per_chip` bits long with a run of `bits_per_chip`
/// set bits at chip index `chips_per_symbol - 1 - value`. For [BitOrder::LsbFirst] the
/// entire sequence is reversed.
///
/// # Errors
/// [Error::InvalidSymbol] if `value >= chips_per_symbol`.
///
/// # Example
/// ```
/// use ppm::modulation::{encode_symbol, Params};
///
/// let params = Params::new(4, 2).unwrap();
/// let bits = encode_symbol(1, &params).unwrap();
/// assert_eq!(bits, [0, 0, 0, 0, 1, 1, 0, 0]);
/// ```
pub fn encode_symbol(value: u32, params: &Params) -> Result<Vec<Bit>> {
    let mut bits = Vec::with_capacity(params.bits_per_symbol());
    encode_symbol_into(value, params, &mut bits)?;
    Ok(bits)
}

pub(crate) fn encode_symbol_into(value: u32, params: &Params, dst: &mut Vec<Bit>) -> Result<()> {
    let chips_per_symbol = params.chips_per_symbol();
    let idx = value as usize;
    if idx >= chips_per_symbol {
        return Err(Error::InvalidSymbol {
            value,
            chips_per_symbol,
        });
    }
    let bits_per_chip = params.bits_per_chip();
    let start = dst.len();
    let leading = (chips_per_symbol - 1 - idx) * bits_per_chip;

    dst.resize(start + params.bits_per_symbol(), 0);
    dst[start + leading..start + leading + bits_per_chip].fill(1);
    if params.bit_order() == BitOrder::LsbFirst {
        dst[start..].reverse();
    }
    Ok(())
}

/// Value of a group of chip bits, most-significant bit first.
///
/// Groups wider than 32 bits keep only the trailing 32 bits.
#[must_use]
pub fn decode_chip_group(bits: &[Bit]) -> u32 {
    bits.iter().fold(0, |acc, b| (acc << 1) | u32::from(*b & 1))
}

/// Like [decode_chip_group] but reads `bits` last to first.
pub(crate) fn decode_chip_group_reversed(bits: &[Bit]) -> u32 {
    bits.iter()
        .rev()
        .fold(0, |acc, b| (acc << 1) | u32::from(*b & 1))
}

/// Split modulated bits into chip groups and decode each.
///
/// # Errors
/// [Error::Framing] if the number of bits is not a multiple of `bits_per_chip`.
pub fn bits_to_chips(bits: &[Bit], bits_per_chip: usize) -> Result<Vec<u32>> {
    if bits_per_chip == 0 || bits.len() % bits_per_chip != 0 {
        return Err(Error::Framing {
            len: bits.len(),
            chunk: bits_per_chip,
        });
    }
    Ok(bits.chunks(bits_per_chip).map(decode_chip_group).collect())
}
