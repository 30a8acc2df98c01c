#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{
    chip::{decode_chip_group, decode_chip_group_reversed},
    BitOrder, Params,
};
use crate::{Bit, Error, Result};

/// Symbol values recovered from modulated bits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Demodulated {
    /// One value per symbol, in order received.
    pub values: Vec<u32>,
    /// Whether the peak chip of the symbol at the same index reached the threshold, i.e.,
    /// whether it is considered a pulse rather than noise.
    pub threshold_met: Vec<bool>,
}

/// Demodulate a single symbol's worth of bits, returning the symbol value and the peak
/// chip value.
///
/// The value is `chips_per_symbol - 1 - i` where `i` is the index of the largest chip. If
/// more than one chip holds the largest value the first one wins.
///
/// # Errors
/// [Error::Framing] if `bits` is not exactly one symbol long.
pub fn demodulate_symbol(bits: &[Bit], params: &Params) -> Result<(u32, u32)> {
    if bits.len() != params.bits_per_symbol() {
        return Err(Error::Framing {
            len: bits.len(),
            chunk: params.bits_per_symbol(),
        });
    }
    let (idx, peak) = peak_chip(bits, params);
    Ok(((params.chips_per_symbol() - 1 - idx) as u32, peak))
}

/// Index and value of the largest chip in a symbol, first occurrence wins.
fn peak_chip(bits: &[Bit], params: &Params) -> (usize, u32) {
    let bits_per_chip = params.bits_per_chip();
    let mut best = (0, 0);
    for idx in 0..params.chips_per_symbol() {
        let chip = match params.bit_order() {
            BitOrder::MsbFirst => {
                let start = idx * bits_per_chip;
                decode_chip_group(&bits[start..start + bits_per_chip])
            }
            // Chip `idx` of the un-reversed symbol is read from the end of the window.
            BitOrder::LsbFirst => {
                let end = bits.len() - idx * bits_per_chip;
                decode_chip_group_reversed(&bits[end - bits_per_chip..end])
            }
        };
        if idx == 0 || chip > best.1 {
            best = (idx, chip);
        }
    }
    best
}

/// Demodulate bits into symbol values.
///
/// `threshold` is the minimum peak chip value for a symbol to be considered signal rather
/// than noise. A threshold of 0 accepts everything.
///
/// # Errors
/// [Error::Framing] if the number of bits is not a multiple of
/// `chips_per_symbol * bits_per_chip`.
///
/// # Example
/// ```
/// use ppm::modulation::{demodulate, encode_symbols, Params};
///
/// let params = Params::new(16, 4).unwrap();
/// let values: Vec<u32> = (0..16).collect();
/// let bits = encode_symbols(&values, &params).unwrap();
/// let demod = demodulate(&bits, &params, 0).unwrap();
/// assert_eq!(demod.values, values);
/// ```
pub fn demodulate(bits: &[Bit], params: &Params, threshold: u32) -> Result<Demodulated> {
    let bits_per_symbol = params.bits_per_symbol();
    if bits.len() % bits_per_symbol != 0 {
        return Err(Error::Framing {
            len: bits.len(),
            chunk: bits_per_symbol,
        });
    }

    let num_symbols = bits.len() / bits_per_symbol;
    let mut demod = Demodulated {
        values: Vec::with_capacity(num_symbols),
        threshold_met: Vec::with_capacity(num_symbols),
    };
    for symbol in bits.chunks(bits_per_symbol) {
        let (value, peak) = demodulate_symbol(symbol, params)?;
        demod.values.push(value);
        demod.threshold_met.push(peak >= threshold);
    }
    Ok(demod)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modulation::{encode_symbol, encode_symbols};
    use test_case::test_case;

    #[test_case(2, 1, BitOrder::MsbFirst)]
    #[test_case(4, 2, BitOrder::MsbFirst)]
    #[test_case(16, 2, BitOrder::MsbFirst)]
    #[test_case(16, 2, BitOrder::LsbFirst)]
    #[test_case(64, 3, BitOrder::LsbFirst)]
    #[test_case(8, 32, BitOrder::MsbFirst)]
    fn every_value_survives_modulation(
        chips_per_symbol: usize,
        bits_per_chip: usize,
        order: BitOrder,
    ) {
        let params = Params::new(chips_per_symbol, bits_per_chip)
            .unwrap()
            .with_bit_order(order);
        for value in 0..chips_per_symbol as u32 {
            let bits = encode_symbol(value, &params).unwrap();
            let (zult, peak) = demodulate_symbol(&bits, &params).unwrap();
            assert_eq!(zult, value);
            assert_eq!(peak, params.pulse());
        }
    }

    #[test]
    fn full_radix_fixture() {
        let params = Params::new(16, 4).unwrap();
        let values: Vec<u32> = (0..16).collect();
        let bits = encode_symbols(&values, &params).unwrap();
        let demod = demodulate(&bits, &params, 0).unwrap();
        assert_eq!(demod.values, values);
        assert!(demod.threshold_met.iter().all(|m| *m));
    }

    #[test]
    fn bad_length_is_framing_error() {
        let params = Params::new(4, 2).unwrap();
        let zult = demodulate(&[0; 9], &params, 0);
        assert!(
            matches!(zult, Err(Error::Framing { len: 9, chunk: 8 })),
            "got {zult:?}"
        );
    }

    #[test]
    fn ties_resolve_to_first_chip() {
        let params = Params::new(4, 2).unwrap();
        // chips 1, 3, 3, 0
        let bits = [0, 1, 1, 1, 1, 1, 0, 0];
        let (value, peak) = demodulate_symbol(&bits, &params).unwrap();
        assert_eq!(value, 2);
        assert_eq!(peak, 3);

        // all zero, chip 0 wins
        let (value, peak) = demodulate_symbol(&[0; 8], &params).unwrap();
        assert_eq!(value, 3);
        assert_eq!(peak, 0);
    }

    #[test]
    fn noisy_chip_below_threshold() {
        let params = Params::new(4, 2).unwrap();
        // chips 0, 0, 2, 1
        let bits = [0, 0, 0, 0, 1, 0, 0, 1];
        let demod = demodulate(&bits, &params, 3).unwrap();
        assert_eq!(demod.values, vec![1]);
        assert_eq!(demod.threshold_met, vec![false]);

        let demod = demodulate(&bits, &params, 2).unwrap();
        assert_eq!(demod.threshold_met, vec![true]);
    }

    #[test]
    fn empty_input() {
        let params = Params::new(4, 2).unwrap();
        let demod = demodulate(&[], &params, 0).unwrap();
        assert_eq!(demod, Demodulated::default());
    }
}
