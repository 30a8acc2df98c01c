use super::{chip::encode_symbol_into, Params};
use crate::{Bit, Result};

/// Modulate a sequence of symbol values, preserving their order.
///
/// # Errors
/// [crate::Error::InvalidSymbol] if any value is `>= chips_per_symbol`.
///
/// # Example
/// ```
/// use ppm::modulation::{encode_symbols, Params};
///
/// let params = Params::new(4, 2).unwrap();
/// let bits = encode_symbols(&[1, 2, 3], &params).unwrap();
/// assert_eq!(
///     bits,
///     [0, 0, 0, 0, 1, 1, 0, 0, 0, 0, 1, 1, 0, 0, 0, 0, 1, 1, 0, 0, 0, 0, 0, 0]
/// );
/// ```
pub fn encode_symbols(values: &[u32], params: &Params) -> Result<Vec<Bit>> {
    let mut bits = Vec::with_capacity(values.len() * params.bits_per_symbol());
    for value in values {
        encode_symbol_into(*value, params, &mut bits)?;
    }
    Ok(bits)
}

/// Group data bits into symbol values.
///
/// Each value is formed from `log2(chips_per_symbol)` bits, most-significant bit first. If
/// the number of bits is not a multiple of the group size the trailing partial group is
/// padded on the right with zeros, e.g., for 16 chips per symbol `[1, 0]` becomes
/// `[1, 0, 0, 0]`, the value 8.
///
/// This is the symbol index encoding of data, not the chip encoding; see [encode_symbols].
#[must_use]
pub fn bits_to_symbol_values(bits: &[Bit], params: &Params) -> Vec<u32> {
    let width = params.bits_per_value();
    bits.chunks(width)
        .map(|group| {
            let value = group
                .iter()
                .fold(0u32, |acc, b| (acc << 1) | u32::from(*b & 1));
            value << (width - group.len())
        })
        .collect()
}

/// Expand symbol values into `log2(chips_per_symbol)` data bits each, most-significant bit
/// first. The inverse of [bits_to_symbol_values] up to padding.
#[must_use]
pub fn symbol_values_to_bits(values: &[u32], params: &Params) -> Vec<Bit> {
    let width = params.bits_per_value();
    let mut bits = Vec::with_capacity(values.len() * width);
    for value in values {
        for shift in (0..width).rev() {
            bits.push(((value >> shift) & 1) as Bit);
        }
    }
    bits
}

/// Modulate a data bit stream, grouping it into symbol values first.
///
/// # Errors
/// Never for valid [Params], values formed from `log2(chips_per_symbol)` bits are always
/// in range.
pub fn encode_bits(bits: &[Bit], params: &Params) -> Result<Vec<Bit>> {
    encode_symbols(&bits_to_symbol_values(bits, params), params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modulation::BitOrder;

    #[test]
    fn encode_fixture() {
        let params = Params::new(4, 2).unwrap();
        let bits = encode_symbols(&[1, 2, 3], &params).unwrap();
        let expected: Vec<Bit> = [
            [0, 0, 0, 0, 1, 1, 0, 0],
            [0, 0, 1, 1, 0, 0, 0, 0],
            [1, 1, 0, 0, 0, 0, 0, 0],
        ]
        .concat();
        assert_eq!(bits, expected);
    }

    #[test]
    fn encode_bits_matches_values() {
        let params = Params::new(4, 2).unwrap();
        let bits = encode_bits(&[0, 1, 1, 0, 1, 1], &params).unwrap();
        assert_eq!(bits, encode_symbols(&[1, 2, 3], &params).unwrap());
    }

    #[test]
    fn encode_bits_lsb_first_reverses_each_symbol() {
        let params = Params::new(4, 2).unwrap().with_bit_order(BitOrder::LsbFirst);
        let bits = encode_bits(&[0, 1, 1, 0, 1, 1], &params).unwrap();
        let expected: Vec<Bit> = [
            [0, 0, 1, 1, 0, 0, 0, 0],
            [0, 0, 0, 0, 1, 1, 0, 0],
            [0, 0, 0, 0, 0, 0, 1, 1],
        ]
        .concat();
        assert_eq!(bits, expected);
    }

    #[test]
    fn encode_empty() {
        let params = Params::new(2, 1).unwrap();
        assert!(encode_symbols(&[], &params).unwrap().is_empty());
    }

    #[test]
    fn encode_stops_at_invalid_value() {
        let params = Params::new(4, 1).unwrap();
        assert!(encode_symbols(&[0, 4, 1], &params).is_err());
    }

    #[test]
    fn symbol_values_msb_first() {
        let params = Params::new(16, 1).unwrap();
        let values = bits_to_symbol_values(&[0, 0, 0, 1, 1, 0, 1, 0], &params);
        assert_eq!(values, vec![1, 10]);
    }

    #[test]
    fn symbol_values_pad_partial_group_on_right() {
        let params = Params::new(16, 1).unwrap();
        let values = bits_to_symbol_values(&[1, 1, 1, 1, 1, 0], &params);
        assert_eq!(values, vec![15, 8]);

        let params = Params::new(8, 1).unwrap();
        let values = bits_to_symbol_values(&[1], &params);
        assert_eq!(values, vec![4]);
    }

    #[test]
    fn symbol_values_to_bits_expands_each_value() {
        let params = Params::new(8, 2).unwrap();
        let bits = symbol_values_to_bits(&[5, 2], &params);
        assert_eq!(bits, vec![1, 0, 1, 0, 1, 0]);
        assert_eq!(bits_to_symbol_values(&bits, &params), vec![5, 2]);
    }
}
