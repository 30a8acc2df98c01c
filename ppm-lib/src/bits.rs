//! Sequential bit sources.
//!
//! Received streams are handled as sequences of [Bit]s, one `u8` per bit holding 0 or 1.
use std::io::{self, BufReader, ErrorKind, Read};

use crate::{Error, Result};

/// A single bit, 0 or 1.
pub type Bit = u8;

/// Iterates over bits in ASCII text, e.g., rows of `0` and `1` characters as produced by
/// test-vector generators.
///
/// Whitespace, including newlines, is skipped. Any other character produces
/// [Error::InvalidBit] and ends iteration.
pub struct AsciiBits<R>
where
    R: Read,
{
    reader: BufReader<R>,
    num_read: usize,
    buf: [u8; 1],
    done: bool,
}

impl<R> AsciiBits<R>
where
    R: Read,
{
    pub fn new(reader: R) -> Self {
        AsciiBits {
            reader: BufReader::new(reader),
            num_read: 0,
            buf: [0u8; 1],
            done: false,
        }
    }

    /// Number of bits produced so far.
    pub fn offset(&self) -> usize {
        self.num_read
    }

    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        loop {
            match self.reader.read(&mut self.buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(self.buf[0])),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }
}

impl<R> Iterator for AsciiBits<R>
where
    R: Read,
{
    type Item = Result<Bit>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let b = match self.next_byte() {
                Ok(Some(b)) => b,
                Ok(None) => {
                    self.done = true;
                    return None;
                }
                Err(err) => {
                    self.done = true;
                    return Some(Err(Error::Io(err)));
                }
            };
            match b {
                b'0' | b'1' => {
                    self.num_read += 1;
                    return Some(Ok(b - b'0'));
                }
                b if b.is_ascii_whitespace() => continue,
                b => {
                    self.done = true;
                    return Some(Err(Error::InvalidBit(b)));
                }
            }
        }
    }
}

/// Creates an iterator of bits from ASCII `0`/`1` text.
pub fn read_ascii_bits<R: Read>(reader: R) -> AsciiBits<R> {
    AsciiBits::new(reader)
}

/// Parse a string of `0`/`1` characters, ignoring whitespace.
///
/// # Errors
/// [Error::InvalidBit] on any other character.
pub fn parse_bits(s: &str) -> Result<Vec<Bit>> {
    read_ascii_bits(s.as_bytes()).collect()
}

/// Unpack bytes into bits, most-significant bit first.
#[must_use]
pub fn unpack_bytes(dat: &[u8]) -> Vec<Bit> {
    let mut bits = Vec::with_capacity(dat.len() * 8);
    for byte in dat {
        for shift in (0..8).rev() {
            bits.push((byte >> shift) & 1);
        }
    }
    bits
}

/// Pack bits into bytes, most-significant bit first. A trailing partial byte is padded on
/// the right with zeros.
#[must_use]
pub fn pack_bits(bits: &[Bit]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |acc, (i, b)| acc | ((b & 1) << (7 - i)))
        })
        .collect()
}

/// Render bits as ASCII text with a newline after every `bits_per_row` bits.
///
/// A `bits_per_row` of 0 puts everything on a single row.
#[must_use]
pub fn format_rows(bits: &[Bit], bits_per_row: usize) -> String {
    let row_len = if bits_per_row == 0 {
        bits.len().max(1)
    } else {
        bits_per_row
    };
    let mut s = String::with_capacity(bits.len() + bits.len() / row_len + 1);
    for row in bits.chunks(row_len) {
        s.extend(row.iter().map(|b| if *b == 0 { '0' } else { '1' }));
        s.push('\n');
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_bits_skip_whitespace() {
        let dat = "0101\n1100\r\n 1";
        let mut bits = read_ascii_bits(dat.as_bytes());

        let first: Vec<Bit> = bits.by_ref().take(4).map(Result::unwrap).collect();
        assert_eq!(first, [0, 1, 0, 1]);
        assert_eq!(bits.offset(), 4);

        let rest: Vec<Bit> = bits.by_ref().map(Result::unwrap).collect();
        assert_eq!(rest, [1, 1, 0, 0, 1]);
        assert_eq!(bits.offset(), 9);
    }

    #[test]
    fn ascii_bits_invalid_character_ends_iteration() {
        let mut bits = read_ascii_bits("01x1".as_bytes());
        assert_eq!(bits.next().unwrap().unwrap(), 0);
        assert_eq!(bits.next().unwrap().unwrap(), 1);
        assert!(matches!(bits.next(), Some(Err(Error::InvalidBit(b'x')))));
        assert!(bits.next().is_none());
    }

    #[test]
    fn ascii_bits_empty() {
        assert!(read_ascii_bits(&b""[..]).next().is_none());
    }

    #[test]
    fn parse() {
        assert_eq!(parse_bits("10 01").unwrap(), vec![1, 0, 0, 1]);
        assert!(parse_bits("102").is_err());
    }

    #[test]
    fn unpack_and_pack() {
        let bits = unpack_bytes(&[0xa5, 0x01]);
        assert_eq!(bits, [1, 0, 1, 0, 0, 1, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(pack_bits(&bits), vec![0xa5, 0x01]);
        assert_eq!(pack_bits(&[1, 1]), vec![0xc0]);
    }

    #[test]
    fn rows() {
        assert_eq!(format_rows(&[0, 1, 1, 0, 1], 2), "01\n10\n1\n");
        assert_eq!(format_rows(&[1, 0], 0), "10\n");
        assert_eq!(format_rows(&[], 4), "");
    }
}
