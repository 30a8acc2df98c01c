use std::fmt::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::SyncConfig;
use crate::bits::{pack_bits, unpack_bytes, Bit};
use crate::modulation::{bits_to_symbol_values, encode_symbols};
use crate::Result;

/// Packet primary header.
///
/// Transmitted big-endian as 3 bits version, 13 bits id, 16 bits sequence control and
/// 16 bits data length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PrimaryHeader {
    pub version: u8,
    pub id: u16,
    pub seq_control: u16,
    /// Number of payload octets minus 1.
    pub data_length: u16,
}

impl PrimaryHeader {
    /// Size of a `PrimaryHeader` in bits.
    pub const LEN_BITS: usize = 48;
    pub const VERSION_MAX: u8 = 0x7;
    pub const ID_MAX: u16 = 0x1fff;

    /// Decode from bits. Returns `None` if there are not enough bits to construct the
    /// header. Bits beyond the header are ignored.
    #[must_use]
    pub fn decode(bits: &[Bit]) -> Option<Self> {
        if bits.len() < Self::LEN_BITS {
            return None;
        }
        let x = bits[..Self::LEN_BITS]
            .iter()
            .fold(0u64, |acc, b| (acc << 1) | u64::from(*b & 1));

        Some(PrimaryHeader {
            version: (x >> 45 & 0x7) as u8,
            id: (x >> 32 & 0x1fff) as u16,
            seq_control: (x >> 16 & 0xffff) as u16,
            data_length: (x & 0xffff) as u16,
        })
    }

    /// Encode to bits. Version and id are masked to their field widths.
    #[must_use]
    pub fn encode(&self) -> Vec<Bit> {
        let x = u64::from(self.version & Self::VERSION_MAX) << 45
            | u64::from(self.id & Self::ID_MAX) << 32
            | u64::from(self.seq_control) << 16
            | u64::from(self.data_length);
        (0..Self::LEN_BITS)
            .rev()
            .map(|shift| (x >> shift & 1) as Bit)
            .collect()
    }

    /// Number of payload octets indicated by this header.
    #[must_use]
    pub fn octets(&self) -> usize {
        self.data_length as usize + 1
    }
}

/// A single decoded packet.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Packet {
    pub header: PrimaryHeader,
    /// Payload bits, `header.octets() * 8` of them for a decoded packet.
    pub payload: Vec<Bit>,
}

impl Display for Packet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Packet{{header: {:?}, payload:[len={}]}}",
            self.header,
            self.payload.len()
        )
    }
}

impl Packet {
    /// Construct a packet carrying `data`, with the header data length set to match.
    ///
    /// Returns `None` if `data` is empty or longer than 65536 bytes, neither of which can
    /// be represented by the data length field.
    #[must_use]
    pub fn from_bytes(version: u8, id: u16, seq_control: u16, data: &[u8]) -> Option<Self> {
        let data_length = u16::try_from(data.len().checked_sub(1)?).ok()?;
        Some(Packet {
            header: PrimaryHeader {
                version: version & PrimaryHeader::VERSION_MAX,
                id: id & PrimaryHeader::ID_MAX,
                seq_control,
                data_length,
            },
            payload: unpack_bytes(data),
        })
    }

    /// Payload packed into bytes, most-significant bit first.
    #[must_use]
    pub fn payload_bytes(&self) -> Vec<u8> {
        pack_bits(&self.payload)
    }

    /// Modulate this packet, including preamble and start-of-frame delimiters, into the
    /// bits a receiver would see.
    ///
    /// The payload is zero-padded or truncated to the length indicated by the header.
    ///
    /// # Errors
    /// [crate::Error::InvalidSymbol] if a sync value in `config` does not fit the radix.
    pub fn frame(&self, config: &SyncConfig) -> Result<Vec<Bit>> {
        let params = &config.params;
        let mut payload = self.payload.clone();
        payload.resize(self.header.octets() * 8, 0);

        let mut values = config.sync_values().to_vec();
        values.extend(bits_to_symbol_values(&self.header.encode(), params));
        values.extend(bits_to_symbol_values(&payload, params));

        encode_symbols(&values, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modulation::{demodulate, symbol_values_to_bits, Params};

    #[test]
    fn decode_header() {
        let bits = unpack_bytes(&[
            0xbf, 0xff, // version 5, id 8191
            0x40, 0x00, // seq control 0x4000
            0x00, 0x02, // data length 2
        ]);
        let header = PrimaryHeader::decode(&bits).unwrap();

        assert_eq!(header.version, 5);
        assert_eq!(header.id, 8191);
        assert_eq!(header.seq_control, 0x4000);
        assert_eq!(header.data_length, 2);
        assert_eq!(header.octets(), 3);
        assert_eq!(header.encode(), bits);
    }

    #[test]
    fn decode_header_is_none_when_too_short() {
        assert!(PrimaryHeader::decode(&[0; 47]).is_none());
    }

    #[test]
    fn encode_masks_oversized_fields() {
        let header = PrimaryHeader {
            version: 0xff,
            id: 0xffff,
            seq_control: 1,
            data_length: 0,
        };
        let zult = PrimaryHeader::decode(&header.encode()).unwrap();
        assert_eq!(zult.version, 7);
        assert_eq!(zult.id, 0x1fff);
        assert_eq!(zult.seq_control, 1);
    }

    #[test]
    fn from_bytes_sets_data_length() {
        let packet = Packet::from_bytes(1, 2, 3, &[0xaa, 0x55]).unwrap();
        assert_eq!(packet.header.data_length, 1);
        assert_eq!(packet.payload.len(), 16);
        assert_eq!(packet.payload_bytes(), vec![0xaa, 0x55]);

        assert!(Packet::from_bytes(1, 2, 3, &[]).is_none());
        assert!(Packet::from_bytes(1, 2, 3, &vec![0u8; 65537]).is_none());
        assert!(Packet::from_bytes(1, 2, 3, &vec![0u8; 65536]).is_some());
    }

    #[test]
    fn frame_layout() {
        let config = SyncConfig::builder()
            .params(Params::new(16, 2).unwrap())
            .build();
        let packet = Packet::from_bytes(0, 0x1fff, 0x4000, &[0x3c]).unwrap();
        let bits = packet.frame(&config).unwrap();

        // 4 sync + 12 header + 2 payload symbols
        assert_eq!(bits.len(), 18 * 32);

        let values = demodulate(&bits, &config.params, 3).unwrap().values;
        assert_eq!(&values[..4], &[0, 0, 7, 10]);
        let header_bits = symbol_values_to_bits(&values[4..16], &config.params);
        assert_eq!(PrimaryHeader::decode(&header_bits), Some(packet.header));
        assert_eq!(&values[16..], &[0x3, 0xc]);
    }

    #[test]
    fn frame_pads_short_payload() {
        let config = SyncConfig::builder()
            .params(Params::new(16, 1).unwrap())
            .build();
        let packet = Packet {
            header: PrimaryHeader {
                data_length: 1,
                ..Default::default()
            },
            payload: vec![1, 1, 1, 1],
        };
        let bits = packet.frame(&config).unwrap();
        let values = demodulate(&bits, &config.params, 0).unwrap().values;
        assert_eq!(&values[16..], &[0xf, 0, 0, 0]);
    }
}
