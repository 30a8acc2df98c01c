//! Packet framing and synchronization.
//!
//! A transmitted packet is a sequence of PPM symbols:
//!
//! ```text
//! preamble | preamble | sfd0 | sfd1 | primary header (48 bits) | payload
//! ```
//!
//! The header and payload bits are carried `log2(chips_per_symbol)` bits per symbol. See
//! [Synchronizer] for locating packets in a received bit stream and [Packet::frame] for the
//! reverse.
mod packet;
mod synchronizer;
mod window;

pub use packet::*;
pub use synchronizer::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::modulation::Params;

/// Receiver state of a [Synchronizer].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum State {
    /// Looking for a preamble symbol at every bit offset.
    Scanning,
    /// One preamble symbol found.
    PreambleMatch1,
    /// Two or more preamble symbols found, waiting for the first start-of-frame delimiter.
    PreambleMatch2,
    /// First start-of-frame delimiter found.
    SfdMatch,
    /// Frame start confirmed, accumulating the primary header.
    HeaderRead,
    /// Accumulating the payload.
    DataRead,
}

/// Synchronization configuration.
///
/// # Example
/// ```
/// use ppm::framing::SyncConfig;
/// use ppm::modulation::Params;
///
/// let config = SyncConfig::builder()
///     .params(Params::new(16, 2).unwrap())
///     .threshold(3)
///     .build();
/// assert_eq!(config.preamble, 0);
/// ```
#[derive(TypedBuilder, Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub params: Params,
    /// Symbol value of the preamble, sent twice.
    #[builder(default = 0)]
    pub preamble: u32,
    /// Symbol value of the first start-of-frame delimiter.
    #[builder(default = 7)]
    pub sfd0: u32,
    /// Symbol value of the second start-of-frame delimiter.
    #[builder(default = 10)]
    pub sfd1: u32,
    /// Minimum peak chip value for a preamble to be detected while scanning. This is
    /// typically derived from the link budget.
    #[builder(default)]
    pub threshold: u32,
}

impl SyncConfig {
    /// Symbol values transmitted ahead of the primary header.
    #[must_use]
    pub fn sync_values(&self) -> [u32; 4] {
        [self.preamble, self.preamble, self.sfd0, self.sfd1]
    }

    /// Number of symbols carrying the primary header.
    #[must_use]
    pub fn header_symbols(&self) -> usize {
        self.params.symbols_for_bits(PrimaryHeader::LEN_BITS)
    }

    /// Number of symbols carrying a payload of `octets` bytes.
    #[must_use]
    pub fn payload_symbols(&self, octets: usize) -> usize {
        self.params.symbols_for_bits(octets * 8)
    }

    pub(crate) fn validate(&self) -> crate::Result<()> {
        let chips_per_symbol = self.params.chips_per_symbol();
        for (name, value) in [
            ("preamble", self.preamble),
            ("sfd0", self.sfd0),
            ("sfd1", self.sfd1),
        ] {
            if value as usize >= chips_per_symbol {
                return Err(crate::Error::Config(format!(
                    "{name} value {value} does not fit {chips_per_symbol} chips per symbol"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_counts() {
        let config = SyncConfig::builder()
            .params(Params::new(16, 2).unwrap())
            .build();
        assert_eq!(config.header_symbols(), 12);
        assert_eq!(config.payload_symbols(1), 2);
        assert_eq!(config.sync_values(), [0, 0, 7, 10]);

        let config = SyncConfig::builder()
            .params(Params::new(8, 1).unwrap())
            .preamble(1)
            .sfd0(2)
            .sfd1(3)
            .build();
        assert_eq!(config.header_symbols(), 16);
        assert_eq!(config.payload_symbols(2), 6);
    }

    #[test]
    fn defaults_do_not_fit_small_radix() {
        let config = SyncConfig::builder()
            .params(Params::new(4, 1).unwrap())
            .build();
        assert!(matches!(config.validate(), Err(crate::Error::Config(_))));
    }
}
