use std::io::Read;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::window::SymbolWindow;
use super::{Packet, PrimaryHeader, State, SyncConfig};
use crate::bits::{read_ascii_bits, Bit};
use crate::modulation::symbol_values_to_bits;
use crate::{Error, Result};

/// A packet located in a bit stream along with information regarding how it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SyncedPacket {
    pub packet: Packet,
    /// Bit offset in the stream of the first bit of the first preamble symbol.
    pub offset: usize,
    /// Peak chip value observed when the preamble was detected.
    pub peak: u32,
    /// Threshold in effect when the preamble was detected.
    pub threshold: u32,
}

/// Result of feeding a single bit to a [Synchronizer].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Bit consumed, no packet completed.
    Pending,
    /// A symbol did not match what the state expected. Any accumulated data was dropped
    /// and the synchronizer is scanning again. Contains the state that was abandoned.
    Desync(State),
    /// A packet was completed. The synchronizer is scanning again.
    Packet(Box<SyncedPacket>),
}

/// Where and how strongly the preamble was detected.
#[derive(Debug, Clone, Copy)]
struct Acquired {
    offset: usize,
    peak: u32,
}

#[derive(Debug, Clone)]
enum Receiver {
    Scanning,
    PreambleMatch1(Acquired),
    PreambleMatch2(Acquired),
    SfdMatch(Acquired),
    HeaderRead {
        acquired: Acquired,
        values: Vec<u32>,
    },
    DataRead {
        acquired: Acquired,
        header: PrimaryHeader,
        values: Vec<u32>,
        total: usize,
    },
}

impl Receiver {
    fn state(&self) -> State {
        match self {
            Receiver::Scanning => State::Scanning,
            Receiver::PreambleMatch1(_) => State::PreambleMatch1,
            Receiver::PreambleMatch2(_) => State::PreambleMatch2,
            Receiver::SfdMatch(_) => State::SfdMatch,
            Receiver::HeaderRead { .. } => State::HeaderRead,
            Receiver::DataRead { .. } => State::DataRead,
        }
    }
}

/// Locates and extracts framed packets from a PPM modulated bit stream.
///
/// Bits are fed one at a time using [Synchronizer::step]. While scanning, the last
/// `bits_per_symbol` bits are demodulated at every bit offset until a preamble symbol with
/// a peak at or above the configured threshold is found. From then on a symbol is
/// demodulated every `bits_per_symbol` bits and must match the expected frame structure
/// (second preamble, optionally more preambles, sfd0, sfd1). The threshold only applies to
/// the initial detection. Any mismatch drops back to scanning.
///
/// Once the frame start is confirmed the primary header symbols are read, the payload
/// length is taken from the header and the payload symbols are read, after which the
/// packet is produced and scanning resumes.
///
/// # Limitations
/// Detection looks at a single symbol, so whatever precedes a preamble can be taken for
/// one. If that happens while the real first preamble is still inside the window the
/// synchronizer is armed at the wrong alignment and desyncs one symbol later, after the
/// first preamble has passed. The second preamble alone is then followed by sfd0 rather
/// than a preamble and the packet is lost.
///
/// With [BitOrder::MsbFirst] the preamble pulse is the last chip of the symbol and noise
/// ahead of it cannot produce a full strength preamble. With [BitOrder::LsbFirst] and
/// `bits_per_chip > 1` the pulse is the first chip sent: a full strength noise chip a few
/// bits ahead of it wins while the real pulse straddles two chips. In random noise about
/// half of such packets are lost. Wider chips also lose an occasional packet with
/// [BitOrder::MsbFirst].
///
/// [BitOrder::MsbFirst]: crate::modulation::BitOrder::MsbFirst
/// [BitOrder::LsbFirst]: crate::modulation::BitOrder::LsbFirst
///
/// # Example
/// ```
/// use ppm::framing::{Packet, Step, SyncConfig, Synchronizer};
/// use ppm::modulation::Params;
///
/// let config = SyncConfig::builder()
///     .params(Params::new(16, 2).unwrap())
///     .threshold(3)
///     .build();
/// let packet = Packet::from_bytes(0, 42, 1, b"hello").unwrap();
/// let mut bits = vec![0, 1, 1];
/// bits.extend(packet.frame(&config).unwrap());
///
/// let mut sync = Synchronizer::new(config).unwrap();
/// let found = sync.push(&bits);
/// assert_eq!(found.len(), 1);
/// assert_eq!(found[0].offset, 3);
/// assert_eq!(found[0].packet.payload_bytes(), b"hello");
/// ```
#[derive(Debug, Clone)]
pub struct Synchronizer {
    config: SyncConfig,
    window: SymbolWindow,
    receiver: Receiver,
    // Total bits consumed, i.e., stream offset of the next bit
    offset: usize,
    // Bits consumed toward the next symbol decision when not scanning
    bit_count: usize,
}

impl Synchronizer {
    /// Create a new ``Synchronizer`` in the [State::Scanning] state.
    ///
    /// # Errors
    /// [Error::Config] if a sync value in `config` does not fit the symbol radix.
    pub fn new(config: SyncConfig) -> Result<Self> {
        config.validate()?;
        let window = SymbolWindow::new(&config.params);
        Ok(Synchronizer {
            config,
            window,
            receiver: Receiver::Scanning,
            offset: 0,
            bit_count: 0,
        })
    }

    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.receiver.state()
    }

    /// Number of bits consumed so far, i.e., the stream offset of the next bit.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bits consumed toward the next symbol decision. Always 0 while scanning.
    #[must_use]
    pub fn bit_count(&self) -> usize {
        self.bit_count
    }

    /// Header or payload symbols accumulated in the current state.
    #[must_use]
    pub fn symbol_count(&self) -> usize {
        match &self.receiver {
            Receiver::HeaderRead { values, .. } | Receiver::DataRead { values, .. } => {
                values.len()
            }
            _ => 0,
        }
    }

    /// Return to [State::Scanning], dropping any partial packet and the contents of the
    /// sliding window. The stream offset is not affected.
    pub fn reset(&mut self) {
        self.receiver = Receiver::Scanning;
        self.bit_count = 0;
        self.window.clear();
    }

    /// Consume a single bit. Any non-zero value is a 1.
    pub fn step(&mut self, bit: Bit) -> Step {
        self.window.push(u8::from(bit != 0));
        self.offset += 1;

        if let Receiver::Scanning = self.receiver {
            self.scan();
            return Step::Pending;
        }

        self.bit_count += 1;
        if self.bit_count < self.config.params.bits_per_symbol() {
            return Step::Pending;
        }
        self.bit_count = 0;
        match self.window.decode() {
            Some((value, _)) => self.advance(value),
            None => Step::Pending,
        }
    }

    /// Consume all of `bits`, returning any packets completed.
    pub fn push(&mut self, bits: &[Bit]) -> Vec<SyncedPacket> {
        bits.iter()
            .filter_map(|bit| match self.step(*bit) {
                Step::Packet(packet) => Some(*packet),
                _ => None,
            })
            .collect()
    }

    /// Check for a packet cut off by the end of the stream.
    ///
    /// # Errors
    /// [Error::Truncated] if the frame start was confirmed, i.e., the state is
    /// [State::HeaderRead] or [State::DataRead]. Ending in any other state is not an error
    /// since the symbols seen may have been noise.
    pub fn finish(&self) -> Result<()> {
        let remaining = match &self.receiver {
            Receiver::HeaderRead { values, .. } => self.config.header_symbols() - values.len(),
            Receiver::DataRead { values, total, .. } => total - values.len(),
            _ => return Ok(()),
        };
        Err(Error::Truncated {
            state: self.state(),
            remaining,
        })
    }

    fn scan(&mut self) {
        let Some((value, peak)) = self.window.decode() else {
            return;
        };
        if value == self.config.preamble && peak >= self.config.threshold {
            let offset = self.offset - self.config.params.bits_per_symbol();
            debug!(offset, peak, "preamble detected");
            self.receiver = Receiver::PreambleMatch1(Acquired { offset, peak });
            self.bit_count = 0;
        }
    }

    fn advance(&mut self, value: u32) -> Step {
        let config = &self.config;
        let receiver = std::mem::replace(&mut self.receiver, Receiver::Scanning);
        trace!(state = ?receiver.state(), value, offset = self.offset, "symbol");

        self.receiver = match receiver {
            Receiver::Scanning => Receiver::Scanning,
            Receiver::PreambleMatch1(acquired) if value == config.preamble => {
                Receiver::PreambleMatch2(acquired)
            }
            Receiver::PreambleMatch2(acquired) if value == config.sfd0 => {
                Receiver::SfdMatch(acquired)
            }
            Receiver::PreambleMatch2(acquired) if value == config.preamble => {
                Receiver::PreambleMatch2(acquired)
            }
            Receiver::SfdMatch(acquired) if value == config.sfd1 => {
                debug!(offset = acquired.offset, "frame start confirmed");
                Receiver::HeaderRead {
                    acquired,
                    values: Vec::with_capacity(config.header_symbols()),
                }
            }
            Receiver::HeaderRead {
                acquired,
                mut values,
            } => {
                values.push(value);
                if values.len() < config.header_symbols() {
                    Receiver::HeaderRead { acquired, values }
                } else {
                    let bits = symbol_values_to_bits(&values, &config.params);
                    let Some(header) = PrimaryHeader::decode(&bits) else {
                        // header_symbols always covers the header length
                        return Step::Desync(State::HeaderRead);
                    };
                    let total = config.payload_symbols(header.octets());
                    debug!(?header, payload_symbols = total, "header read");
                    Receiver::DataRead {
                        acquired,
                        header,
                        values: Vec::with_capacity(total),
                        total,
                    }
                }
            }
            Receiver::DataRead {
                acquired,
                header,
                mut values,
                total,
            } => {
                values.push(value);
                if values.len() < total {
                    Receiver::DataRead {
                        acquired,
                        header,
                        values,
                        total,
                    }
                } else {
                    return self.emit(acquired, header, &values);
                }
            }
            abandoned => {
                let state = abandoned.state();
                debug!(?state, value, offset = self.offset, "sync lost");
                self.bit_count = 0;
                return Step::Desync(state);
            }
        };
        Step::Pending
    }

    fn emit(&mut self, acquired: Acquired, header: PrimaryHeader, values: &[u32]) -> Step {
        let mut payload = symbol_values_to_bits(values, &self.config.params);
        payload.truncate(header.octets() * 8);
        let packet = SyncedPacket {
            packet: Packet { header, payload },
            offset: acquired.offset,
            peak: acquired.peak,
            threshold: self.config.threshold,
        };
        debug!(
            offset = packet.offset,
            id = header.id,
            octets = header.octets(),
            "packet decoded"
        );
        self.receiver = Receiver::Scanning;
        self.bit_count = 0;
        Step::Packet(Box::new(packet))
    }
}

/// Iterates over packets synchronized from a bit stream. Created using [decode_packets] or
/// [read_packets].
///
/// ## Errors
/// An error from the underlying bit source is produced and ends iteration. If the stream
/// ends inside a packet [Error::Truncated] is produced as the final item.
pub struct PacketIter<I>
where
    I: Iterator<Item = Result<Bit>>,
{
    bits: I,
    sync: Synchronizer,
    done: bool,
}

impl<I> PacketIter<I>
where
    I: Iterator<Item = Result<Bit>>,
{
    /// The synchronizer driving this iterator.
    pub fn synchronizer(&self) -> &Synchronizer {
        &self.sync
    }
}

impl<I> Iterator for PacketIter<I>
where
    I: Iterator<Item = Result<Bit>>,
{
    type Item = Result<SyncedPacket>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        for zult in self.bits.by_ref() {
            let bit = match zult {
                Ok(bit) => bit,
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            };
            if let Step::Packet(packet) = self.sync.step(bit) {
                return Some(Ok(*packet));
            }
        }
        self.done = true;
        self.sync.finish().err().map(Err)
    }
}

/// Creates an iterator that produces the packets found in `bits`.
///
/// # Errors
/// [Error::Config] if `config` is not valid.
pub fn decode_packets<B>(
    bits: B,
    config: SyncConfig,
) -> Result<PacketIter<impl Iterator<Item = Result<Bit>>>>
where
    B: IntoIterator<Item = Bit>,
{
    Ok(PacketIter {
        bits: bits.into_iter().map(Ok),
        sync: Synchronizer::new(config)?,
        done: false,
    })
}

/// Creates an iterator that produces the packets found in ASCII `0`/`1` text read from
/// `reader`.
///
/// # Errors
/// [Error::Config] if `config` is not valid.
pub fn read_packets<R>(
    reader: R,
    config: SyncConfig,
) -> Result<PacketIter<impl Iterator<Item = Result<Bit>>>>
where
    R: Read,
{
    Ok(PacketIter {
        bits: read_ascii_bits(reader),
        sync: Synchronizer::new(config)?,
        done: false,
    })
}
