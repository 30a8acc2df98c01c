use crate::framing::State;

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A value submitted for encoding does not fit the symbol radix.
    #[error("symbol value {value} out of range for {chips_per_symbol} chips per symbol")]
    InvalidSymbol { value: u32, chips_per_symbol: usize },

    /// Bit count is not a whole number of chunks, e.g., symbols or chips.
    #[error("{len} bits is not a multiple of {chunk}")]
    Framing {
        /// Number of bits we got
        len: usize,
        /// Required chunk size in bits
        chunk: usize,
    },

    /// The stream ended after a frame start was confirmed but before the packet completed.
    #[error("stream ended in {state:?} with {remaining} symbols outstanding")]
    Truncated { state: State, remaining: usize },

    #[error("Invalid config: {0}")]
    Config(String),

    /// A bit source produced something other than 0 or 1.
    #[error("invalid bit value {0:#04x}")]
    InvalidBit(u8),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
