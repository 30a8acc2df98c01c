#![doc = include_str!("../README.md")]

mod error;

pub mod bits;
pub mod framing;
pub mod modulation;

pub use bits::Bit;
pub use error::{Error, Result};
