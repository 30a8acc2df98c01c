use std::{
    fs::File,
    io::{stdout, Write},
    path::Path,
};

use anyhow::{Context, Result};
use ppm::{
    bits::{format_rows, parse_bits, read_ascii_bits},
    modulation::{
        demodulate as demodulate_bits, encode_bits, encode_symbols, Demodulated, Params,
    },
    Bit,
};
use tracing::debug;

use crate::decode::Format;

fn write_modulated<W: Write>(
    mut out: W,
    params: &Params,
    bits: Option<&str>,
    values: &[u32],
) -> Result<()> {
    let modulated = match bits {
        Some(bits) => {
            let bits = parse_bits(bits).context("parsing bits")?;
            encode_bits(&bits, params).context("modulating bits")?
        }
        None => encode_symbols(values, params).context("modulating values")?,
    };
    debug!("modulated {} bits", modulated.len());

    out.write_all(format_rows(&modulated, params.bits_per_symbol()).as_bytes())
        .context("writing modulated bits")
}

pub fn modulate(params: &Params, bits: Option<&str>, values: &[u32]) -> Result<()> {
    write_modulated(stdout().lock(), params, bits, values)
}

/// Demodulate the bits in `input` after skipping `skip` leading bits. The remaining bits
/// must be a whole number of symbols.
fn read_demodulated(
    input: &Path,
    params: &Params,
    threshold: u32,
    skip: usize,
) -> Result<Demodulated> {
    let reader = File::open(input).context("opening input")?;
    let bits = read_ascii_bits(reader)
        .skip(skip)
        .collect::<ppm::Result<Vec<Bit>>>()
        .with_context(|| format!("reading bits from {input:?}"))?;

    demodulate_bits(&bits, params, threshold)
        .with_context(|| format!("demodulating {input:?}; use --skip to align symbols"))
}

fn write_demodulated<W: Write>(mut out: W, zult: &Demodulated, format: &Format) -> Result<()> {
    match format {
        Format::Json => serde_json::to_writer_pretty(out, zult).context("serializing to json"),
        Format::Text => {
            for (idx, (value, met)) in zult.values.iter().zip(&zult.threshold_met).enumerate() {
                writeln!(out, "{idx:>6} {value:>6} {met}").context("writing demodulated")?;
            }
            Ok(())
        }
    }
}

pub fn demodulate(
    input: &Path,
    params: &Params,
    threshold: u32,
    skip: usize,
    format: &Format,
) -> Result<()> {
    let zult = read_demodulated(input, params, threshold, skip)?;
    write_demodulated(stdout().lock(), &zult, format)
}
