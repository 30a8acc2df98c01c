use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{anyhow, bail, Context, Result};
use ppm::{
    bits::format_rows,
    framing::{Packet, SyncConfig},
    modulation::Params,
    Bit,
};
use rand::{distributions::Bernoulli, rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct GenerateOpts {
    pub rows: usize,
    pub version: u8,
    pub id: u16,
    pub seq_control: u16,
    pub octets: usize,
    pub flip_probability: f64,
    pub seed: Option<u64>,
}

fn create(path: &Path, clobber: bool) -> Result<BufWriter<File>> {
    if !clobber && path.exists() {
        bail!("{path:?} exists; use --clobber");
    }
    let file =
        File::create(path).with_context(|| format!("failed to create output {path:?}"))?;
    Ok(BufWriter::new(file))
}

/// Random bits with a single framed packet at a random offset. Returns the bits and the
/// offset of the packet.
fn generate_bits<R: Rng>(
    rng: &mut R,
    config: &SyncConfig,
    opts: &GenerateOpts,
) -> Result<(Vec<Bit>, usize)> {
    let flip = Bernoulli::new(opts.flip_probability)
        .map_err(|_| anyhow!("flip probability must be in [0, 1]"))?;
    let data: Vec<u8> = (0..opts.octets).map(|_| rng.gen()).collect();
    let packet = Packet::from_bytes(opts.version, opts.id, opts.seq_control, &data)
        .ok_or_else(|| anyhow!("packet must have between 1 and 65536 octets"))?;
    let frame = packet.frame(config).context("framing packet")?;

    let total = opts.rows * config.params.bits_per_symbol();
    if total < frame.len() {
        bail!(
            "packet of {} bits does not fit in {total} bits; increase --rows",
            frame.len()
        );
    }
    let offset = rng.gen_range(0..=total - frame.len());
    debug!("generated {packet}");

    let mut bits: Vec<Bit> = (0..offset).map(|_| rng.gen_range(0..=1)).collect();
    bits.extend(frame);
    while bits.len() < total {
        bits.push(rng.gen_range(0..=1));
    }
    let mut flipped = 0;
    for bit in &mut bits {
        if rng.sample(flip) {
            *bit ^= 1;
            flipped += 1;
        }
    }
    if flipped > 0 {
        info!("flipped {flipped} bits");
    }

    Ok((bits, offset))
}

pub fn generate(
    output: &Path,
    clobber: bool,
    config: &SyncConfig,
    opts: &GenerateOpts,
) -> Result<()> {
    let mut rng = match opts.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let (bits, offset) = generate_bits(&mut rng, config, opts)?;

    let mut dest = create(output, clobber)?;
    dest.write_all(format_rows(&bits, config.params.bits_per_symbol()).as_bytes())
        .and_then(|()| dest.flush())
        .with_context(|| format!("writing {output:?}"))?;
    info!("wrote packet at bit offset {offset} to {output:?}");
    Ok(())
}

pub fn fill(output: &Path, clobber: bool, params: &Params, rows: usize, value: Bit) -> Result<()> {
    let bits = vec![value; rows * params.bits_per_symbol()];
    let mut dest = create(output, clobber)?;
    dest.write_all(format_rows(&bits, params.bits_per_symbol()).as_bytes())
        .and_then(|()| dest.flush())
        .with_context(|| format!("writing {output:?}"))?;
    info!("wrote {rows} rows of {value} to {output:?}");
    Ok(())
}
