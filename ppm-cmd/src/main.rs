mod decode;
mod generate;
mod modulate;

use std::io::stderr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ppm::framing::SyncConfig;
use ppm::modulation::{BitOrder, Params};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Modulation and synchronization options common to all commands.
#[derive(Args, Debug, Clone)]
struct PpmArgs {
    /// Number of chips per symbol. Must be a power of 2.
    #[arg(short = 'C', long, default_value_t = 16, value_name = "num")]
    chips_per_symbol: usize,

    /// Number of bits per chip.
    #[arg(short = 'B', long, default_value_t = 2, value_name = "num")]
    bits_per_chip: usize,

    /// Symbol bits are sent least significant first, i.e., each symbol's bit sequence is
    /// reversed.
    #[arg(long, action)]
    lsb_first: bool,

    /// Minimum peak chip value for a preamble to be detected. Defaults to a full strength
    /// pulse, i.e., all bits of a chip set.
    #[arg(short, long, value_name = "num")]
    threshold: Option<u32>,

    /// Preamble symbol value.
    #[arg(long, default_value_t = 0, value_name = "value")]
    preamble: u32,

    /// First start-of-frame delimiter symbol value.
    #[arg(long, default_value_t = 7, value_name = "value")]
    sfd0: u32,

    /// Second start-of-frame delimiter symbol value.
    #[arg(long, default_value_t = 10, value_name = "value")]
    sfd1: u32,
}

impl PpmArgs {
    fn params(&self) -> Result<Params> {
        let order = if self.lsb_first {
            BitOrder::LsbFirst
        } else {
            BitOrder::MsbFirst
        };
        Ok(Params::new(self.chips_per_symbol, self.bits_per_chip)
            .context("invalid modulation parameters")?
            .with_bit_order(order))
    }

    fn threshold(&self, params: &Params) -> u32 {
        self.threshold.unwrap_or_else(|| params.pulse())
    }

    fn sync_config(&self) -> Result<SyncConfig> {
        let params = self.params()?;
        Ok(SyncConfig::builder()
            .params(params)
            .threshold(self.threshold(&params))
            .preamble(self.preamble)
            .sfd0(self.sfd0)
            .sfd1(self.sfd1)
            .build())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Modulate symbol values, or a bit string, writing ASCII bits to stdout.
    ///
    /// Output has one symbol per row.
    Modulate {
        #[command(flatten)]
        ppm: PpmArgs,

        /// Modulate this string of 0s and 1s rather than symbol values. Bits are grouped
        /// log2(chips-per-symbol) at a time, most significant first, zero padding the last
        /// group.
        #[arg(long, value_name = "bits", conflicts_with = "values")]
        bits: Option<String>,

        /// Symbol values to modulate.
        values: Vec<u32>,
    },
    /// Demodulate a file of aligned ASCII bits into symbol values.
    ///
    /// After --skip the input must hold a whole number of symbols.
    Demodulate {
        #[command(flatten)]
        ppm: PpmArgs,

        /// Number of leading bits to skip before the first symbol.
        #[arg(long, default_value_t = 0, value_name = "num")]
        skip: usize,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: decode::Format,

        /// Input file of ASCII 0s and 1s. Whitespace is ignored.
        input: PathBuf,
    },
    /// Locate and decode packets in files of ASCII bits.
    ///
    /// Input files are decoded in parallel, each by its own synchronizer.
    Decode {
        #[command(flatten)]
        ppm: PpmArgs,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: decode::Format,

        /// Input files of ASCII 0s and 1s. Whitespace is ignored.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Generate a test-vector file with a single packet at a random offset in random bits.
    ///
    /// The file has one symbol's worth of bits per row, though the packet need not be
    /// aligned to rows.
    Generate {
        #[command(flatten)]
        ppm: PpmArgs,

        /// Number of rows to write.
        #[arg(short, long, default_value_t = 50, value_name = "num")]
        rows: usize,

        /// Packet version.
        #[arg(long, default_value_t = 0, value_name = "num")]
        version: u8,

        /// Packet identifier.
        #[arg(long, default_value_t = 0x1fff, value_name = "num")]
        id: u16,

        /// Packet sequence control.
        #[arg(long, default_value_t = 0x4000, value_name = "num")]
        seq_control: u16,

        /// Number of random payload octets.
        #[arg(long, default_value_t = 1, value_name = "num")]
        octets: usize,

        /// Probability of flipping each bit written, including packet bits.
        #[arg(long, default_value_t = 0.0, value_name = "prob")]
        flip_probability: f64,

        /// Seed for the random generator, for reproducible output.
        #[arg(long, value_name = "num")]
        seed: Option<u64>,

        /// Delete output file if it already exists
        #[arg(long, action)]
        clobber: bool,

        /// Output file path.
        #[arg(short, long, default_value = "packet.txt", value_name = "path")]
        output: PathBuf,
    },
    /// Generate a file of rows filled with a single bit value.
    Fill {
        #[command(flatten)]
        ppm: PpmArgs,

        /// Number of rows to write.
        #[arg(short, long, default_value_t = 50, value_name = "num")]
        rows: usize,

        /// Bit value to fill with.
        #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=1))]
        value: u8,

        /// Delete output file if it already exists
        #[arg(long, action)]
        clobber: bool,

        /// Output file path.
        #[arg(short, long, default_value = "fill.txt", value_name = "path")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(stderr)
        .with_ansi(false)
        .without_time()
        .with_env_filter(
            EnvFilter::try_from_env("PPM_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    debug!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Modulate { ppm, bits, values } => {
            let params = ppm.params()?;
            modulate::modulate(&params, bits.as_deref(), values)
        }
        Commands::Demodulate {
            ppm,
            skip,
            format,
            input,
        } => {
            let params = ppm.params()?;
            modulate::demodulate(input, &params, ppm.threshold(&params), *skip, format)
        }
        Commands::Decode {
            ppm,
            format,
            inputs,
        } => decode::decode(inputs, &ppm.sync_config()?, format),
        Commands::Generate {
            ppm,
            rows,
            version,
            id,
            seq_control,
            octets,
            flip_probability,
            seed,
            clobber,
            output,
        } => {
            let opts = generate::GenerateOpts {
                rows: *rows,
                version: *version,
                id: *id,
                seq_control: *seq_control,
                octets: *octets,
                flip_probability: *flip_probability,
                seed: *seed,
            };
            generate::generate(output, *clobber, &ppm.sync_config()?, &opts)
        }
        Commands::Fill {
            ppm,
            rows,
            value,
            clobber,
            output,
        } => generate::fill(output, *clobber, &ppm.params()?, *rows, *value),
    }
}
