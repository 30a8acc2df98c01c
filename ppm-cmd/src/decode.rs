use std::{
    fs::File,
    io::{stdout, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use handlebars::handlebars_helper;
use ppm::framing::{read_packets, SyncConfig, SyncedPacket};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub enum Format {
    Json,
    Text,
}

impl clap::ValueEnum for Format {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Json, Self::Text]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        match self {
            Self::Json => Some(clap::builder::PossibleValue::new("json")),
            Self::Text => Some(clap::builder::PossibleValue::new("text")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct PacketInfo {
    offset: usize,
    peak: u32,
    threshold: u32,
    version: u8,
    id: u16,
    seq_control: u16,
    octets: usize,
    payload: String,
}

impl From<&SyncedPacket> for PacketInfo {
    fn from(zult: &SyncedPacket) -> Self {
        let header = &zult.packet.header;
        PacketInfo {
            offset: zult.offset,
            peak: zult.peak,
            threshold: zult.threshold,
            version: header.version,
            id: header.id,
            seq_control: header.seq_control,
            octets: header.octets(),
            payload: zult
                .packet
                .payload_bytes()
                .iter()
                .map(|b| format!("{b:02x}"))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct Decoded {
    filename: String,
    bits: usize,
    packets: Vec<PacketInfo>,
    /// Set if the input ended part way through a packet.
    truncated: Option<String>,
}

fn decode_file(path: &Path, config: &SyncConfig) -> Result<Decoded> {
    let reader = File::open(path).with_context(|| format!("opening {path:?}"))?;
    let mut iter = read_packets(reader, config.clone()).context("creating synchronizer")?;

    let mut packets = Vec::default();
    let mut truncated = None;
    for zult in iter.by_ref() {
        match zult {
            Ok(packet) => {
                debug!("{path:?}: {}", packet.packet);
                packets.push(PacketInfo::from(&packet));
            }
            Err(err @ ppm::Error::Truncated { .. }) => {
                warn!("{path:?}: {err}");
                truncated = Some(err.to_string());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("decoding {path:?}"));
            }
        }
    }
    let bits = iter.synchronizer().offset();
    info!("{path:?}: {} packets in {bits} bits", packets.len());

    Ok(Decoded {
        filename: path.to_string_lossy().to_string(),
        bits,
        packets,
        truncated,
    })
}

pub fn decode(inputs: &[PathBuf], config: &SyncConfig, format: &Format) -> Result<()> {
    debug!("decoding {inputs:?} with {config:?}");
    let decoded = inputs
        .par_iter()
        .map(|path| decode_file(path, config))
        .collect::<Result<Vec<Decoded>>>()?;

    match format {
        Format::Json => {
            serde_json::to_writer_pretty(stdout(), &decoded).context("serializing to json")
        }
        Format::Text => {
            let data = render_text(&decoded).context("serializing decoded packets")?;
            stdout()
                .write_all(str::as_bytes(&data))
                .context("writing to stdout")
        }
    }
}

fn render_text(decoded: &[Decoded]) -> Result<String> {
    handlebars_helper!(left_pad: |num: u64, v: Json| {
        let v = match v {
            serde_json::Value::String(s) => s.to_owned(),
            serde_json::Value::Null => String::new(),
            _ => v.to_string()
        };
        let num = usize::try_from(num).unwrap_or(usize::MAX).max(v.len());
        format!("{v:>num$}")
    });
    let mut hb = handlebars::Handlebars::new();
    hb.register_helper("lpad", Box::new(left_pad));
    hb.register_template_string("decoded", TEXT_TEMPLATE)
        .context("registering template")?;

    hb.render("decoded", &decoded).context("rendering text")
}

const TEXT_TEMPLATE: &str = r"{{ #each this }}{{ filename }}
===============================================================================================
Bits:      {{ bits }}
Packets:   {{ packets.length }}
{{ #if truncated }}Truncated: {{ truncated }}
{{ /if }}-----------------------------------------------------------------------------------------------
    Offset  Peak  Ver      ID     Seq  Octets  Payload
-----------------------------------------------------------------------------------------------
{{ #each packets }}{{ lpad 10 offset }}  {{ lpad 4 peak }}  {{ lpad 3 version }}  {{ lpad 6 id }}  {{ lpad 6 seq_control }}  {{ lpad 6 octets }}  {{ payload }}
{{ /each }}
{{ /each }}";
