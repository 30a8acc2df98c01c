use ppm::framing::{Packet, SyncConfig};
use ppm::Bit;
use rand::{rngs::StdRng, Rng};

pub fn noise(rng: &mut StdRng, len: usize) -> Vec<Bit> {
    (0..len).map(|_| rng.gen_range(0..=1)).collect()
}

pub fn random_packet(rng: &mut StdRng, max_octets: usize) -> Packet {
    let len = rng.gen_range(1..=max_octets);
    let data: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
    Packet::from_bytes(rng.gen_range(0..8), rng.gen(), rng.gen(), &data)
        .expect("packet length to be valid")
}

/// Embed the framed `packet` in `total` bits of noise at a random offset, returning the
/// stream and the offset.
pub fn embed(rng: &mut StdRng, packet: &Packet, config: &SyncConfig, total: usize) -> (Vec<Bit>, usize) {
    let frame = packet.frame(config).expect("packet to frame");
    assert!(total >= frame.len(), "stream too short for packet");
    let offset = rng.gen_range(0..=total - frame.len());

    let mut bits = noise(rng, offset);
    bits.extend(frame);
    let tail = total - bits.len();
    bits.extend(noise(rng, tail));
    (bits, offset)
}
