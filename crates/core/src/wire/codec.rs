use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use serde::{Deserialize, Serialize};

use crate::error::WireError;

/// Top-level framing: `[type, playerId, data, timestamp]` (spec 4.1, 6).
/// `data` is itself a MessagePack encoding of the typed payload named by
/// `msg_type`; keeping the type as a sibling field lets the transport
/// route or rate-limit a datagram without decoding its payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub msg_type: String,
    pub player_id: String,
    pub data: Vec<u8>,
    pub timestamp: f64,
}

const COMPRESSED_FLAG: u8 = 1;
const RAW_FLAG: u8 = 0;

/// Serializes `envelope` and applies DEFLATE above `compression_threshold`
/// bytes, prefixing a one-byte flag so the receiver knows whether to
/// inflate (spec 4.1).
pub fn encode_datagram(
    envelope: &Envelope,
    compression_threshold: usize,
    max_packet_size: usize,
) -> Result<Vec<u8>, WireError> {
    let body = rmp_serde::to_vec(envelope)?;

    let mut out = Vec::with_capacity(body.len() + 1);
    if body.len() > compression_threshold {
        out.push(COMPRESSED_FLAG);
        let mut encoder = DeflateEncoder::new(&mut out, Compression::fast());
        encoder.write_all(&body)?;
        encoder.finish()?;
    } else {
        out.push(RAW_FLAG);
        out.extend_from_slice(&body);
    }

    if out.len() > max_packet_size {
        return Err(WireError::TooLarge(out.len(), max_packet_size));
    }

    Ok(out)
}

/// Reverses [`encode_datagram`], decompressing first if the flag byte
/// indicates DEFLATE was applied.
pub fn decode_datagram(bytes: &[u8]) -> Result<Envelope, WireError> {
    let (&flag, body) = bytes
        .split_first()
        .ok_or_else(|| WireError::UnsupportedType("empty datagram".into()))?;

    let decoded = match flag {
        RAW_FLAG => body.to_vec(),
        COMPRESSED_FLAG => {
            let mut decoder = DeflateDecoder::new(body);
            let mut buf = Vec::new();
            decoder.read_to_end(&mut buf)?;
            buf
        }
        other => return Err(WireError::UnsupportedType(format!("flag byte {other}"))),
    };

    Ok(rmp_serde::from_slice(&decoded)?)
}
