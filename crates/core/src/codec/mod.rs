//! Compact identifier codec for provider media references.
//!
//! A provider token wraps four packed integer fields (media kind, location,
//! media id, access hash) plus an opaque reference byte string. Unpacking a
//! token yields two strings: the compact id used as the dedup key across
//! shards, and the reference token needed to re-fetch the underlying
//! content later. Both are base64url without padding, safe to embed in
//! URLs and callback payloads.
//!
//! Compact ids are one-way: deterministic for a given input, but never
//! decoded again by this crate.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use thiserror::Error;

/// Length of the packed integer header: two i32 + two i64, little-endian.
const PACKED_LEN: usize = 24;

/// Fixed trailer bytes appended to every compact id before compression.
const ID_TRAILER: [u8; 2] = [22, 4];

/// Errors from decoding a provider token.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Reference is not valid base64url: {0}")]
    InvalidEncoding(String),

    #[error("Packed header too short: {got} bytes, need {need}")]
    ShortHeader { got: usize, need: usize },
}

/// The four fixed-width fields of a provider media reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedMediaRef {
    /// Small media type tag.
    pub media_kind: i32,
    /// Routing/location tag.
    pub location: i32,
    /// Provider content id.
    pub media_id: i64,
    /// Provider access token for the content.
    pub access_hash: i64,
}

impl PackedMediaRef {
    /// Pack the fields into the fixed 24-byte little-endian layout.
    pub fn pack(&self) -> [u8; PACKED_LEN] {
        let mut out = [0u8; PACKED_LEN];
        out[0..4].copy_from_slice(&self.media_kind.to_le_bytes());
        out[4..8].copy_from_slice(&self.location.to_le_bytes());
        out[8..16].copy_from_slice(&self.media_id.to_le_bytes());
        out[16..24].copy_from_slice(&self.access_hash.to_le_bytes());
        out
    }

    fn unpack(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() < PACKED_LEN {
            return Err(CodecError::ShortHeader {
                got: bytes.len(),
                need: PACKED_LEN,
            });
        }
        Ok(Self {
            media_kind: i32::from_le_bytes(bytes[0..4].try_into().unwrap()),
            location: i32::from_le_bytes(bytes[4..8].try_into().unwrap()),
            media_id: i64::from_le_bytes(bytes[8..16].try_into().unwrap()),
            access_hash: i64::from_le_bytes(bytes[16..24].try_into().unwrap()),
        })
    }
}

/// A fully decoded provider reference: packed fields plus the opaque
/// reference bytes that follow them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderMediaRef {
    pub fields: PackedMediaRef,
    pub reference: Vec<u8>,
}

/// Compress runs of zero bytes: each run of `n` zeros becomes the pair
/// `(0x00, n)`, split into multiple pairs for runs longer than 255.
fn rle_compress(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut run = 0usize;
    for &b in bytes {
        if b == 0 {
            run += 1;
            continue;
        }
        while run > 0 {
            let chunk = run.min(255);
            out.push(0);
            out.push(chunk as u8);
            run -= chunk;
        }
        out.push(b);
    }
    while run > 0 {
        let chunk = run.min(255);
        out.push(0);
        out.push(chunk as u8);
        run -= chunk;
    }
    out
}

/// Inverse of `rle_compress`. A trailing lone `0x00` has no run length and
/// the input is rejected as malformed.
fn rle_expand(bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut iter = bytes.iter();
    while let Some(&b) = iter.next() {
        if b == 0 {
            let n = *iter
                .next()
                .ok_or_else(|| CodecError::InvalidEncoding("truncated zero run".into()))?;
            out.extend(std::iter::repeat(0u8).take(n as usize));
        } else {
            out.push(b);
        }
    }
    Ok(out)
}

/// Derive the compact id for a packed reference.
///
/// The packed header gets the fixed trailer appended, zero runs compressed,
/// and the result base64url-encoded without padding. Deterministic, not
/// invertible.
pub fn encode_id(fields: &PackedMediaRef) -> String {
    let mut packed = fields.pack().to_vec();
    packed.extend_from_slice(&ID_TRAILER);
    URL_SAFE_NO_PAD.encode(rle_compress(&packed))
}

/// Encode reference bytes as a base64url string without padding.
pub fn encode_ref(reference: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(reference)
}

/// Exact inverse of `encode_ref`.
pub fn decode_ref(token: &str) -> Result<Vec<u8>, CodecError> {
    URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|e| CodecError::InvalidEncoding(e.to_string()))
}

/// Encode a full provider token: packed header plus reference bytes,
/// zero-run compressed, base64url without padding.
pub fn encode_provider_token(fields: &PackedMediaRef, reference: &[u8]) -> String {
    let mut raw = fields.pack().to_vec();
    raw.extend_from_slice(reference);
    URL_SAFE_NO_PAD.encode(rle_compress(&raw))
}

/// Decode a provider token into its packed fields and reference bytes.
pub fn decode_provider_token(token: &str) -> Result<ProviderMediaRef, CodecError> {
    let raw = URL_SAFE_NO_PAD
        .decode(token.trim())
        .map_err(|e| CodecError::InvalidEncoding(e.to_string()))?;
    let bytes = rle_expand(&raw)?;
    let fields = PackedMediaRef::unpack(&bytes)?;
    Ok(ProviderMediaRef {
        fields,
        reference: bytes[PACKED_LEN..].to_vec(),
    })
}

/// Split a provider token into `(compact_id, reference_token)`.
///
/// This is the ingest entry point: the compact id becomes the record's
/// primary key, the reference token is stored alongside it for later
/// content fetches.
pub fn unpack_provider_token(token: &str) -> Result<(String, String), CodecError> {
    let decoded = decode_provider_token(token)?;
    Ok((encode_id(&decoded.fields), encode_ref(&decoded.reference)))
}
