// packages/privacy-mapper/src/store/mod.rs
//! Session-scoped pseudonym mapping store
//!
//! The store itself is an external collaborator: the rewrite engine only sees
//! the transaction traits below and the typed hide/reveal primitives built on
//! top of them. [`memory::InMemoryPrivacyStore`] is the reference backend.
//!
//! Every pair is bijective within its session: a real value maps to exactly
//! one pseudonym and back.

pub mod memory;

pub use memory::InMemoryPrivacyStore;

use crate::interception::session::SessionId;
use crate::utils::errors::{MapperError, Result};
use rand::Rng;

/// Attempts at drawing an unused pseudonym before giving up
const MAX_PSEUDONYM_ATTEMPTS: usize = 64;

/// Length of a hex-encoded txid
const TXID_HEX_LEN: usize = 64;

/// Operations available inside a store transaction
pub trait PrivacyMapTx {
    /// Record a new real/pseudo pair. Both sides must be unused.
    fn new_pair(&mut self, real: &str, pseudo: &str) -> Result<()>;

    /// Pseudonym of `real`, if one exists
    fn real_to_pseudo(&self, real: &str) -> Result<Option<String>>;

    /// Real value behind `pseudo`, if one exists
    fn pseudo_to_real(&self, pseudo: &str) -> Result<Option<String>>;
}

/// Transaction-capable handle bound to one session
///
/// Both calls release the transaction on every exit path. `update` commits
/// only when the closure returns `Ok`.
pub trait PrivacyMapDb: Send + Sync {
    /// Run `f` in a read-only transaction
    fn view(&self, f: &mut dyn FnMut(&dyn PrivacyMapTx) -> Result<()>) -> Result<()>;

    /// Run `f` in a read-write transaction
    fn update(&self, f: &mut dyn FnMut(&mut dyn PrivacyMapTx) -> Result<()>) -> Result<()>;
}

/// Hands out session-scoped handles
pub trait PrivacyMapStore: Send + Sync {
    fn session_db(&self, session: SessionId) -> Box<dyn PrivacyMapDb + '_>;
}

/// Pseudonym of a string, created on first use
///
/// New pseudonyms are random hex strings of the same length as `real`.
pub fn hide_string(tx: &mut dyn PrivacyMapTx, real: &str) -> Result<String> {
    if real.is_empty() {
        return Ok(String::new());
    }

    if let Some(pseudo) = tx.real_to_pseudo(real)? {
        return Ok(pseudo);
    }

    let pseudo = unused_pseudonym(tx, || new_pseudo_str(real.len()))?;
    tx.new_pair(real, &pseudo)?;

    Ok(pseudo)
}

/// Real value behind a string pseudonym
pub fn reveal_string(tx: &dyn PrivacyMapTx, pseudo: &str) -> Result<String> {
    if pseudo.is_empty() {
        return Ok(String::new());
    }

    tx.pseudo_to_real(pseudo)?
        .ok_or_else(|| MapperError::PseudonymNotFound(pseudo.to_string()))
}

/// Pseudonym of a numeric identifier such as a short channel ID
pub fn hide_uint64(tx: &mut dyn PrivacyMapTx, real: u64) -> Result<u64> {
    let key = real.to_string();
    let pseudo = match tx.real_to_pseudo(&key)? {
        Some(pseudo) => pseudo,
        None => {
            let pseudo = unused_pseudonym(tx, || rand::thread_rng().gen::<u64>().to_string())?;
            tx.new_pair(&key, &pseudo)?;
            pseudo
        }
    };

    parse_uint64(&pseudo)
}

/// Real value behind a numeric pseudonym
pub fn reveal_uint64(tx: &dyn PrivacyMapTx, pseudo: u64) -> Result<u64> {
    parse_uint64(&reveal_string(tx, &pseudo.to_string())?)
}

/// Pseudonym of raw bytes, mapped through their hex encoding
pub fn hide_bytes(tx: &mut dyn PrivacyMapTx, real: &[u8]) -> Result<Vec<u8>> {
    decode_hex(&hide_string(tx, &hex::encode(real))?)
}

/// Real bytes behind a byte pseudonym
pub fn reveal_bytes(tx: &dyn PrivacyMapTx, pseudo: &[u8]) -> Result<Vec<u8>> {
    decode_hex(&reveal_string(tx, &hex::encode(pseudo))?)
}

/// Pseudonym of a channel point given as txid and output index
pub fn hide_chan_point(tx: &mut dyn PrivacyMapTx, txid: &str, index: u32) -> Result<(String, u32)> {
    let hidden = hide_chan_point_str(tx, &format_chan_point(txid, index))?;
    parse_chan_point(&hidden)
}

/// Real channel point behind a pseudonymous txid and output index
pub fn reveal_chan_point(tx: &dyn PrivacyMapTx, txid: &str, index: u32) -> Result<(String, u32)> {
    let real = reveal_string(tx, &format_chan_point(txid, index))?;
    parse_chan_point(&real)
}

/// Pseudonym of a "txid:index" channel point string
///
/// The pseudonym is itself a well-formed channel point with a random txid and
/// a random output index.
pub fn hide_chan_point_str(tx: &mut dyn PrivacyMapTx, chan_point: &str) -> Result<String> {
    if chan_point.is_empty() {
        return Ok(String::new());
    }

    if let Some(pseudo) = tx.real_to_pseudo(chan_point)? {
        return Ok(pseudo);
    }

    let (txid, _) = parse_chan_point(chan_point)?;
    let pseudo = unused_pseudonym(tx, || {
        format_chan_point(&new_pseudo_str(txid.len()), rand::thread_rng().gen::<u32>())
    })?;
    tx.new_pair(chan_point, &pseudo)?;

    Ok(pseudo)
}

/// Split "txid:index" into its parts
pub fn parse_chan_point(chan_point: &str) -> Result<(String, u32)> {
    let (txid, index) = chan_point.split_once(':').ok_or_else(|| {
        MapperError::MalformedMessage(format!("invalid channel point {}", chan_point))
    })?;

    if txid.len() != TXID_HEX_LEN || hex::decode(txid).is_err() {
        return Err(MapperError::MalformedMessage(format!(
            "invalid channel point txid {}",
            txid
        )));
    }

    let index = index.parse::<u32>().map_err(|e| {
        MapperError::MalformedMessage(format!("invalid channel point index {}: {}", index, e))
    })?;

    Ok((txid.to_string(), index))
}

fn format_chan_point(txid: &str, index: u32) -> String {
    format!("{}:{}", txid, index)
}

fn new_pseudo_str(len: usize) -> String {
    const HEX: &[u8] = b"0123456789abcdef";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| HEX[rng.gen_range(0..HEX.len())] as char)
        .collect()
}

fn unused_pseudonym<F>(tx: &dyn PrivacyMapTx, mut generate: F) -> Result<String>
where
    F: FnMut() -> String,
{
    for _ in 0..MAX_PSEUDONYM_ATTEMPTS {
        let candidate = generate();
        if tx.pseudo_to_real(&candidate)?.is_none() {
            return Ok(candidate);
        }
    }

    Err(MapperError::StoreFailure(
        "could not find an unused pseudonym".to_string(),
    ))
}

fn parse_uint64(s: &str) -> Result<u64> {
    s.parse::<u64>()
        .map_err(|e| MapperError::StoreFailure(format!("corrupt numeric mapping {}: {}", s, e)))
}

fn decode_hex(s: &str) -> Result<Vec<u8>> {
    hex::decode(s).map_err(|e| MapperError::StoreFailure(format!("corrupt byte mapping {}: {}", s, e)))
}
