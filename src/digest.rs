//! SHA-256 helpers and the target digest set.

use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Raw SHA-256 output.
pub type Digest256 = [u8; 32];

/// Longest decimal rendering of a `u64`.
const MAX_DECIMAL_LEN: usize = 20;

/// Write the decimal representation of `n` into the tail of `buf` and
/// return the written slice. Avoids a heap allocation per candidate.
#[inline(always)]
fn decimal_bytes(mut n: u64, buf: &mut [u8; MAX_DECIMAL_LEN]) -> &[u8] {
    let mut pos = MAX_DECIMAL_LEN;
    loop {
        pos -= 1;
        buf[pos] = b'0' + (n % 10) as u8;
        n /= 10;
        if n == 0 {
            break;
        }
    }
    &buf[pos..]
}

/// SHA-256 of the decimal string of `id`.
#[inline]
pub fn id_digest(id: u64) -> Digest256 {
    let mut buf = [0u8; MAX_DECIMAL_LEN];
    Sha256::digest(decimal_bytes(id, &mut buf)).into()
}

/// Lowercase hex SHA-256 of the decimal string of `id`.
pub fn id_hash_hex(id: u64) -> String {
    hex::encode(id_digest(id))
}

/// Canonical form used for matching: surrounding whitespace stripped, lowercase.
pub fn normalize_hex(hash: &str) -> String {
    hash.trim().to_ascii_lowercase()
}

/// Parse a hex digest. Anything that is not exactly 32 bytes of hex yields `None`.
pub fn parse_digest(hash: &str) -> Option<Digest256> {
    let mut out = [0u8; 32];
    hex::decode_to_slice(normalize_hex(hash), &mut out).ok()?;
    Some(out)
}

/// Immutable set of digests a search is looking for.
///
/// Inputs that do not parse as a SHA-256 digest are counted but never stored,
/// so they can never match.
#[derive(Debug, Clone, Default)]
pub struct TargetSet {
    digests: HashSet<Digest256>,
    rejected: usize,
}

impl TargetSet {
    pub fn from_hashes<S: AsRef<str>>(hashes: &[S]) -> Self {
        let mut digests = HashSet::with_capacity(hashes.len());
        let mut rejected = 0;
        for hash in hashes {
            match parse_digest(hash.as_ref()) {
                Some(digest) => {
                    digests.insert(digest);
                }
                None => rejected += 1,
            }
        }
        Self { digests, rejected }
    }

    #[inline]
    pub fn contains(&self, digest: &Digest256) -> bool {
        self.digests.contains(digest)
    }

    /// Number of distinct, well-formed digests.
    pub fn len(&self) -> usize {
        self.digests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }

    /// Number of inputs that were not valid SHA-256 hex digests.
    pub fn rejected(&self) -> usize {
        self.rejected
    }
}
