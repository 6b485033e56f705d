//! Provably-fair verification material.
//!
//! A [`RollProof`] travels with every bet; a [`RevealedSeed`] is published when
//! the server seed rotates. Together they let anyone recompute each roll made
//! under the revealed seed. Both have a canonical binary encoding for export.

use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, ReadRangeExt, Write};
use serde::{Deserialize, Serialize};

/// Length of server seeds, commitments and roll hashes in bytes.
pub const SEED_LEN: usize = 32;

/// Longest client seed accepted when decoding.
pub const MAX_CLIENT_SEED_LEN: usize = 256;

pub type Seed = [u8; SEED_LEN];

/// Metadata that produced a single roll.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollProof {
    /// Commitment (`sha256(server_seed)`) published before the roll.
    #[serde(with = "serde_seed_hex")]
    pub commitment: Seed,
    pub client_seed: String,
    pub nonce: u64,
    /// Hash of `server_seed:client_seed:nonce` the roll was read from.
    #[serde(with = "serde_seed_hex")]
    pub hash: Seed,
}

impl Write for RollProof {
    fn write(&self, writer: &mut impl BufMut) {
        self.commitment.write(writer);
        let client_seed = self.client_seed.as_bytes();
        client_seed.len().write(writer);
        writer.put_slice(client_seed);
        self.nonce.write(writer);
        self.hash.write(writer);
    }
}

impl Read for RollProof {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let commitment = Seed::read(reader)?;
        let client_seed = Vec::<u8>::read_range(reader, 0..=MAX_CLIENT_SEED_LEN)?;
        let client_seed = String::from_utf8(client_seed)
            .map_err(|_| Error::Invalid("RollProof", "client seed is not UTF-8"))?;
        let nonce = u64::read(reader)?;
        let hash = Seed::read(reader)?;
        Ok(Self {
            commitment,
            client_seed,
            nonce,
            hash,
        })
    }
}

impl EncodeSize for RollProof {
    fn encode_size(&self) -> usize {
        let client_seed = self.client_seed.len();
        SEED_LEN + client_seed.encode_size() + client_seed + self.nonce.encode_size() + SEED_LEN
    }
}

/// A rotated-out server seed together with its commitment and usage count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealedSeed {
    #[serde(with = "serde_seed_hex")]
    pub server_seed: Seed,
    #[serde(with = "serde_seed_hex")]
    pub commitment: Seed,
    /// Number of rolls made with this seed (nonces `0..rolls`).
    pub rolls: u64,
}

impl Write for RevealedSeed {
    fn write(&self, writer: &mut impl BufMut) {
        self.server_seed.write(writer);
        self.commitment.write(writer);
        self.rolls.write(writer);
    }
}

impl Read for RevealedSeed {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let server_seed = Seed::read(reader)?;
        let commitment = Seed::read(reader)?;
        let rolls = u64::read(reader)?;
        Ok(Self {
            server_seed,
            commitment,
            rolls,
        })
    }
}

impl EncodeSize for RevealedSeed {
    fn encode_size(&self) -> usize {
        SEED_LEN + SEED_LEN + self.rolls.encode_size()
    }
}

pub mod serde_seed_hex {
    use super::{Seed, SEED_LEN};
    use commonware_utils::{from_hex, hex};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(seed: &Seed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex(seed))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Seed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = from_hex(&s).ok_or_else(|| serde::de::Error::custom("invalid hex string"))?;
        bytes.try_into().map_err(|bytes: Vec<u8>| {
            serde::de::Error::custom(format!(
                "expected {} bytes, got {}",
                SEED_LEN,
                bytes.len()
            ))
        })
    }
}
