//! Provably-fair roll generation.
//!
//! ## Commit-reveal flow
//!
//! 1. **Commit** - `sha256(server_seed)` is published before any roll uses the seed.
//! 2. **Roll** - each roll hashes `hex(server_seed):client_seed:nonce` and maps
//!    the digest into `1..=1000`. The proof (commitment, client seed, nonce,
//!    hash) travels with the bet.
//! 3. **Reveal** - after `rolls_per_seed` rolls, or on demand, the seed is
//!    archived as a [`RevealedSeed`] and replaced.
//! 4. **Verify** - anyone holding the revealed seed recomputes every roll with
//!    [`verify_roll`].
//!
//! ## Mapping
//!
//! The digest is read as eight big-endian 32-bit windows. A window is accepted
//! only below [`ROLL_ACCEPT_LIMIT`], the largest multiple of 1000 that fits in
//! 32 bits, so every roll value is equally likely. If all eight windows land in
//! the rejected tail the digest is hashed again.

use commonware_cryptography::sha256::Sha256;
use commonware_cryptography::Hasher;
use commonware_utils::hex;
use fairstake_types::constants::{DEFAULT_CLIENT_SEED, REVEALED_SEED_ARCHIVE_LEN};
use fairstake_types::fairness::MAX_CLIENT_SEED_LEN;
use fairstake_types::money::ROLL_RANGE;
use fairstake_types::{RevealedSeed, RollProof, Seed};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::collections::VecDeque;
use tracing::{debug, info};

/// Windows at or above this value are rejected (4_294_967_000 = 1000 * 4_294_967).
pub const ROLL_ACCEPT_LIMIT: u32 = u32::MAX - u32::MAX % ROLL_RANGE as u32;

/// A roll together with the proof that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RollOutcome {
    /// Roll in `1..=1000`.
    pub value: u16,
    pub proof: RollProof,
}

/// `sha256(server_seed)`.
pub fn compute_commitment(server_seed: &Seed) -> Seed {
    let mut hasher = Sha256::new();
    hasher.update(server_seed);
    hasher.finalize().0
}

pub fn verify_commitment(server_seed: &Seed, commitment: &Seed) -> bool {
    &compute_commitment(server_seed) == commitment
}

fn roll_digest(server_seed: &Seed, client_seed: &str, nonce: u64) -> Seed {
    let preimage = format!("{}:{}:{}", hex(server_seed), client_seed, nonce);
    let mut hasher = Sha256::new();
    hasher.update(preimage.as_bytes());
    hasher.finalize().0
}

fn map_digest(digest: &Seed) -> u16 {
    let mut current = *digest;
    loop {
        for window in current.chunks_exact(4) {
            let value = u32::from_be_bytes([window[0], window[1], window[2], window[3]]);
            if value < ROLL_ACCEPT_LIMIT {
                return (value % ROLL_RANGE as u32) as u16 + 1;
            }
        }
        let mut hasher = Sha256::new();
        hasher.update(&current);
        current = hasher.finalize().0;
    }
}

/// Recompute a roll from its inputs. Returns the value and the published hash.
pub fn compute_roll(server_seed: &Seed, client_seed: &str, nonce: u64) -> (u16, Seed) {
    let digest = roll_digest(server_seed, client_seed, nonce);
    (map_digest(&digest), digest)
}

/// Check a bet's proof and value against a revealed seed.
pub fn verify_roll(revealed: &RevealedSeed, proof: &RollProof, value: u16) -> bool {
    if !verify_commitment(&revealed.server_seed, &revealed.commitment) {
        return false;
    }
    if proof.commitment != revealed.commitment || proof.nonce >= revealed.rolls {
        return false;
    }
    let (expected, hash) = compute_roll(&revealed.server_seed, &proof.client_seed, proof.nonce);
    expected == value && hash == proof.hash
}

/// Source of the server-seed chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entropy {
    /// Seed the chain from the operating system. Commitments are unpredictable.
    Os,
    /// Derive the chain from a fixed value so a session can be replayed.
    /// Anyone who knows the value can compute every roll in advance.
    Replay(u64),
}

impl Entropy {
    fn seed_rng(self) -> ChaCha20Rng {
        match self {
            Entropy::Os => ChaCha20Rng::from_entropy(),
            Entropy::Replay(value) => ChaCha20Rng::seed_from_u64(value),
        }
    }
}

/// Commit-reveal roll generator.
pub struct ProvablyFair {
    server_seed: Seed,
    commitment: Seed,
    client_seed: String,
    nonce: u64,
    rolls_per_seed: u64,
    seed_rng: ChaCha20Rng,
    fallback: ChaCha20Rng,
    revealed: VecDeque<RevealedSeed>,
}

impl ProvablyFair {
    /// Create a replayable generator whose server seeds derive from `entropy`.
    pub fn new(entropy: u64, rolls_per_seed: u64) -> Self {
        Self::with_entropy(Entropy::Replay(entropy), rolls_per_seed)
    }

    pub fn with_entropy(entropy: Entropy, rolls_per_seed: u64) -> Self {
        let mut seed_rng = entropy.seed_rng();
        let fallback = ChaCha20Rng::seed_from_u64(seed_rng.next_u64());
        let mut server_seed = [0u8; 32];
        seed_rng.fill_bytes(&mut server_seed);
        Self {
            commitment: compute_commitment(&server_seed),
            server_seed,
            client_seed: DEFAULT_CLIENT_SEED.to_string(),
            nonce: 0,
            rolls_per_seed: rolls_per_seed.max(1),
            seed_rng,
            fallback,
            revealed: VecDeque::with_capacity(REVEALED_SEED_ARCHIVE_LEN),
        }
    }

    /// Draw the next roll. Rotates the seed once it has served `rolls_per_seed` rolls.
    pub fn roll(&mut self) -> RollOutcome {
        let (value, hash) = compute_roll(&self.server_seed, &self.client_seed, self.nonce);
        let proof = RollProof {
            commitment: self.commitment,
            client_seed: self.client_seed.clone(),
            nonce: self.nonce,
            hash,
        };
        self.nonce += 1;
        if self.nonce >= self.rolls_per_seed {
            self.rotate();
        }
        RollOutcome { value, proof }
    }

    /// Commitment of the live server seed.
    pub fn commitment(&self) -> Seed {
        self.commitment
    }

    pub fn client_seed(&self) -> &str {
        &self.client_seed
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Revealed seeds, newest first.
    pub fn revealed(&self) -> impl Iterator<Item = &RevealedSeed> {
        self.revealed.iter()
    }

    /// Reveal the live seed immediately and rotate to a fresh one.
    pub fn reveal(&mut self) -> RevealedSeed {
        self.rotate()
    }

    fn rotate(&mut self) -> RevealedSeed {
        let revealed = RevealedSeed {
            server_seed: self.server_seed,
            commitment: self.commitment,
            rolls: self.nonce,
        };
        if self.revealed.len() == REVEALED_SEED_ARCHIVE_LEN {
            self.revealed.pop_back();
        }
        self.revealed.push_front(revealed.clone());

        self.seed_rng.fill_bytes(&mut self.server_seed);
        self.commitment = compute_commitment(&self.server_seed);
        self.nonce = 0;
        info!(
            rolls = revealed.rolls,
            revealed = %hex(&revealed.server_seed),
            next_commitment = %hex(&self.commitment),
            "server seed rotated"
        );
        revealed
    }

    /// Set the participant-controlled client seed. Empty or oversized input is ignored.
    ///
    /// Also reseeds the decorative fallback generator so automated stake jitter
    /// is reproducible from the client seed.
    pub fn set_client_seed(&mut self, seed: &str) -> bool {
        if seed.is_empty() || seed.len() > MAX_CLIENT_SEED_LEN {
            return false;
        }
        self.client_seed = seed.to_string();
        let mut hasher = Sha256::new();
        hasher.update(seed.as_bytes());
        self.fallback = ChaCha20Rng::from_seed(hasher.finalize().0);
        debug!(client_seed = seed, "client seed updated");
        true
    }

    /// Replace the live server seed without revealing the previous one.
    pub fn set_server_seed(&mut self, server_seed: Seed) {
        self.server_seed = server_seed;
        self.commitment = compute_commitment(&server_seed);
        self.nonce = 0;
    }

    /// Decorative randomness. Never used for outcomes.
    pub fn fallback(&mut self) -> &mut ChaCha20Rng {
        &mut self.fallback
    }
}
