//! Encryption oracles and the ECB/CBC distinguisher.

use std::{cell::RefCell, fmt, ops::RangeInclusive};

use rand::{rngs::StdRng, seq::SliceRandom, CryptoRng, Rng, RngCore, SeedableRng};

use crate::{
    bytes_ext::BytesExt,
    cbc::CbcEngine,
    cipher::{Aes128, AES_128_KEY_LEN},
    ecb::encrypt_ecb,
    error::{Error, Result},
    random::{gen_key, gen_random_bytes},
};

/// Something that encrypts attacker-chosen bytes under secrets it keeps to itself.
pub trait Oracle {
    /// # Errors
    ///
    /// Whatever stopped the oracle from answering. Attacks treat this as fatal.
    fn encrypt(&self, input: &[u8]) -> Result<Vec<u8>>;
}

impl<F> Oracle for F
where
    F: Fn(&[u8]) -> Result<Vec<u8>>,
{
    fn encrypt(&self, input: &[u8]) -> Result<Vec<u8>> {
        self(input)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Ecb,
    Cbc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeOracleConfig {
    pub key_len: usize,
    /// Lengths the random prefix and suffix are drawn from, independently.
    pub affix_len: RangeInclusive<usize>,
}

impl Default for ModeOracleConfig {
    fn default() -> Self {
        ModeOracleConfig {
            key_len: AES_128_KEY_LEN,
            affix_len: 5..=10,
        }
    }
}

/// Encrypts `random prefix || plaintext || random suffix` under a fresh key, flipping a coin
/// between ECB and CBC (with a random IV) on every call.
pub struct ModeOracle<R> {
    rng: R,
    config: ModeOracleConfig,
}

impl<R: RngCore + CryptoRng> ModeOracle<R> {
    pub fn new(rng: R) -> Self {
        Self::with_config(rng, ModeOracleConfig::default())
    }

    pub fn with_config(rng: R, config: ModeOracleConfig) -> Self {
        ModeOracle { rng, config }
    }

    /// Encrypt and also report the mode that was used, which a real distinguisher would not
    /// get to see.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidKey`] if the configured key length is not usable with AES-128.
    ///
    /// # Panics
    ///
    /// If the configured affix range is empty.
    pub fn encrypt(&mut self, plaintext: &[u8]) -> Result<(Vec<u8>, Mode)> {
        let mode = if self.rng.gen_bool(0.5) {
            Mode::Ecb
        } else {
            Mode::Cbc
        };
        let cipher = Aes128::new(&gen_random_bytes(&mut self.rng, self.config.key_len))?;

        let prefix_len = self.rng.gen_range(self.config.affix_len.clone());
        let suffix_len = self.rng.gen_range(self.config.affix_len.clone());
        let affixed = [
            gen_random_bytes(&mut self.rng, prefix_len),
            plaintext.to_vec(),
            gen_random_bytes(&mut self.rng, suffix_len),
        ]
        .concat();

        let ciphertext = match mode {
            Mode::Ecb => encrypt_ecb(&cipher, &affixed)?,
            Mode::Cbc => CbcEngine::new(cipher).encrypt(&affixed, &mut self.rng)?,
        };
        Ok((ciphertext, mode))
    }
}

impl<R> fmt::Debug for ModeOracle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModeOracle")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// What the distinguisher may assume about the oracle it is probing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistinguisherConfig {
    pub block_size: usize,
    pub min_prefix: usize,
    pub max_prefix: usize,
}

impl Default for DistinguisherConfig {
    fn default() -> Self {
        DistinguisherConfig {
            block_size: 16,
            min_prefix: 5,
            max_prefix: 10,
        }
    }
}

impl DistinguisherConfig {
    /// Index of the first of the two ciphertext blocks to compare. Past the longest prefix, and
    /// one further along so a CBC IV block doesn't shift it back into prefix territory.
    fn compared_block(&self) -> usize {
        self.max_prefix.div_ceil(self.block_size) + 1
    }

    /// Enough identical bytes that, even behind the shortest prefix, both compared blocks are
    /// entirely ours.
    fn probe_len(&self) -> usize {
        (self.compared_block() + 2) * self.block_size - self.min_prefix
    }
}

/// Decide whether `oracle` encrypts with ECB or CBC from a single query.
///
/// The oracle sees a run of identical bytes long enough that two whole blocks of it land at
/// the same indices whatever the random prefix length. ECB encrypts them to identical
/// ciphertext blocks, CBC does not.
///
/// # Errors
///
/// Whatever the oracle reports, or [`Error::InsufficientData`] if its output is too short to
/// hold the compared blocks.
///
/// # Panics
///
/// If `config` has a zero block size, or a minimum prefix longer than its maximum.
pub fn detect_mode<F>(mut oracle: F, config: &DistinguisherConfig) -> Result<Mode>
where
    F: FnMut(&[u8]) -> Result<Vec<u8>>,
{
    assert!(config.block_size > 0, "block size must be positive");
    assert!(
        config.min_prefix <= config.max_prefix,
        "min_prefix {} exceeds max_prefix {}",
        config.min_prefix,
        config.max_prefix
    );
    let ciphertext = oracle(&vec![0; config.probe_len()])?;
    let index = config.compared_block();

    let too_short = || Error::InsufficientData {
        len: ciphertext.len(),
        window: (index + 2) * config.block_size,
    };
    let first = ciphertext
        .nth_block(index, config.block_size)
        .ok_or_else(too_short)?;
    let second = ciphertext
        .nth_block(index + 1, config.block_size)
        .ok_or_else(too_short)?;

    // a CBC false positive needs two equal random blocks, 2^-128 for AES
    Ok(if first == second { Mode::Ecb } else { Mode::Cbc })
}

/// ECB-encrypts `prefix || input || secret` under a key generated once at construction.
///
/// The prefix is optional and may be reshuffled on every call; its length never changes.
pub struct ByteAtATimeOracle {
    cipher: Aes128,
    prefix: Vec<u8>,
    secret: Vec<u8>,
    shuffler: Option<RefCell<StdRng>>,
}

impl ByteAtATimeOracle {
    /// # Errors
    ///
    /// Only if the generated key is rejected, which would be a bug.
    pub fn new<R: RngCore + CryptoRng>(rng: &mut R, secret: Vec<u8>) -> Result<Self> {
        Self::with_prefix(rng, Vec::new(), secret)
    }

    /// # Errors
    ///
    /// Only if the generated key is rejected, which would be a bug.
    pub fn with_prefix<R: RngCore + CryptoRng>(
        rng: &mut R,
        prefix: Vec<u8>,
        secret: Vec<u8>,
    ) -> Result<Self> {
        Ok(ByteAtATimeOracle {
            cipher: Aes128::new(&gen_key(rng))?,
            prefix,
            secret,
            shuffler: None,
        })
    }

    /// Reorder the prefix bytes before every encryption, seeding the shuffle from `rng`.
    ///
    /// # Errors
    ///
    /// [`Error::Rng`] if `rng` cannot produce a seed.
    pub fn shuffle_prefix<R: RngCore + CryptoRng>(mut self, rng: &mut R) -> Result<Self> {
        self.shuffler = Some(RefCell::new(StdRng::from_rng(rng)?));
        Ok(self)
    }

    /// The secret suffix, for checking an attack's output.
    pub fn secret(&self) -> &[u8] {
        &self.secret
    }
}

impl Oracle for ByteAtATimeOracle {
    fn encrypt(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut prefix = self.prefix.clone();
        if let Some(shuffler) = &self.shuffler {
            prefix.shuffle(&mut *shuffler.borrow_mut());
        }
        encrypt_ecb(&self.cipher, &[&prefix[..], input, &self.secret].concat())
    }
}

impl fmt::Debug for ByteAtATimeOracle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteAtATimeOracle")
            .field("prefix_len", &self.prefix.len())
            .field("secret_len", &self.secret.len())
            .field("shuffled", &self.shuffler.is_some())
            .finish_non_exhaustive()
    }
}
