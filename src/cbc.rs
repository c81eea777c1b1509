//! Cipher block chaining over any [`BlockCipher`].

use rand::{CryptoRng, RngCore};

use crate::{
    bytes_ext::BytesExt,
    cipher::{Aes128, BlockCipher},
    error::Result,
    padding::{pad, unpad_block},
    random::gen_random_bytes,
};

#[derive(Debug, Clone)]
pub struct CbcEngine<C> {
    cipher: C,
}

impl<C: BlockCipher> CbcEngine<C> {
    pub fn new(cipher: C) -> Self {
        CbcEngine { cipher }
    }

    pub fn block_size(&self) -> usize {
        self.cipher.block_size()
    }

    /// Encrypt under a fresh random IV, which is returned as the first ciphertext block.
    ///
    /// # Errors
    ///
    /// Whatever the cipher reports.
    pub fn encrypt<R: RngCore + CryptoRng>(
        &self,
        plaintext: &[u8],
        rng: &mut R,
    ) -> Result<Vec<u8>> {
        let iv = gen_random_bytes(rng, self.block_size());
        let body = self.encrypt_with_iv(plaintext, &iv)?;
        Ok([iv, body].concat())
    }

    /// Decrypt `IV || C1 || ... || Cn` as produced by [`CbcEngine::encrypt`].
    ///
    /// # Errors
    ///
    /// [`crate::Error::InvalidPadding`] when the recovered plaintext is not correctly padded.
    ///
    /// # Panics
    ///
    /// If `ciphertext` is not a whole number of blocks or is shorter than two blocks. That is a
    /// caller bug, not something an attacker can trigger through the padding.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let block_size = self.block_size();
        assert!(
            ciphertext.len() % block_size == 0 && ciphertext.len() >= 2 * block_size,
            "ciphertext of {} bytes is not at least two whole {block_size}-byte blocks",
            ciphertext.len()
        );

        let (iv, body) = ciphertext.split_at(block_size);
        self.decrypt_with_iv(body, iv)
    }

    /// Encrypt with a caller-chosen IV. The IV is not part of the output.
    ///
    /// # Errors
    ///
    /// Whatever the cipher reports.
    ///
    /// # Panics
    ///
    /// If `iv` is not exactly one block.
    pub fn encrypt_with_iv(&self, plaintext: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
        let block_size = self.block_size();
        assert_eq!(iv.len(), block_size, "iv must be a single block");

        let padded = pad(plaintext, block_size);
        let mut ciphertext = Vec::with_capacity(padded.len());
        let mut last_ciphertext_block = iv.to_vec();

        for block in padded.chunks_exact(block_size) {
            last_ciphertext_block = self
                .cipher
                .encrypt_block(&block.xor(&last_ciphertext_block))?;
            ciphertext.extend_from_slice(&last_ciphertext_block);
        }

        Ok(ciphertext)
    }

    /// Decrypt a body produced by [`CbcEngine::encrypt_with_iv`].
    ///
    /// # Errors
    ///
    /// [`crate::Error::InvalidPadding`] when the recovered plaintext is not correctly padded.
    ///
    /// # Panics
    ///
    /// If `iv` is not one block, or `ciphertext` is not a whole number of blocks.
    pub fn decrypt_with_iv(&self, ciphertext: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
        let block_size = self.block_size();
        assert_eq!(iv.len(), block_size, "iv must be a single block");
        assert!(
            ciphertext.len() % block_size == 0,
            "ciphertext length {} is not a multiple of {block_size}",
            ciphertext.len()
        );

        let mut plaintext = Vec::with_capacity(ciphertext.len());
        let mut previous = iv;

        for block in ciphertext.chunks_exact(block_size) {
            plaintext.extend_from_slice(&self.cipher.decrypt_block(block)?.xor(previous));
            previous = block;
        }

        Ok(unpad_block(&plaintext, block_size)?.to_vec())
    }
}

/// AES-128-CBC encrypt `plaintext` under `key` with a random, prepended IV.
///
/// # Errors
///
/// [`crate::Error::InvalidKey`] if `key` is not 16 bytes.
pub fn encrypt_cbc<R: RngCore + CryptoRng>(
    plaintext: &[u8],
    key: &[u8],
    rng: &mut R,
) -> Result<Vec<u8>> {
    CbcEngine::new(Aes128::new(key)?).encrypt(plaintext, rng)
}

/// AES-128-CBC decrypt the output of [`encrypt_cbc`].
///
/// # Errors
///
/// [`crate::Error::InvalidKey`] for a bad key, [`crate::Error::InvalidPadding`] for a bad
/// trailer.
///
/// # Panics
///
/// See [`CbcEngine::decrypt`].
pub fn decrypt_cbc(ciphertext: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    CbcEngine::new(Aes128::new(key)?).decrypt(ciphertext)
}
