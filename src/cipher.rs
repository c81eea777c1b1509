//! The single-block primitive the modes are built on.

use openssl::symm::{self, Crypter, Mode};

use crate::error::{Error, Result};

pub const AES_128_KEY_LEN: usize = 16;

/// A keyed permutation over fixed-size blocks.
pub trait BlockCipher {
    fn block_size(&self) -> usize;

    /// Encrypt exactly one block.
    ///
    /// # Errors
    ///
    /// Whatever the underlying primitive reports.
    fn encrypt_block(&self, block: &[u8]) -> Result<Vec<u8>>;

    /// Decrypt exactly one block.
    ///
    /// # Errors
    ///
    /// Whatever the underlying primitive reports.
    fn decrypt_block(&self, block: &[u8]) -> Result<Vec<u8>>;

    /// Encrypt a block-aligned buffer one block at a time, with no chaining.
    ///
    /// # Errors
    ///
    /// Whatever [`BlockCipher::encrypt_block`] reports.
    fn encrypt_blocks(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(data.len());
        for block in data.chunks_exact(self.block_size()) {
            out.extend_from_slice(&self.encrypt_block(block)?);
        }
        Ok(out)
    }

    /// Decrypt a block-aligned buffer one block at a time, with no chaining.
    ///
    /// # Errors
    ///
    /// Whatever [`BlockCipher::decrypt_block`] reports.
    fn decrypt_blocks(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(data.len());
        for block in data.chunks_exact(self.block_size()) {
            out.extend_from_slice(&self.decrypt_block(block)?);
        }
        Ok(out)
    }
}

/// AES-128 on top of openssl, used strictly as a block permutation.
#[derive(Clone)]
pub struct Aes128 {
    key: [u8; AES_128_KEY_LEN],
}

impl Aes128 {
    /// # Errors
    ///
    /// [`Error::InvalidKey`] unless `key` is exactly 16 bytes.
    pub fn new(key: &[u8]) -> Result<Self> {
        let key: [u8; AES_128_KEY_LEN] = key
            .try_into()
            .map_err(|_| Error::InvalidKey { len: key.len() })?;
        Ok(Aes128 { key })
    }

    /// Run `data` through raw AES-ECB. `data` must already be block aligned: we do padding and
    /// chaining ourselves, so openssl's are switched off.
    fn crypt(&self, mode: Mode, data: &[u8]) -> Result<Vec<u8>> {
        let openssl_cipher = symm::Cipher::aes_128_ecb();
        assert_eq!(
            data.len() % openssl_cipher.block_size(),
            0,
            "input of {} bytes is not block aligned",
            data.len()
        );

        let mut crypter = Crypter::new(openssl_cipher, mode, &self.key, None)?;
        crypter.pad(false);

        let mut buf = vec![0; data.len() + openssl_cipher.block_size()];
        let mut count = crypter.update(data, &mut buf)?;
        count += crypter.finalize(&mut buf[count..])?;
        buf.truncate(count);

        Ok(buf)
    }
}

impl std::fmt::Debug for Aes128 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aes128").finish_non_exhaustive()
    }
}

impl BlockCipher for Aes128 {
    fn block_size(&self) -> usize {
        symm::Cipher::aes_128_ecb().block_size()
    }

    fn encrypt_block(&self, block: &[u8]) -> Result<Vec<u8>> {
        assert_eq!(block.len(), self.block_size(), "not a single block");
        self.crypt(Mode::Encrypt, block)
    }

    fn decrypt_block(&self, block: &[u8]) -> Result<Vec<u8>> {
        assert_eq!(block.len(), self.block_size(), "not a single block");
        self.crypt(Mode::Decrypt, block)
    }

    // one openssl context for the whole buffer, the attack calls this a lot
    fn encrypt_blocks(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.crypt(Mode::Encrypt, data)
    }

    fn decrypt_blocks(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.crypt(Mode::Decrypt, data)
    }
}
