//! ECB mode and its tell-tale block repetition.

use std::collections::HashSet;

use crate::{
    cipher::BlockCipher,
    error::Result,
    padding::{pad, unpad_block},
};

/// Pad `plaintext` and encrypt each block independently.
///
/// # Errors
///
/// Whatever the cipher reports.
pub fn encrypt_ecb<C: BlockCipher>(cipher: &C, plaintext: &[u8]) -> Result<Vec<u8>> {
    cipher.encrypt_blocks(&pad(plaintext, cipher.block_size()))
}

/// Decrypt each block independently and strip the padding.
///
/// # Errors
///
/// [`crate::Error::InvalidPadding`] if the final block is malformed.
///
/// # Panics
///
/// If `ciphertext` is not a whole number of blocks.
pub fn decrypt_ecb<C: BlockCipher>(cipher: &C, ciphertext: &[u8]) -> Result<Vec<u8>> {
    let block_size = cipher.block_size();
    assert!(
        ciphertext.len() % block_size == 0,
        "ciphertext length {} is not a multiple of {block_size}",
        ciphertext.len()
    );

    let plaintext = cipher.decrypt_blocks(ciphertext)?;
    Ok(unpad_block(&plaintext, block_size)?.to_vec())
}

/// Determine if a ciphertext is likely ECB encrypted, by checking whether any two
/// `block_len`-byte blocks are identical. A trailing partial block is ignored.
///
/// A `false` means the ciphertext is not ECB, is too short, or its plaintext had no repeated
/// blocks.
#[must_use]
pub fn has_repeated_block(ciphertext: &[u8], block_len: usize) -> bool {
    if block_len == 0 {
        return false;
    }
    let mut seen = HashSet::new();
    ciphertext
        .chunks_exact(block_len)
        .any(|block| !seen.insert(block))
}

/// Byte offset of the first block that is identical to the block right after it.
#[must_use]
pub fn first_repeated_pair(ciphertext: &[u8], block_len: usize) -> Option<usize> {
    if block_len == 0 {
        return None;
    }
    ciphertext
        .chunks_exact(block_len)
        .collect::<Vec<_>>()
        .windows(2)
        .position(|pair| pair[0] == pair[1])
        .map(|index| index * block_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{cbc::CbcEngine, cipher::Aes128};

    const KEY: &[u8] = b"This is 16 bytes";

    #[test]
    fn test_ecb_matches_openssl() {
        use openssl::symm::{encrypt, Cipher};

        let cipher = Aes128::new(KEY).unwrap();
        for plaintext in [&b""[..], b"0123456789abcdef", b"Look on my Works, ye Mighty"] {
            let expected = encrypt(Cipher::aes_128_ecb(), KEY, None, plaintext).unwrap();
            let actual = encrypt_ecb(&cipher, plaintext).unwrap();

            assert_eq!(
                actual,
                expected,
                r#"plaintext: "{}""#,
                plaintext.escape_ascii()
            );
            assert_eq!(decrypt_ecb(&cipher, &actual).unwrap(), plaintext);
        }
    }

    #[test]
    fn test_detects_ecb_with_two_equal_plaintext_blocks() {
        let cipher = Aes128::new(KEY).unwrap();
        // the run of A's covers exactly the second and third blocks
        let plaintext = [&[0u8; 13][..], b"pre", &[b'A'; 32], b"post"].concat();

        let ciphertext = encrypt_ecb(&cipher, &plaintext).unwrap();

        assert!(has_repeated_block(&ciphertext, 16));
    }

    #[test]
    fn test_cbc_is_not_flagged() {
        let engine = CbcEngine::new(Aes128::new(KEY).unwrap());
        let plaintext = b"The girlies on standby waving just to say hi, did you stop?";

        let ciphertext = engine
            .encrypt(plaintext, &mut rand::thread_rng())
            .unwrap();

        assert!(!has_repeated_block(&ciphertext, 16));
    }

    #[test]
    fn test_repeated_block_ignores_partial_tail() {
        assert!(!has_repeated_block(b"abcdab", 4));
        assert!(has_repeated_block(b"abcdxyzwabcdq", 4));
        assert!(!has_repeated_block(b"abcd", 0));
    }

    #[test]
    fn test_first_repeated_pair_needs_adjacency() {
        assert_eq!(first_repeated_pair(b"abcdxxxxabcd", 4), None);
        assert_eq!(first_repeated_pair(b"abcdxxxxxxxxxxxx", 4), Some(4));
    }
}
