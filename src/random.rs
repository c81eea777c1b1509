use rand::{CryptoRng, RngCore};

use crate::cipher::AES_128_KEY_LEN;

pub fn gen_random_bytes<R: RngCore + CryptoRng>(rng: &mut R, len: usize) -> Vec<u8> {
    let mut bytes = vec![0; len];
    rng.fill_bytes(&mut bytes);
    bytes
}

/// A fresh AES-128 key.
pub fn gen_key<R: RngCore + CryptoRng>(rng: &mut R) -> Vec<u8> {
    gen_random_bytes(rng, AES_128_KEY_LEN)
}
