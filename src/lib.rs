//! Block cipher modes and chosen-plaintext attacks on ECB encryption oracles.
//!
//! PKCS#7 padding, ECB and CBC over any [`BlockCipher`], an ECB/CBC distinguisher, and the
//! byte-at-a-time attack that recovers the secret an ECB oracle appends to attacker input,
//! with or without an unknown prefix in front.
#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

pub mod attack;
mod bytes_ext;
pub mod cbc;
pub mod cipher;
pub mod ecb;
pub mod error;
pub mod oracle;
pub mod padding;
pub mod random;
pub mod sliding;

pub use attack::{crack_hard, crack_simple, discover_block_size, BlockSizeProbe, MAX_BLOCK_SIZE};
pub use cbc::{decrypt_cbc, encrypt_cbc, CbcEngine};
pub use cipher::{Aes128, BlockCipher};
pub use ecb::{decrypt_ecb, encrypt_ecb, has_repeated_block};
pub use error::{Error, Result};
pub use oracle::{
    detect_mode, ByteAtATimeOracle, DistinguisherConfig, Mode, ModeOracle, ModeOracleConfig,
    Oracle,
};
pub use padding::{pad, unpad};
pub use sliding::SlidingWindow;

/// End-to-end runs of each attack against freshly keyed oracles.
///
/// Setup and assertions only, the work happens in the library modules.
#[cfg(test)]
mod scenarios {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use crate::{
        crack_hard, crack_simple, decrypt_cbc, detect_mode, encrypt_cbc, encrypt_ecb,
        has_repeated_block, pad, random::gen_random_bytes, Aes128, ByteAtATimeOracle,
        DistinguisherConfig, ModeOracle, Oracle,
    };

    const SECRET: &[u8] = b"Rollin' in my 5.0\n\
        With my rag-top down so my hair can blow\n\
        The girlies on standby waving just to say hi\n\
        Did you stop? No, I just drove by\n";

    #[test]
    fn pkcs7_padding() {
        assert_eq!(
            pad(b"YELLOW SUBMARINE", 20),
            b"YELLOW SUBMARINE\x04\x04\x04\x04"
        );

        let doubled = pad(b"YELLOW SUBMARINE", 16);
        assert_eq!(doubled.len(), 32);
        assert_eq!(doubled[16..], [0x10; 16]);
    }

    #[test]
    fn cbc_round_trip() {
        let mut rng = rand::thread_rng();
        let key = b"YELLOW SUBMARINE";

        let ciphertext = encrypt_cbc(SECRET, key, &mut rng).unwrap();

        assert_eq!(decrypt_cbc(&ciphertext, key).unwrap(), SECRET);
    }

    #[test]
    fn ecb_detection() {
        let cipher = Aes128::new(b"YELLOW SUBMARINE").unwrap();
        let plaintext = [&SECRET[..16], &SECRET[..16], &SECRET[16..]].concat();

        assert!(has_repeated_block(&encrypt_ecb(&cipher, &plaintext).unwrap(), 16));
        assert!(!has_repeated_block(&encrypt_ecb(&cipher, SECRET).unwrap(), 16));
    }

    // this test depends on randomness, and should fail at a rate of 1/2^128
    #[test]
    fn mode_distinguisher() {
        let rounds = 1_000;
        let mut oracle = ModeOracle::new(rand::thread_rng());
        let config = DistinguisherConfig::default();

        let mut correct = 0;
        for _ in 0..rounds {
            let mut used = None;
            let guess = detect_mode(
                |input: &[u8]| {
                    let (ciphertext, mode) = oracle.encrypt(input)?;
                    used = Some(mode);
                    Ok(ciphertext)
                },
                &config,
            )
            .unwrap();

            if Some(guess) == used {
                correct += 1;
            }
        }

        assert!(f64::from(correct) / f64::from(rounds) >= 0.995);
    }

    #[test]
    fn byte_at_a_time_simple() {
        let mut rng = rand::thread_rng();
        for secret in [&b""[..], SECRET] {
            let oracle = ByteAtATimeOracle::new(&mut rng, secret.to_vec()).unwrap();

            assert_eq!(crack_simple(&oracle).unwrap(), oracle.secret());
        }
    }

    #[test]
    fn byte_at_a_time_hard() {
        let mut rng = StdRng::seed_from_u64(0x5EC2E7);
        for prefix_len in 10..30 {
            let prefix = gen_random_bytes(&mut rng, prefix_len);
            let oracle = ByteAtATimeOracle::with_prefix(&mut rng, prefix, SECRET.to_vec())
                .unwrap()
                .shuffle_prefix(&mut rng)
                .unwrap();

            assert_eq!(crack_hard(&oracle).unwrap(), SECRET, "prefix length {prefix_len}");
        }
    }

    #[test]
    fn byte_at_a_time_hard_ignores_prefix_content() {
        let mut rng = StdRng::seed_from_u64(7);
        let prefix_len = rng.gen_range(10..30);

        let recovered = [0x00, 0xFF, 0x41].map(|byte| {
            let prefix = vec![byte; prefix_len];
            let oracle =
                ByteAtATimeOracle::with_prefix(&mut rng, prefix, SECRET.to_vec()).unwrap();
            crack_hard(&oracle).unwrap()
        });

        assert!(recovered.iter().all(|secret| secret == SECRET));
    }

    #[test]
    fn oracle_errors_are_fatal() {
        let failing = |_: &[u8]| -> crate::Result<Vec<u8>> { Err(crate::Error::InvalidPadding) };

        assert!(crack_simple(&failing).is_err());
        assert!(crack_hard(&failing).is_err());
        assert!(failing.encrypt(b"").is_err());
    }
}
