//! PKCS#7 padding.

use crate::error::{Error, Result};

/// Pad `data` to a multiple of `block_len` by appending `k` copies of the byte `k`.
///
/// At least one byte is always added: input that is already block aligned gains a full block
/// of padding, so that [`unpad`] is unambiguous. A `block_len` of zero, or one too large for
/// the pad length to fit in a byte, yields an empty result.
#[must_use]
pub fn pad(data: &[u8], block_len: usize) -> Vec<u8> {
    if block_len == 0 || block_len > usize::from(u8::MAX) {
        return Vec::new();
    }

    let pad_len = block_len - data.len() % block_len;
    let mut padded = Vec::with_capacity(data.len() + pad_len);
    padded.extend_from_slice(data);
    #[allow(clippy::cast_possible_truncation)]
    padded.resize(data.len() + pad_len, pad_len as u8);
    padded
}

/// Strip PKCS#7 padding, trusting the last byte for the pad length.
///
/// # Errors
///
/// [`Error::InvalidPadding`] if the pad length is zero, longer than the input, or the trailing
/// bytes don't all equal it.
pub fn unpad(padded: &[u8]) -> Result<&[u8]> {
    let pad_len = usize::from(*padded.last().ok_or(Error::InvalidPadding)?);

    if pad_len == 0 || pad_len > padded.len() {
        return Err(Error::InvalidPadding);
    }

    let unpadded_len = padded.len() - pad_len;
    if padded[unpadded_len..]
        .iter()
        .all(|&b| usize::from(b) == pad_len)
    {
        Ok(&padded[..unpadded_len])
    } else {
        Err(Error::InvalidPadding)
    }
}

/// Whether `padded` is a whole number of `block_len` blocks ending in a pad of `[1, block_len]`
/// bytes.
#[must_use]
pub fn padding_valid(padded: &[u8], block_len: usize) -> bool {
    let Some(&last) = padded.last() else {
        return false;
    };
    if block_len == 0 || padded.len() % block_len != 0 || usize::from(last) > block_len {
        return false;
    }
    unpad(padded).is_ok()
}

/// [`unpad`] for block-structured plaintext, rejecting pad lengths above `block_len`.
///
/// # Errors
///
/// [`Error::InvalidPadding`] unless [`padding_valid`] holds.
pub fn unpad_block(padded: &[u8], block_len: usize) -> Result<&[u8]> {
    if !padding_valid(padded, block_len) {
        return Err(Error::InvalidPadding);
    }
    unpad(padded)
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(b"YELL", 4, b"YELL\x04\x04\x04\x04")]
    #[case(b"YELLOWS!!!", 6, b"YELLOWS!!!\x02\x02")]
    #[case(b"YELLOW SUBMARINE", 20, b"YELLOW SUBMARINE\x04\x04\x04\x04")]
    #[case(b"", 3, b"\x03\x03\x03")]
    #[case(b"ab", 1, b"ab\x01")]
    fn test_pad_appends_pad_len_copies(
        #[case] input: &[u8],
        #[case] block_len: usize,
        #[case] expected: &[u8],
    ) {
        assert_eq!(pad(input, block_len), expected);
    }

    #[test]
    fn test_pad_aligned_input_gains_full_block() {
        let input = b"YELLOW SUBMARINE";

        let padded = pad(input, 16);

        assert_eq!(padded.len(), 32);
        assert_eq!(&padded[..16], input);
        assert!(padded[16..].iter().all(|&b| b == 0x10));
    }

    #[test]
    fn test_pad_rejects_unusable_block_len() {
        assert!(pad(b"abc", 0).is_empty());
        assert!(pad(b"abc", 256).is_empty());
    }

    #[test]
    fn test_unpad_strips_padding() {
        assert_eq!(unpad(b"ICE ICE BABY\x04\x04\x04\x04").unwrap(), b"ICE ICE BABY");
    }

    #[rstest]
    #[case::empty(b"")]
    #[case::zero_pad(b"ICE ICE BABY\x00")]
    #[case::pad_too_big(b"ICE ICE BABY\x05\x05\x05\x05")]
    #[case::mixed(b"ICE ICE BABY\x01\x02\x03\x04")]
    #[case::longer_than_input(b"ICE ICE BABY\xFF")]
    fn test_unpad_rejects_malformed_trailer(#[case] input: &[u8]) {
        assert!(matches!(unpad(input), Err(Error::InvalidPadding)));
    }

    #[test]
    fn test_padding_valid_checks_block_structure() {
        assert!(padding_valid(b"ICE ICE BABY\x04\x04\x04\x04", 16));
        assert!(padding_valid(
            b"ICE ICE BABY\x0C\x0C\x0C\x0C\x0C\x0C\x0C\x0C\x0C\x0C\x0C\x0C",
            12
        ));
        assert!(!padding_valid(b"ICE ICE BABY\x03\x03\x03", 16));
        assert!(!padding_valid(&[0x11; 16], 16));
        assert!(unpad(&[0x11; 17]).is_ok());
        assert!(matches!(unpad_block(&[0x11; 16], 16), Err(Error::InvalidPadding)));
    }

    proptest! {
        #[test]
        fn pad_then_unpad_is_identity(
            data in proptest::collection::vec(any::<u8>(), 0..200),
            block_len in 1usize..=255,
        ) {
            let padded = pad(&data, block_len);
            prop_assert_eq!(padded.len() % block_len, 0);
            prop_assert!(padded.len() > data.len());
            prop_assert_eq!(unpad_block(&padded, block_len).unwrap(), &data[..]);
        }
    }
}
