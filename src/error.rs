/// Everything that can go wrong in this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The PKCS#7 trailer is missing or malformed.
    #[error("invalid padding")]
    InvalidPadding,

    #[error("invalid key length {len}, expected 16 bytes")]
    InvalidKey { len: usize },

    #[error("buffer holds {len} bytes, fewer than the window length {window}")]
    InsufficientData { len: usize, window: usize },

    #[error("cannot advance window at {start} by {steps}: {window} bytes would exceed buffer length {len}")]
    OutOfRange {
        start: usize,
        steps: usize,
        window: usize,
        len: usize,
    },

    /// No candidate byte reproduced the reference block.
    #[error("no candidate byte matched after recovering {recovered} bytes")]
    AttackAborted { recovered: usize },

    #[error("ciphertext length did not change after {probed} bytes of input")]
    BlockSizeNotFound { probed: usize },

    #[error("no adjacent identical ciphertext blocks, is the oracle using ECB?")]
    BoundaryNotFound,

    #[error("could not locate the end of the oracle prefix")]
    PrefixLengthNotFound,

    #[error(transparent)]
    Cipher(#[from] openssl::error::ErrorStack),

    #[error(transparent)]
    Rng(#[from] rand::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
