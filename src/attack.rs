//! Byte-at-a-time recovery of the secret an ECB oracle appends to our input.
//!
//! Line a byte of the secret up as the last byte of a block whose other bytes we already know,
//! then try every candidate for it until the ciphertext block matches.

use tracing::{debug, instrument, trace};

use crate::{
    ecb::first_repeated_pair,
    error::{Error, Result},
    oracle::Oracle,
    sliding::SlidingWindow,
};

/// Block sizes beyond this are not probed for.
pub const MAX_BLOCK_SIZE: usize = 256;

/// What the oracle's output length reveals about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSizeProbe {
    pub block_size: usize,
    /// Shortest input that made the ciphertext grow by a block.
    pub force_padding_size: usize,
    /// Ciphertext length for an empty input.
    pub empty_len: usize,
}

impl BlockSizeProbe {
    /// Bytes the oracle wraps around our input. An oracle that doesn't add a full block of
    /// padding to aligned input shows none.
    #[must_use]
    pub fn affix_len(&self) -> usize {
        self.empty_len.saturating_sub(self.force_padding_size)
    }
}

/// Grow the input a byte at a time until the ciphertext grows. The jump is the block size.
///
/// # Errors
///
/// [`Error::BlockSizeNotFound`] if the output never grows within [`MAX_BLOCK_SIZE`] bytes of
/// input, or whatever the oracle reports.
pub fn discover_block_size<O: Oracle + ?Sized>(oracle: &O) -> Result<BlockSizeProbe> {
    let empty_len = oracle.encrypt(&[])?.len();

    for input_len in 1..=MAX_BLOCK_SIZE {
        let len = oracle.encrypt(&vec![0; input_len])?.len();
        if len > empty_len {
            return Ok(BlockSizeProbe {
                block_size: len - empty_len,
                force_padding_size: input_len,
                empty_len,
            });
        }
    }

    Err(Error::BlockSizeNotFound {
        probed: MAX_BLOCK_SIZE,
    })
}

/// Where our input sits in the oracle's plaintext, and how much secret follows it.
#[derive(Debug, Clone, Copy)]
struct Layout {
    block_size: usize,
    /// Filler that completes the prefix's last block, sent ahead of every query.
    alignment: usize,
    /// Byte offset of the first block that starts with our own bytes after the alignment.
    offset: usize,
    secret_len: usize,
}

/// Recover the secret appended by an ECB oracle that puts nothing in front of our input.
///
/// Stops early and returns what it has if some byte cannot be matched, for instance because
/// the oracle is not deterministic ECB.
///
/// # Errors
///
/// Whatever the oracle reports, or [`Error::BlockSizeNotFound`].
#[instrument(skip_all)]
pub fn crack_simple<O: Oracle + ?Sized>(oracle: &O) -> Result<Vec<u8>> {
    let probe = discover_block_size(oracle)?;
    debug!(
        block_size = probe.block_size,
        force_padding_size = probe.force_padding_size,
        "discovered block size"
    );

    recover(
        oracle,
        Layout {
            block_size: probe.block_size,
            alignment: 0,
            offset: 0,
            secret_len: probe.affix_len(),
        },
    )
}

/// Recover the secret appended by an ECB oracle that also prepends a fixed-length prefix we
/// don't know. The prefix bytes may change between calls, its length may not.
///
/// # Errors
///
/// Whatever the oracle reports, [`Error::BlockSizeNotFound`], [`Error::BoundaryNotFound`] or
/// [`Error::PrefixLengthNotFound`].
#[instrument(skip_all)]
pub fn crack_hard<O: Oracle + ?Sized>(oracle: &O) -> Result<Vec<u8>> {
    let probe = discover_block_size(oracle)?;
    let block_size = probe.block_size;
    debug!(
        block_size,
        force_padding_size = probe.force_padding_size,
        "discovered block size"
    );

    let boundary = locate_boundary(oracle, &probe)?;
    let prefix_len = measure_prefix(oracle, block_size, &boundary)?;
    let secret_len = probe
        .affix_len()
        .checked_sub(prefix_len)
        .ok_or(Error::PrefixLengthNotFound)?;
    debug!(
        collision_index = boundary.collision_index,
        prefix_len, secret_len, "measured prefix"
    );

    recover(
        oracle,
        Layout {
            block_size,
            alignment: boundary.collision_index - prefix_len,
            offset: boundary.collision_index,
            secret_len,
        },
    )
}

/// First block boundary after the prefix, and the ciphertext of a block of `fill` there.
struct Boundary {
    collision_index: usize,
    fill: u8,
    reference_block: Vec<u8>,
}

/// Send enough copies of one byte to fill two whole aligned blocks and find the first pair of
/// equal adjacent ciphertext blocks.
///
/// A prefix ending in the fill byte can pull the pair a block early, so two different fills
/// are tried and the later boundary wins: no prefix ends in both.
fn locate_boundary<O: Oracle + ?Sized>(oracle: &O, probe: &BlockSizeProbe) -> Result<Boundary> {
    let block_size = probe.block_size;
    let mut best: Option<Boundary> = None;

    for fill in [0x00, 0xFF] {
        let ciphertext = oracle.encrypt(&vec![fill; probe.force_padding_size + 3 * block_size])?;
        let Some(collision_index) = first_repeated_pair(&ciphertext, block_size) else {
            continue;
        };
        trace!(fill, collision_index, "found repeated pair");

        if best
            .as_ref()
            .map_or(true, |found| collision_index > found.collision_index)
        {
            best = Some(Boundary {
                collision_index,
                fill,
                reference_block: ciphertext[collision_index..collision_index + block_size]
                    .to_vec(),
            });
        }
    }

    best.ok_or(Error::BoundaryNotFound)
}

/// Slide a differing marker byte right, behind a growing run of fill bytes, until it falls into
/// the block at the boundary. The fill in front of it then completes the prefix's last block.
fn measure_prefix<O: Oracle + ?Sized>(
    oracle: &O,
    block_size: usize,
    boundary: &Boundary,
) -> Result<usize> {
    let marker = boundary.fill ^ 0x01;
    let block = boundary.collision_index..boundary.collision_index + block_size;

    for pad_len in 0..block_size {
        let input = [
            vec![boundary.fill; pad_len],
            vec![marker],
            vec![boundary.fill; 2 * block_size],
        ]
        .concat();
        let ciphertext = oracle.encrypt(&input)?;

        if ciphertext.get(block.clone()) != Some(&boundary.reference_block[..]) {
            return boundary
                .collision_index
                .checked_sub(pad_len)
                .ok_or(Error::PrefixLengthNotFound);
        }
    }

    Err(Error::PrefixLengthNotFound)
}

fn recover<O: Oracle + ?Sized>(oracle: &O, layout: Layout) -> Result<Vec<u8>> {
    let block_size = layout.block_size;
    let mut guesses = SlidingWindow::with_sentinel(block_size - 1);
    let mut recovered = 0;

    'blocks: for block_index in 0.. {
        for byte_pos in (0..block_size).rev() {
            if recovered == layout.secret_len {
                break 'blocks;
            }
            match recover_byte(oracle, &layout, &guesses, block_index, byte_pos) {
                Ok(byte) => {
                    guesses.append(byte);
                    guesses.advance(1)?;
                    recovered += 1;
                    trace!(byte, recovered, "recovered byte");
                }
                Err(Error::AttackAborted { recovered }) => {
                    debug!(
                        recovered,
                        expected = layout.secret_len,
                        "no candidate matched, stopping early"
                    );
                    break 'blocks;
                }
                Err(err) => return Err(err),
            }
        }
    }

    Ok(guesses
        .into_buffer()
        .into_iter()
        .skip(block_size - 1)
        .take(layout.secret_len)
        .collect())
}

/// Recover the secret byte that lands last in block `block_index` (counted from the layout's
/// offset) when `byte_pos` filler bytes are sent.
fn recover_byte<O: Oracle + ?Sized>(
    oracle: &O,
    layout: &Layout,
    guesses: &SlidingWindow,
    block_index: usize,
    byte_pos: usize,
) -> Result<u8> {
    let block_size = layout.block_size;
    let aborted = || Error::AttackAborted {
        recovered: guesses.buffer().len() - (block_size - 1),
    };

    let reference = oracle.encrypt(&vec![0; layout.alignment + byte_pos])?;
    let target = layout.offset + block_index * block_size;
    let reference_block = reference
        .get(target..target + block_size)
        .ok_or_else(aborted)?;

    let mut input = [vec![0; layout.alignment], guesses.window()?, vec![0]].concat();
    let first = layout.offset..layout.offset + block_size;

    for candidate in 0..=u8::MAX {
        if let Some(last) = input.last_mut() {
            *last = candidate;
        }
        let ciphertext = oracle.encrypt(&input)?;
        if ciphertext.get(first.clone()) == Some(reference_block) {
            return Ok(candidate);
        }
    }

    Err(aborted())
}
