use crate::error::{Error, Result};

/// An append-only byte buffer read through a fixed-width window that only moves forward.
///
/// The byte-at-a-time attack keeps every recovered byte here and reads the last
/// `block_size - 1` of them back through the window as the known part of its next guess.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    buffer: Vec<u8>,
    start: usize,
    window_len: usize,
}

impl SlidingWindow {
    /// Start a buffer holding `window_len` zero bytes, so the window is readable straight away.
    pub fn with_sentinel(window_len: usize) -> Self {
        SlidingWindow {
            buffer: vec![0; window_len],
            start: 0,
            window_len,
        }
    }

    pub fn append(&mut self, byte: u8) {
        self.buffer.push(byte);
    }

    /// Copy of the `window_len` bytes at the current start.
    ///
    /// # Errors
    ///
    /// [`Error::InsufficientData`] if the buffer is shorter than the window.
    pub fn window(&self) -> Result<Vec<u8>> {
        self.buffer
            .get(self.start..self.start + self.window_len)
            .map(<[u8]>::to_vec)
            .ok_or(Error::InsufficientData {
                len: self.buffer.len(),
                window: self.window_len,
            })
    }

    /// Move the window forward by `steps`.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfRange`] if the window would run past the end of the buffer. The window
    /// does not move in that case.
    pub fn advance(&mut self, steps: usize) -> Result<()> {
        if self.start + steps + self.window_len > self.buffer.len() {
            return Err(Error::OutOfRange {
                start: self.start,
                steps,
                window: self.window_len,
                len: self.buffer.len(),
            });
        }
        self.start += steps;
        Ok(())
    }

    /// Everything appended so far, sentinel prefix included.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_buffer(self) -> Vec<u8> {
        self.buffer
    }
}
