pub(crate) trait BytesExt {
    /// Xor self with another slice of bytes of equal length
    fn xor<B: AsRef<[u8]>>(&self, other: B) -> Vec<u8>;

    /// The `index`th block of `block_size` bytes, if it is complete.
    fn nth_block(&self, index: usize, block_size: usize) -> Option<&[u8]>;
}

fn assert_same_length(a: &[u8], b: &[u8]) {
    assert_eq!(
        a.len(),
        b.len(),
        "Length mismatch: {} != {}",
        a.len(),
        b.len()
    );
}

impl BytesExt for [u8] {
    fn xor<B: AsRef<[u8]>>(&self, other: B) -> Vec<u8> {
        assert_same_length(self, other.as_ref());

        self.iter()
            .zip(other.as_ref().iter())
            .map(|(a, b)| a ^ b)
            .collect()
    }

    fn nth_block(&self, index: usize, block_size: usize) -> Option<&[u8]> {
        self.chunks_exact(block_size).nth(index)
    }
}
