/// Append-only chunk buffer for an active recording.
///
/// Wrap in `Arc<parking_lot::Mutex<RecordingBuffer>>` to share it with the
/// platform's chunk callback.
///
/// Chunks are kept in arrival order and concatenated once at assembly time.
/// Once sealed (assembled or discarded) further chunks are dropped.
#[derive(Debug, Default)]
pub struct RecordingBuffer {
    chunks: Vec<Vec<u8>>,
    total_bytes: usize,
    sealed: bool,
    discarded: bool,
}

impl RecordingBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one chunk. Empty chunks are skipped.
    ///
    /// Returns whether the chunk was kept.
    pub fn append(&mut self, chunk: &[u8]) -> bool {
        if self.sealed || chunk.is_empty() {
            return false;
        }
        self.total_bytes += chunk.len();
        self.chunks.push(chunk.to_vec());
        true
    }

    /// Concatenate every chunk in arrival order and seal the buffer.
    pub fn assemble(&mut self) -> Vec<u8> {
        let mut clip = Vec::with_capacity(self.total_bytes);
        for chunk in self.chunks.drain(..) {
            clip.extend_from_slice(&chunk);
        }
        self.total_bytes = 0;
        self.sealed = true;
        clip
    }

    /// Drop everything without assembling and seal the buffer.
    pub fn discard(&mut self) {
        self.chunks.clear();
        self.total_bytes = 0;
        self.sealed = true;
        self.discarded = true;
    }

    pub fn is_discarded(&self) -> bool {
        self.discarded
    }

    /// Total bytes buffered so far.
    pub fn len(&self) -> usize {
        self.total_bytes
    }

    pub fn is_empty(&self) -> bool {
        self.total_bytes == 0
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembles_in_arrival_order() {
        let mut buf = RecordingBuffer::new();
        buf.append(&[1, 2]);
        buf.append(&[3]);
        buf.append(&[4, 5, 6]);

        assert_eq!(buf.len(), 6);
        assert_eq!(buf.chunk_count(), 3);
        assert_eq!(buf.assemble(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn empty_chunks_are_skipped() {
        let mut buf = RecordingBuffer::new();
        assert!(!buf.append(&[]));
        assert!(buf.append(&[7]));

        assert_eq!(buf.chunk_count(), 1);
    }

    #[test]
    fn sealed_after_assembly() {
        let mut buf = RecordingBuffer::new();
        buf.append(&[1]);
        let clip = buf.assemble();

        assert_eq!(clip, vec![1]);
        assert!(!buf.append(&[2]));
        assert!(buf.is_empty());
        assert!(!buf.is_discarded());
    }

    #[test]
    fn discard_drops_late_chunks() {
        let mut buf = RecordingBuffer::new();
        buf.append(&[1, 2, 3]);
        buf.discard();

        assert!(buf.is_discarded());
        assert!(buf.is_empty());
        assert!(!buf.append(&[4]));
        assert_eq!(buf.chunk_count(), 0);
    }
}
