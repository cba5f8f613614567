use std::fmt;

/// Something the recorder hands over as one fragment of encoded output.
pub trait ChunkPayload {
    /// Size of the chunk in bytes
    fn byte_len(&self) -> u64;
}

impl ChunkPayload for Vec<u8> {
    fn byte_len(&self) -> u64 {
        self.len() as u64
    }
}

/// Position of a chunk within its session, in delivery order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkId(pub u64);

impl ChunkId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Append-only buffer of the chunks delivered during one session.
///
/// Empty chunks never enter the buffer.
#[derive(Debug)]
pub struct ChunkBuffer<C> {
    chunks: Vec<C>,
    next_id: ChunkId,
    total_bytes: u64,
}

impl<C: ChunkPayload> ChunkBuffer<C> {
    pub fn new() -> Self {
        Self {
            chunks: Vec::new(),
            next_id: ChunkId::new(0),
            total_bytes: 0,
        }
    }

    /// Append a chunk, returning its id, or `None` if it was empty.
    pub fn push(&mut self, chunk: C) -> Option<ChunkId> {
        let size = chunk.byte_len();
        if size == 0 {
            return None;
        }

        let id = self.next_id;
        self.next_id = id.next();
        self.total_bytes += size;
        self.chunks.push(chunk);
        Some(id)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Take every buffered chunk in delivery order, leaving the buffer empty
    pub fn drain(&mut self) -> Vec<C> {
        self.total_bytes = 0;
        std::mem::take(&mut self.chunks)
    }
}

impl<C: ChunkPayload> Default for ChunkBuffer<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_chunks_are_skipped() {
        let mut buffer = ChunkBuffer::new();
        assert_eq!(buffer.push(vec![1u8; 10]), Some(ChunkId(0)));
        assert_eq!(buffer.push(Vec::new()), None);
        assert_eq!(buffer.push(vec![2u8; 20]), Some(ChunkId(1)));

        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.total_bytes(), 30);
    }

    #[test]
    fn test_drain_keeps_delivery_order() {
        let mut buffer = ChunkBuffer::new();
        buffer.push(vec![1u8]);
        buffer.push(vec![2u8, 2]);
        buffer.push(vec![3u8, 3, 3]);

        let chunks = buffer.drain();
        assert_eq!(chunks, vec![vec![1], vec![2, 2], vec![3, 3, 3]]);
        assert!(buffer.is_empty());
        assert_eq!(buffer.total_bytes(), 0);
    }
}
