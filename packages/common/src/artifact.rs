use chrono::{DateTime, Utc};
use std::fmt;

use crate::chunk::ChunkPayload;
use crate::error::RecorderResult;
use crate::session::{CaptureStream, ChunkRecorder};

/// Page-lifetime reference to an artifact's bytes (an object URL in the browser)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator(String);

impl Locator {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A finished recording
pub trait RecordingArtifact {
    fn size(&self) -> u64;

    fn content_type(&self) -> &str;
}

/// Artifact held as one contiguous byte buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BytesArtifact {
    bytes: Vec<u8>,
    content_type: String,
}

impl BytesArtifact {
    /// Concatenate chunks in the order given
    pub fn from_chunks(chunks: Vec<Vec<u8>>, content_type: &str) -> Self {
        let total = chunks.iter().map(ChunkPayload::byte_len).sum::<u64>() as usize;
        let mut bytes = Vec::with_capacity(total);
        for chunk in chunks {
            bytes.extend_from_slice(&chunk);
        }
        Self {
            bytes,
            content_type: content_type.to_string(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl RecordingArtifact for BytesArtifact {
    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }
}

/// Platform services the controller needs to turn chunks into a playable,
/// downloadable recording
pub trait MediaBackend {
    type Stream: CaptureStream;
    type Recorder: ChunkRecorder;
    type Chunk: ChunkPayload;
    type Artifact: RecordingArtifact;

    fn assemble(
        &mut self,
        chunks: Vec<Self::Chunk>,
        content_type: &str,
    ) -> RecorderResult<Self::Artifact>;

    fn create_locator(&mut self, artifact: &Self::Artifact) -> RecorderResult<Locator>;

    fn now(&self) -> DateTime<Utc>;
}
