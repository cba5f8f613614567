use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

use crate::chunk::{ChunkBuffer, ChunkId, ChunkPayload};
use crate::error::RecorderResult;

/// Unique identifier for a recording session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Recording session state as seen by the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Capture is not available on this page
    Unsupported,

    /// Waiting to start
    Idle,

    /// Waiting for the user to grant screen capture
    Acquiring,

    /// Currently recording
    Recording,

    /// Stopped, waiting for the recorder to flush its last chunk
    Stopping,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Unsupported => write!(f, "unsupported"),
            SessionState::Idle => write!(f, "idle"),
            SessionState::Acquiring => write!(f, "acquiring"),
            SessionState::Recording => write!(f, "recording"),
            SessionState::Stopping => write!(f, "stopping"),
        }
    }
}

/// A live capture source
pub trait CaptureStream {
    /// Stop every track so the platform capture indicator goes away
    fn stop_all_tracks(&self);
}

/// A recorder bound to a capture source, emitting chunks over time
pub trait ChunkRecorder {
    fn start(&mut self) -> RecorderResult<()>;

    /// Ask the recorder to flush and finish. Completion arrives later as the
    /// on-stop callback.
    fn request_stop(&mut self) -> RecorderResult<()>;
}

/// Everything belonging to one recording, from acquisition to finalize
pub struct Session<S, R, C> {
    id: SessionId,
    started_at: DateTime<Utc>,
    stream: S,
    recorder: R,
    chunks: ChunkBuffer<C>,
}

impl<S, R, C> Session<S, R, C>
where
    S: CaptureStream,
    R: ChunkRecorder,
    C: ChunkPayload,
{
    pub fn new(id: SessionId, started_at: DateTime<Utc>, stream: S, recorder: R) -> Self {
        Self {
            id,
            started_at,
            stream,
            recorder,
            chunks: ChunkBuffer::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn chunks(&self) -> &ChunkBuffer<C> {
        &self.chunks
    }

    pub fn push_chunk(&mut self, chunk: C) -> Option<ChunkId> {
        self.chunks.push(chunk)
    }

    pub fn recorder_mut(&mut self) -> &mut R {
        &mut self.recorder
    }

    pub fn release_source(&self) {
        self.stream.stop_all_tracks();
    }

    /// Consume the session, handing back its chunks in delivery order
    pub fn into_chunks(mut self) -> Vec<C> {
        self.chunks.drain()
    }
}
