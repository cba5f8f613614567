pub mod artifact;
pub mod chunk;
pub mod config;
pub mod controller;
pub mod entry;
pub mod error;
pub mod format;
pub mod session;
pub mod store;

pub use artifact::{BytesArtifact, Locator, MediaBackend, RecordingArtifact};
pub use chunk::{ChunkBuffer, ChunkId, ChunkPayload};
pub use config::{CursorMode, ElementIds, RecorderConfig};
pub use controller::{Capability, RecordedItem, RecorderView, RecordingController};
pub use entry::{recording_filename, RecordingEntry};
pub use error::{RecorderError, RecorderResult, StoreError};
pub use format::RecordingFormat;
pub use session::{CaptureStream, ChunkRecorder, Session, SessionId, SessionState};
pub use store::{EntryLog, KeyValueStore, MemoryStore};
