//! Recording session controller
//!
//! Owns the idle/recording state machine and the current [`Session`], and
//! turns a finished session into an artifact, a list row and a persisted
//! entry. Browser specifics sit behind [`MediaBackend`], [`RecorderView`] and
//! [`KeyValueStore`].
//!
//! Starting is split in two because acquiring the capture source is the one
//! asynchronous step: [`RecordingController::request_start`] reserves the
//! session, then the caller awaits the platform and reports back with
//! [`RecordingController::source_acquired`] or
//! [`RecordingController::source_failed`].

use log::{debug, error, info, warn};

use crate::artifact::{Locator, MediaBackend, RecordingArtifact};
use crate::chunk::ChunkId;
use crate::config::RecorderConfig;
use crate::entry::RecordingEntry;
use crate::error::{RecorderError, RecorderResult};
use crate::format::RecordingFormat;
use crate::session::{CaptureStream, ChunkRecorder, Session, SessionId, SessionState};
use crate::store::{EntryLog, KeyValueStore};

/// Presentation and listing surfaces
pub trait RecorderView {
    fn set_start_enabled(&mut self, enabled: bool);

    /// Swap the start/stop affordances
    fn show_recording(&mut self, recording: bool);

    /// Tell the user something went wrong
    fn notify_error(&mut self, message: &str);

    /// Bind the playback surface to a recording without playing it
    fn present(&mut self, locator: &Locator) -> RecorderResult<()>;

    fn play(&mut self, locator: &Locator) -> RecorderResult<()>;

    /// Add a download link and a play button for a finished recording
    fn append_recording(
        &mut self,
        index: usize,
        entry: &RecordingEntry,
        locator: &Locator,
    ) -> RecorderResult<()>;
}

/// What the page can do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capability {
    pub display_capture: bool,
    pub media_recorder: bool,
}

impl Capability {
    pub fn is_available(&self) -> bool {
        self.display_capture && self.media_recorder
    }
}

/// A recording finished on this page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedItem {
    pub entry: RecordingEntry,
    pub locator: Locator,
    pub size: u64,
}

type BackendSession<B> = Session<
    <B as MediaBackend>::Stream,
    <B as MediaBackend>::Recorder,
    <B as MediaBackend>::Chunk,
>;

enum State<B: MediaBackend> {
    Unsupported,
    Idle,
    Acquiring(SessionId),
    Recording(BackendSession<B>),
    Stopping(BackendSession<B>),
}

impl<B: MediaBackend> State<B> {
    fn kind(&self) -> SessionState {
        match self {
            State::Unsupported => SessionState::Unsupported,
            State::Idle => SessionState::Idle,
            State::Acquiring(_) => SessionState::Acquiring,
            State::Recording(_) => SessionState::Recording,
            State::Stopping(_) => SessionState::Stopping,
        }
    }
}

pub struct RecordingController<B: MediaBackend, V, K> {
    backend: B,
    view: V,
    entries: EntryLog<K>,
    format: RecordingFormat,
    filename_prefix: String,
    state: State<B>,
    recordings: Vec<RecordedItem>,
    persisted: Vec<RecordingEntry>,
}

impl<B, V, K> RecordingController<B, V, K>
where
    B: MediaBackend,
    V: RecorderView,
    K: KeyValueStore,
{
    pub fn new(
        backend: B,
        view: V,
        store: K,
        config: &RecorderConfig,
        format: RecordingFormat,
    ) -> Self {
        Self {
            backend,
            view,
            entries: EntryLog::new(store, config.storage_key.clone()),
            format,
            filename_prefix: config.filename_prefix.clone(),
            state: State::Idle,
            recordings: Vec::new(),
            persisted: Vec::new(),
        }
    }

    /// Disable starting for the rest of the page if capture is missing.
    ///
    /// Returns whether recording is possible.
    pub fn check_capability(&mut self, capability: Capability) -> bool {
        if capability.is_available() {
            self.view.set_start_enabled(true);
            self.view.show_recording(false);
            return true;
        }

        warn!("screen capture unavailable: {:?}", capability);
        self.state = State::Unsupported;
        self.view.set_start_enabled(false);
        self.view
            .notify_error(&RecorderError::CapabilityUnavailable.to_string());
        false
    }

    pub fn state(&self) -> SessionState {
        self.state.kind()
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, State::Recording(_))
    }

    pub fn format(&self) -> &RecordingFormat {
        &self.format
    }

    /// Recordings finished on this page, in order
    pub fn recordings(&self) -> &[RecordedItem] {
        &self.recordings
    }

    /// Entries known to be persisted: those loaded at startup plus those
    /// written since
    pub fn persisted_entries(&self) -> &[RecordingEntry] {
        &self.persisted
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn entry_log(&self) -> &EntryLog<K> {
        &self.entries
    }

    /// Buffered byte count of the session in progress, if any
    pub fn buffered_bytes(&self) -> Option<u64> {
        match &self.state {
            State::Recording(session) | State::Stopping(session) => {
                Some(session.chunks().total_bytes())
            }
            _ => None,
        }
    }

    /// Reserve a new session before acquiring the capture source
    pub fn request_start(&mut self) -> RecorderResult<SessionId> {
        match self.state {
            State::Unsupported => Err(RecorderError::CapabilityUnavailable),
            State::Idle => {
                let id = SessionId::new();
                info!("[{}] requesting screen capture", id);
                self.state = State::Acquiring(id);
                Ok(id)
            }
            _ => {
                warn!("start ignored while {}", self.state.kind());
                Err(RecorderError::SessionActive)
            }
        }
    }

    /// The capture source was granted; start recording it
    pub fn source_acquired(
        &mut self,
        id: SessionId,
        stream: B::Stream,
        mut recorder: B::Recorder,
    ) -> RecorderResult<()> {
        if !matches!(self.state, State::Acquiring(pending) if pending == id) {
            stream.stop_all_tracks();
            return Err(RecorderError::Platform(format!(
                "no pending capture request for session {}",
                id
            )));
        }

        if let Err(err) = recorder.start() {
            stream.stop_all_tracks();
            self.state = State::Idle;
            return Err(self.report(err));
        }

        let session = Session::new(id, self.backend.now(), stream, recorder);
        self.state = State::Recording(session);
        self.view.show_recording(true);
        info!("[{}] recording started ({})", id, self.format.encoding);
        Ok(())
    }

    /// The capture source was denied or failed; go back to idle
    pub fn source_failed(&mut self, id: SessionId, reason: &str) {
        if !matches!(self.state, State::Acquiring(pending) if pending == id) {
            warn!("[{}] ignoring acquisition failure: {}", id, reason);
            return;
        }

        self.state = State::Idle;
        self.report(RecorderError::SourceAcquisitionFailed(reason.to_string()));
    }

    /// Buffer one chunk from the recorder of session `id`.
    ///
    /// Empty chunks and chunks for any other session are dropped.
    pub fn push_chunk(&mut self, id: SessionId, chunk: B::Chunk) -> Option<ChunkId> {
        match &mut self.state {
            State::Recording(session) | State::Stopping(session) if session.id() == id => {
                let pushed = session.push_chunk(chunk);
                match pushed {
                    Some(chunk_id) => debug!(
                        "[{}] chunk {} buffered ({} bytes total)",
                        id,
                        chunk_id,
                        session.chunks().total_bytes()
                    ),
                    None => debug!("[{}] empty chunk skipped", id),
                }
                pushed
            }
            _ => {
                debug!("[{}] dropping chunk for inactive session", id);
                None
            }
        }
    }

    /// Stop the active recording. A no-op returning `false` when nothing is
    /// recording.
    pub fn stop(&mut self) -> bool {
        let mut session = match std::mem::replace(&mut self.state, State::Idle) {
            State::Recording(session) => session,
            other => {
                debug!("stop ignored while {}", other.kind());
                self.state = other;
                return false;
            }
        };

        let id = session.id();
        match session.recorder_mut().request_stop() {
            Ok(()) => info!("[{}] recording stopped, waiting for final chunk", id),
            // An inactive recorder still has its last chunk and stop event queued.
            Err(err) => warn!("[{}] recorder already stopping ({}), waiting for it", id, err),
        }
        session.release_source();
        self.view.show_recording(false);
        self.view.set_start_enabled(false);
        self.state = State::Stopping(session);
        true
    }

    /// The capture source ended without the user pressing stop
    pub fn source_ended(&mut self, id: SessionId) -> bool {
        match &self.state {
            State::Recording(session) if session.id() == id => {
                info!("[{}] capture source ended", id);
                self.stop()
            }
            _ => false,
        }
    }

    /// The recorder of session `id` has flushed and stopped.
    ///
    /// Returns `Ok(None)` if that session is not the one being recorded.
    pub fn finalize(&mut self, id: SessionId) -> RecorderResult<Option<RecordedItem>> {
        let session = match std::mem::replace(&mut self.state, State::Idle) {
            State::Stopping(session) if session.id() == id => session,
            State::Recording(session) if session.id() == id => {
                warn!("[{}] recorder stopped on its own", id);
                session.release_source();
                self.view.show_recording(false);
                session
            }
            other => {
                debug!("[{}] ignoring stop event while {}", id, other.kind());
                self.state = other;
                return Ok(None);
            }
        };

        self.finish(session).map(Some)
    }

    fn finish(&mut self, session: BackendSession<B>) -> RecorderResult<RecordedItem> {
        let id = session.id();
        let started_at = session.started_at();
        let chunk_count = session.chunks().len();
        let chunks = session.into_chunks();
        self.view.set_start_enabled(true);

        let artifact = match self.backend.assemble(chunks, &self.format.container) {
            Ok(artifact) => artifact,
            Err(err) => return Err(self.report(err)),
        };
        let locator = match self.backend.create_locator(&artifact) {
            Ok(locator) => locator,
            Err(err) => return Err(self.report(err)),
        };

        if let Err(err) = self.view.present(&locator) {
            warn!("[{}] could not show recording: {}", id, err);
        }

        let entry = RecordingEntry::new(
            &self.filename_prefix,
            self.backend.now(),
            &self.format.extension,
        );
        let index = self.recordings.len();
        if let Err(err) = self.view.append_recording(index, &entry, &locator) {
            warn!("[{}] could not list recording: {}", id, err);
        }

        match self.entries.append(&entry) {
            Ok(total) => {
                debug!("[{}] persisted entry {} of {}", id, entry.filename, total);
                self.persisted.push(entry.clone());
            }
            Err(err) => warn!("[{}] could not persist {}: {}", id, entry.filename, err),
        }

        let item = RecordedItem {
            entry,
            locator,
            size: artifact.size(),
        };
        info!(
            "[{}] saved {} ({} bytes, {} chunks, started {})",
            id, item.entry.filename, item.size, chunk_count, started_at
        );
        self.recordings.push(item.clone());
        Ok(item)
    }

    /// Play a recording finished on this page
    pub fn play(&mut self, index: usize) -> RecorderResult<()> {
        let locator = self
            .recordings
            .get(index)
            .map(|item| item.locator.clone())
            .ok_or(RecorderError::UnknownRecording(index))?;
        self.view.play(&locator)
    }

    /// Read the persisted list at page load. Only metadata comes back; the
    /// recordings themselves were never stored.
    pub fn load_persisted_entries(&mut self) -> RecorderResult<&[RecordingEntry]> {
        match self.entries.load() {
            Ok(entries) => {
                info!(
                    "{} persisted recording entries under {:?}",
                    entries.len(),
                    self.entries.key()
                );
                self.persisted = entries;
                Ok(self.persisted.as_slice())
            }
            Err(err) => {
                warn!("could not read persisted recordings: {}", err);
                Err(err.into())
            }
        }
    }

    fn report(&mut self, err: RecorderError) -> RecorderError {
        error!("{}", err);
        self.view.notify_error(&err.to_string());
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::BytesArtifact;
    use crate::store::{MemoryStore, DEFAULT_STORAGE_KEY};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Counters {
        tracks_stopped: Rc<Cell<u32>>,
        recorder_started: Rc<Cell<u32>>,
        stop_requests: Rc<Cell<u32>>,
    }

    struct FakeStream(Counters);

    impl CaptureStream for FakeStream {
        fn stop_all_tracks(&self) {
            self.0.tracks_stopped.set(self.0.tracks_stopped.get() + 1);
        }
    }

    struct FakeRecorder {
        counters: Counters,
        fail_start: bool,
        fail_stop: bool,
    }

    impl ChunkRecorder for FakeRecorder {
        fn start(&mut self) -> RecorderResult<()> {
            if self.fail_start {
                return Err(RecorderError::Recorder("NotSupportedError".to_string()));
            }
            self.counters
                .recorder_started
                .set(self.counters.recorder_started.get() + 1);
            Ok(())
        }

        fn request_stop(&mut self) -> RecorderResult<()> {
            if self.fail_stop {
                return Err(RecorderError::Recorder("InvalidStateError".to_string()));
            }
            self.counters.stop_requests.set(self.counters.stop_requests.get() + 1);
            Ok(())
        }
    }

    struct FakeBackend {
        clock: Cell<DateTime<Utc>>,
        fail_assemble: bool,
        locators: usize,
        assembled: Vec<BytesArtifact>,
    }

    impl FakeBackend {
        fn new() -> Self {
            Self {
                clock: Cell::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()),
                fail_assemble: false,
                locators: 0,
                assembled: Vec::new(),
            }
        }
    }

    impl MediaBackend for FakeBackend {
        type Stream = FakeStream;
        type Recorder = FakeRecorder;
        type Chunk = Vec<u8>;
        type Artifact = BytesArtifact;

        fn assemble(
            &mut self,
            chunks: Vec<Vec<u8>>,
            content_type: &str,
        ) -> RecorderResult<BytesArtifact> {
            if self.fail_assemble {
                return Err(RecorderError::Platform("blob construction failed".to_string()));
            }
            let artifact = BytesArtifact::from_chunks(chunks, content_type);
            self.assembled.push(artifact.clone());
            Ok(artifact)
        }

        fn create_locator(&mut self, _artifact: &BytesArtifact) -> RecorderResult<Locator> {
            self.locators += 1;
            Ok(Locator::new(format!("blob:test/{}", self.locators)))
        }

        fn now(&self) -> DateTime<Utc> {
            let now = self.clock.get();
            self.clock.set(now + Duration::milliseconds(1_500));
            now
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum ViewEvent {
        StartEnabled(bool),
        Recording(bool),
        Error(String),
        Present(String),
        Play(String),
        Row(usize, String, String),
    }

    #[derive(Default)]
    struct FakeView {
        events: Vec<ViewEvent>,
    }

    impl FakeView {
        fn errors(&self) -> Vec<&str> {
            self.events
                .iter()
                .filter_map(|event| match event {
                    ViewEvent::Error(message) => Some(message.as_str()),
                    _ => None,
                })
                .collect()
        }
    }

    impl RecorderView for FakeView {
        fn set_start_enabled(&mut self, enabled: bool) {
            self.events.push(ViewEvent::StartEnabled(enabled));
        }

        fn show_recording(&mut self, recording: bool) {
            self.events.push(ViewEvent::Recording(recording));
        }

        fn notify_error(&mut self, message: &str) {
            self.events.push(ViewEvent::Error(message.to_string()));
        }

        fn present(&mut self, locator: &Locator) -> RecorderResult<()> {
            self.events.push(ViewEvent::Present(locator.to_string()));
            Ok(())
        }

        fn play(&mut self, locator: &Locator) -> RecorderResult<()> {
            self.events.push(ViewEvent::Play(locator.to_string()));
            Ok(())
        }

        fn append_recording(
            &mut self,
            index: usize,
            entry: &RecordingEntry,
            locator: &Locator,
        ) -> RecorderResult<()> {
            self.events.push(ViewEvent::Row(
                index,
                entry.filename.clone(),
                locator.to_string(),
            ));
            Ok(())
        }
    }

    type TestController = RecordingController<FakeBackend, FakeView, MemoryStore>;

    fn controller_with(store: MemoryStore) -> TestController {
        RecordingController::new(
            FakeBackend::new(),
            FakeView::default(),
            store,
            &RecorderConfig::default(),
            RecordingFormat::default(),
        )
    }

    fn controller() -> TestController {
        controller_with(MemoryStore::new())
    }

    fn recorder(counters: &Counters) -> FakeRecorder {
        FakeRecorder {
            counters: counters.clone(),
            fail_start: false,
            fail_stop: false,
        }
    }

    fn start(controller: &mut TestController, counters: &Counters) -> SessionId {
        let id = controller.request_start().unwrap();
        controller
            .source_acquired(id, FakeStream(counters.clone()), recorder(counters))
            .unwrap();
        id
    }

    fn record_cycle(controller: &mut TestController, chunks: &[usize]) -> RecordedItem {
        let counters = Counters::default();
        let id = start(controller, &counters);
        for &size in chunks {
            controller.push_chunk(id, vec![7u8; size]);
        }
        assert!(controller.stop());
        controller.finalize(id).unwrap().unwrap()
    }

    fn stored_entries(controller: &TestController) -> Vec<RecordingEntry> {
        controller.entry_log().load().unwrap()
    }

    #[test]
    fn test_chunks_become_one_artifact() {
        let mut controller = controller();
        let counters = Counters::default();
        let id = start(&mut controller, &counters);
        assert_eq!(controller.state(), SessionState::Recording);

        assert_eq!(controller.push_chunk(id, vec![1u8; 10]), Some(ChunkId(0)));
        assert_eq!(controller.push_chunk(id, Vec::new()), None);
        assert!(controller.stop());
        assert_eq!(controller.state(), SessionState::Stopping);

        // the recorder flushes its last chunk after stop
        assert_eq!(controller.push_chunk(id, vec![2u8; 20]), Some(ChunkId(1)));
        assert_eq!(controller.buffered_bytes(), Some(30));

        let item = controller.finalize(id).unwrap().unwrap();
        assert_eq!(item.size, 30);
        assert_eq!(controller.state(), SessionState::Idle);
        assert_eq!(controller.buffered_bytes(), None);

        let artifact = &controller.backend().assembled[0];
        assert_eq!(artifact.bytes()[..10], [1u8; 10]);
        assert_eq!(artifact.bytes()[10..], [2u8; 20]);
        assert_eq!(artifact.content_type(), "video/webm");

        assert_eq!(counters.recorder_started.get(), 1);
        assert_eq!(counters.stop_requests.get(), 1);
        assert_eq!(counters.tracks_stopped.get(), 1);

        assert_eq!(stored_entries(&controller), vec![item.entry.clone()]);
        assert!(item.entry.filename.starts_with("screen-recording-"));
        assert!(item.entry.filename.ends_with(".webm"));
    }

    #[test]
    fn test_finalize_updates_view() {
        let mut controller = controller();
        let item = record_cycle(&mut controller, &[5]);

        assert_eq!(
            controller.view().events,
            vec![
                ViewEvent::Recording(true),
                ViewEvent::Recording(false),
                ViewEvent::StartEnabled(false),
                ViewEvent::StartEnabled(true),
                ViewEvent::Present("blob:test/1".to_string()),
                ViewEvent::Row(0, item.entry.filename.clone(), "blob:test/1".to_string()),
            ]
        );
    }

    #[test]
    fn test_stop_without_session_is_noop() {
        let mut controller = controller();
        assert!(!controller.stop());
        assert!(!controller.stop());
        assert_eq!(controller.state(), SessionState::Idle);
        assert!(controller.view().events.is_empty());
        assert!(stored_entries(&controller).is_empty());
    }

    #[test]
    fn test_capability_unavailable_disables_start() {
        let mut controller = controller();
        let available = controller.check_capability(Capability {
            display_capture: false,
            media_recorder: true,
        });

        assert!(!available);
        assert_eq!(controller.state(), SessionState::Unsupported);
        assert_eq!(controller.view().events[0], ViewEvent::StartEnabled(false));
        assert_eq!(controller.view().errors().len(), 1);
        assert!(matches!(
            controller.request_start(),
            Err(RecorderError::CapabilityUnavailable)
        ));
        assert_eq!(controller.state(), SessionState::Unsupported);
    }

    #[test]
    fn test_capability_available_enables_start() {
        let mut controller = controller();
        assert!(controller.check_capability(Capability {
            display_capture: true,
            media_recorder: true,
        }));
        assert_eq!(
            controller.view().events,
            vec![ViewEvent::StartEnabled(true), ViewEvent::Recording(false)]
        );
        assert_eq!(controller.state(), SessionState::Idle);
    }

    #[test]
    fn test_denied_acquisition_returns_to_idle() {
        let mut controller = controller();
        let id = controller.request_start().unwrap();
        assert_eq!(controller.state(), SessionState::Acquiring);

        controller.source_failed(id, "Permission denied");

        assert_eq!(controller.state(), SessionState::Idle);
        assert_eq!(
            controller.view().errors(),
            vec!["Error starting screen capture: Permission denied"]
        );
        assert!(!controller
            .view()
            .events
            .contains(&ViewEvent::Recording(true)));
        assert!(stored_entries(&controller).is_empty());
        assert!(!controller.stop());

        // the page can try again
        assert!(controller.request_start().is_ok());
    }

    #[test]
    fn test_recorder_start_failure_releases_source() {
        let mut controller = controller();
        let counters = Counters::default();
        let id = controller.request_start().unwrap();
        let failing = FakeRecorder {
            counters: counters.clone(),
            fail_start: true,
            fail_stop: false,
        };

        let result = controller.source_acquired(id, FakeStream(counters.clone()), failing);

        assert!(matches!(result, Err(RecorderError::Recorder(_))));
        assert_eq!(counters.tracks_stopped.get(), 1);
        assert_eq!(controller.state(), SessionState::Idle);
        assert_eq!(controller.view().errors().len(), 1);
    }

    #[test]
    fn test_second_start_is_rejected() {
        let mut controller = controller();
        let counters = Counters::default();

        let id = controller.request_start().unwrap();
        assert!(matches!(
            controller.request_start(),
            Err(RecorderError::SessionActive)
        ));

        controller
            .source_acquired(id, FakeStream(counters.clone()), recorder(&counters))
            .unwrap();
        assert!(matches!(
            controller.request_start(),
            Err(RecorderError::SessionActive)
        ));

        controller.stop();
        assert!(matches!(
            controller.request_start(),
            Err(RecorderError::SessionActive)
        ));

        controller.finalize(id).unwrap();
        assert!(controller.request_start().is_ok());
    }

    #[test]
    fn test_two_cycles_persist_in_order() {
        let mut controller = controller();
        let first = record_cycle(&mut controller, &[3, 4]);
        let second = record_cycle(&mut controller, &[8]);

        assert_ne!(first.entry.filename, second.entry.filename);
        assert_ne!(first.locator, second.locator);
        assert_eq!(stored_entries(&controller), vec![first.entry, second.entry]);
        assert_eq!(controller.recordings().len(), 2);
        assert_eq!(controller.persisted_entries().len(), 2);
    }

    #[test]
    fn test_external_source_end_finalizes() {
        let mut controller = controller();
        let counters = Counters::default();
        let id = start(&mut controller, &counters);
        controller.push_chunk(id, vec![1u8; 12]);

        assert!(controller.source_ended(id));
        assert_eq!(controller.state(), SessionState::Stopping);
        assert_eq!(counters.stop_requests.get(), 1);
        assert!(!controller.source_ended(id));

        let item = controller.finalize(id).unwrap().unwrap();
        assert_eq!(item.size, 12);
        assert_eq!(stored_entries(&controller).len(), 1);
    }

    #[test]
    fn test_recorder_stopping_on_its_own_finalizes() {
        let mut controller = controller();
        let counters = Counters::default();
        let id = start(&mut controller, &counters);
        controller.push_chunk(id, vec![1u8; 4]);

        let item = controller.finalize(id).unwrap().unwrap();

        assert_eq!(item.size, 4);
        assert_eq!(counters.tracks_stopped.get(), 1);
        assert_eq!(controller.state(), SessionState::Idle);
        assert!(controller
            .view()
            .events
            .contains(&ViewEvent::Recording(false)));
    }

    #[test]
    fn test_inactive_recorder_waits_for_its_stop_event() {
        let mut controller = controller();
        let counters = Counters::default();
        let id = controller.request_start().unwrap();
        let stubborn = FakeRecorder {
            counters: counters.clone(),
            fail_start: false,
            fail_stop: true,
        };
        controller
            .source_acquired(id, FakeStream(counters.clone()), stubborn)
            .unwrap();
        controller.push_chunk(id, vec![1u8; 6]);

        assert!(controller.source_ended(id));
        assert_eq!(controller.state(), SessionState::Stopping);
        assert_eq!(counters.tracks_stopped.get(), 1);
        assert!(controller.recordings().is_empty());

        // the recorder's final flush holds everything since start
        assert_eq!(controller.push_chunk(id, vec![5u8; 30]), Some(ChunkId(1)));
        let item = controller.finalize(id).unwrap().unwrap();

        assert_eq!(item.size, 36);
        assert_eq!(controller.state(), SessionState::Idle);
        assert_eq!(stored_entries(&controller).len(), 1);
    }

    #[test]
    fn test_start_disabled_until_finalized() {
        let mut controller = controller();
        let counters = Counters::default();
        let id = start(&mut controller, &counters);
        controller.stop();

        assert_eq!(
            controller.view().events.last(),
            Some(&ViewEvent::StartEnabled(false))
        );
        assert!(matches!(
            controller.request_start(),
            Err(RecorderError::SessionActive)
        ));

        controller.finalize(id).unwrap();
        assert!(controller
            .view()
            .events
            .contains(&ViewEvent::StartEnabled(true)));
        assert!(controller.request_start().is_ok());
    }

    #[test]
    fn test_artifact_size_is_sum_of_chunks() {
        let mut sequences: Vec<Vec<usize>> = vec![Vec::new(), vec![0], vec![0, 0, 0]];
        let mut seed: usize = 7;
        for len in 1..40 {
            let sizes = (0..len)
                .map(|_| {
                    seed = (seed * 1_103_515_245 + 12_345) % 2_147_483_648;
                    // roughly a third of the chunks are empty
                    match seed % 3 {
                        0 => 0,
                        _ => seed % 257,
                    }
                })
                .collect();
            sequences.push(sizes);
        }

        let mut controller = controller();
        for sizes in &sequences {
            let item = record_cycle(&mut controller, sizes);
            assert_eq!(item.size, sizes.iter().sum::<usize>() as u64, "{:?}", sizes);
        }

        let artifacts = &controller.backend().assembled;
        assert_eq!(artifacts.len(), sequences.len());
        assert!(artifacts
            .iter()
            .zip(&sequences)
            .all(|(artifact, sizes)| artifact.bytes().len() == sizes.iter().sum::<usize>()));
        assert_eq!(stored_entries(&controller).len(), sequences.len());
    }

    #[test]
    fn test_stale_session_events_are_ignored() {
        let mut controller = controller();
        let old = record_cycle(&mut controller, &[1]);
        assert_eq!(old.size, 1);

        let counters = Counters::default();
        let stale = SessionId::new();
        let id = start(&mut controller, &counters);

        assert_eq!(controller.push_chunk(stale, vec![9u8; 100]), None);
        assert_eq!(controller.finalize(stale).unwrap(), None);
        assert!(!controller.source_ended(stale));
        assert_eq!(controller.state(), SessionState::Recording);

        controller.push_chunk(id, vec![1u8; 2]);
        controller.stop();
        assert_eq!(controller.finalize(id).unwrap().unwrap().size, 2);
    }

    #[test]
    fn test_store_failure_keeps_recording() {
        let mut controller = controller_with(MemoryStore::with_capacity(10));
        let item = record_cycle(&mut controller, &[16]);

        assert_eq!(item.size, 16);
        assert_eq!(controller.recordings().len(), 1);
        assert!(controller.persisted_entries().is_empty());
        assert!(stored_entries(&controller).is_empty());
        assert!(controller.view().errors().is_empty());
        assert!(controller.play(0).is_ok());
    }

    #[test]
    fn test_assembly_failure_is_reported() {
        let mut controller = controller();
        controller.backend.fail_assemble = true;
        let counters = Counters::default();
        let id = start(&mut controller, &counters);
        controller.push_chunk(id, vec![1u8; 8]);
        controller.stop();

        assert!(matches!(
            controller.finalize(id),
            Err(RecorderError::Platform(_))
        ));
        assert_eq!(controller.state(), SessionState::Idle);
        assert_eq!(controller.view().errors().len(), 1);
        assert!(controller.recordings().is_empty());
        assert!(stored_entries(&controller).is_empty());
    }

    #[test]
    fn test_play_rebinds_playback() {
        let mut controller = controller();
        record_cycle(&mut controller, &[1]);
        record_cycle(&mut controller, &[2]);

        controller.play(0).unwrap();
        assert_eq!(
            controller.view().events.last(),
            Some(&ViewEvent::Play("blob:test/1".to_string()))
        );
        assert!(matches!(
            controller.play(2),
            Err(RecorderError::UnknownRecording(2))
        ));
    }

    #[test]
    fn test_load_persisted_entries() {
        let mut store = MemoryStore::new();
        store
            .set_item(
                DEFAULT_STORAGE_KEY,
                r#"[{"filename":"screen-recording-old.webm","timestamp":"2023-01-01T00:00:00.000Z"}]"#,
            )
            .unwrap();
        let mut controller = controller_with(store);

        let loaded = controller.load_persisted_entries().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].filename, "screen-recording-old.webm");

        // metadata only: nothing becomes playable
        assert!(controller.recordings().is_empty());
        assert!(controller.play(0).is_err());

        record_cycle(&mut controller, &[1]);
        assert_eq!(controller.persisted_entries().len(), 2);
        assert_eq!(stored_entries(&controller).len(), 2);
    }

    #[test]
    fn test_load_corrupt_entries() {
        let mut store = MemoryStore::new();
        store.set_item(DEFAULT_STORAGE_KEY, "{oops").unwrap();
        let mut controller = controller_with(store);

        assert!(matches!(
            controller.load_persisted_entries(),
            Err(RecorderError::Store(_))
        ));
        assert!(controller.persisted_entries().is_empty());
    }
}
