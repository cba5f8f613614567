//! Browser media plumbing: display capture, MediaRecorder, Blob assembly and
//! object URLs.

use std::rc::Rc;

use chrono::{DateTime, Utc};
use js_sys::{Array, Object, Reflect};
use screen_recorder_common::{
    Capability, CaptureStream, ChunkPayload, ChunkRecorder, Locator, MediaBackend,
    RecorderConfig, RecorderError, RecorderResult, RecordingArtifact, RecordingFormat,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Blob, BlobEvent, BlobPropertyBag, DisplayMediaStreamConstraints, Event, MediaRecorder,
    MediaRecorderOptions, MediaStream, MediaStreamTrack, RecordingState, Url, Window,
};

/// Best-effort message out of a thrown JS value
pub fn js_error(value: JsValue) -> String {
    if let Some(message) = value.as_string() {
        return message;
    }
    Reflect::get(&value, &JsValue::from_str("message"))
        .ok()
        .and_then(|message| message.as_string())
        .unwrap_or_else(|| format!("{:?}", value))
}

fn has_function(target: &JsValue, name: &str) -> bool {
    Reflect::get(target, &JsValue::from_str(name))
        .map(|value| value.is_function())
        .unwrap_or(false)
}

/// Check for `navigator.mediaDevices.getDisplayMedia` and `MediaRecorder`
pub fn detect_capability(window: &Window) -> Capability {
    let devices = Reflect::get(&window.navigator(), &JsValue::from_str("mediaDevices"))
        .unwrap_or(JsValue::UNDEFINED);

    Capability {
        display_capture: devices.is_object() && has_function(&devices, "getDisplayMedia"),
        media_recorder: has_function(window, "MediaRecorder"),
    }
}

/// Ask the user to pick a screen, window or tab to capture
pub async fn acquire_display_media(
    window: &Window,
    config: &RecorderConfig,
) -> Result<MediaStream, String> {
    let devices = window.navigator().media_devices().map_err(js_error)?;

    let video = Object::new();
    Reflect::set(
        &video,
        &JsValue::from_str("cursor"),
        &JsValue::from_str(config.cursor.as_str()),
    )
    .map_err(js_error)?;

    let constraints = DisplayMediaStreamConstraints::new();
    constraints.set_video(&video);
    constraints.set_audio(&JsValue::from_bool(config.capture_audio));

    let promise = devices
        .get_display_media_with_constraints(&constraints)
        .map_err(js_error)?;
    let stream = JsFuture::from(promise).await.map_err(js_error)?;
    stream.dyn_into::<MediaStream>().map_err(js_error)
}

impl CaptureStream for MediaStream {
    fn stop_all_tracks(&self) {
        for track in self.get_tracks().iter() {
            if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
                track.stop();
            }
        }
    }
}

impl ChunkPayload for Blob {
    fn byte_len(&self) -> u64 {
        self.size() as u64
    }
}

/// Rust handlers for one recording's browser events
pub struct SessionHandlers {
    pub on_chunk: Box<dyn FnMut(Blob)>,
    pub on_stop: Box<dyn FnMut()>,
    pub on_source_ended: Box<dyn FnMut()>,
}

/// JS callbacks registered on a recorder and its tracks.
///
/// Shared so the page can keep them alive after the recorder itself is
/// dropped from inside `onstop`.
pub struct RecorderCallbacks {
    _on_data: Closure<dyn FnMut(BlobEvent)>,
    _on_stop: Closure<dyn FnMut(Event)>,
    _on_ended: Closure<dyn FnMut(Event)>,
}

/// MediaRecorder bound to a capture stream
pub struct BrowserRecorder {
    recorder: MediaRecorder,
    callbacks: Rc<RecorderCallbacks>,
}

impl BrowserRecorder {
    pub fn open(
        stream: &MediaStream,
        format: &RecordingFormat,
        handlers: SessionHandlers,
    ) -> RecorderResult<Self> {
        let options = MediaRecorderOptions::new();
        options.set_mime_type(&format.encoding);
        let recorder =
            MediaRecorder::new_with_media_stream_and_media_recorder_options(stream, &options)
                .map_err(|e| RecorderError::Recorder(js_error(e)))?;

        let SessionHandlers {
            mut on_chunk,
            mut on_stop,
            mut on_source_ended,
        } = handlers;

        let on_data = Closure::<dyn FnMut(BlobEvent)>::new(move |event: BlobEvent| {
            if let Some(blob) = event.data() {
                on_chunk(blob);
            }
        });
        let on_stop = Closure::<dyn FnMut(Event)>::new(move |_event: Event| on_stop());
        let on_ended = Closure::<dyn FnMut(Event)>::new(move |_event: Event| on_source_ended());

        recorder.set_ondataavailable(Some(on_data.as_ref().unchecked_ref()));
        recorder.set_onstop(Some(on_stop.as_ref().unchecked_ref()));
        for track in stream.get_video_tracks().iter() {
            if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
                track.set_onended(Some(on_ended.as_ref().unchecked_ref()));
            }
        }

        Ok(Self {
            recorder,
            callbacks: Rc::new(RecorderCallbacks {
                _on_data: on_data,
                _on_stop: on_stop,
                _on_ended: on_ended,
            }),
        })
    }

    pub fn callbacks(&self) -> Rc<RecorderCallbacks> {
        self.callbacks.clone()
    }
}

impl ChunkRecorder for BrowserRecorder {
    fn start(&mut self) -> RecorderResult<()> {
        self.recorder
            .start()
            .map_err(|e| RecorderError::Recorder(js_error(e)))
    }

    fn request_stop(&mut self) -> RecorderResult<()> {
        if self.recorder.state() == RecordingState::Inactive {
            return Err(RecorderError::Recorder("recorder is not active".to_string()));
        }
        self.recorder
            .stop()
            .map_err(|e| RecorderError::Recorder(js_error(e)))
    }
}

/// Finished recording held as a Blob
pub struct BlobArtifact {
    blob: Blob,
    content_type: String,
}

impl BlobArtifact {
    pub fn blob(&self) -> &Blob {
        &self.blob
    }
}

impl RecordingArtifact for BlobArtifact {
    fn size(&self) -> u64 {
        self.blob.size() as u64
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }
}

#[derive(Debug, Default)]
pub struct BrowserBackend;

impl BrowserBackend {
    pub fn new() -> Self {
        Self
    }
}

impl MediaBackend for BrowserBackend {
    type Stream = MediaStream;
    type Recorder = BrowserRecorder;
    type Chunk = Blob;
    type Artifact = BlobArtifact;

    fn assemble(&mut self, chunks: Vec<Blob>, content_type: &str) -> RecorderResult<BlobArtifact> {
        let parts = Array::new();
        for chunk in &chunks {
            parts.push(chunk);
        }

        let options = BlobPropertyBag::new();
        options.set_type(content_type);
        let blob = Blob::new_with_blob_sequence_and_options(&parts, &options)
            .map_err(|e| RecorderError::Platform(js_error(e)))?;

        Ok(BlobArtifact {
            blob,
            content_type: content_type.to_string(),
        })
    }

    fn create_locator(&mut self, artifact: &BlobArtifact) -> RecorderResult<Locator> {
        Url::create_object_url_with_blob(&artifact.blob)
            .map(Locator::new)
            .map_err(|e| RecorderError::Platform(js_error(e)))
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
