use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::{debug, info, warn};
use screen_recorder_common::{
    CaptureStream, RecorderConfig, RecorderError, RecorderResult, RecordingController,
    RecordingFormat, SessionId,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, MediaRecorder, Window};

use crate::backend::{
    acquire_display_media, detect_capability, js_error, BrowserBackend, BrowserRecorder,
    RecorderCallbacks, SessionHandlers,
};
use crate::console_log;
use crate::dom::DomView;
use crate::storage::LocalStorage;

type Controller = RecordingController<BrowserBackend, DomView, LocalStorage>;

struct Inner {
    controller: RefCell<Controller>,
    config: RecorderConfig,
    window: Window,
    // Callbacks of the latest recorder; replaced when the next one opens.
    callbacks: RefCell<Option<Rc<RecorderCallbacks>>>,
    listeners: RefCell<Vec<Closure<dyn FnMut(Event)>>>,
}

fn session_handlers(inner: Weak<Inner>, id: SessionId) -> SessionHandlers {
    let on_chunk = inner.clone();
    let on_stop = inner.clone();
    let on_source_ended = inner;

    SessionHandlers {
        on_chunk: Box::new(move |blob| {
            if let Some(inner) = on_chunk.upgrade() {
                inner.controller.borrow_mut().push_chunk(id, blob);
            }
        }),
        on_stop: Box::new(move || {
            if let Some(inner) = on_stop.upgrade() {
                if let Err(err) = inner.controller.borrow_mut().finalize(id) {
                    debug!("[{}] finalize failed: {}", id, err);
                }
            }
        }),
        on_source_ended: Box::new(move || {
            if let Some(inner) = on_source_ended.upgrade() {
                inner.controller.borrow_mut().source_ended(id);
            }
        }),
    }
}

async fn start_recording(inner: Rc<Inner>) -> RecorderResult<()> {
    let id = inner.controller.borrow_mut().request_start()?;

    let stream = match acquire_display_media(&inner.window, &inner.config).await {
        Ok(stream) => stream,
        Err(reason) => {
            inner.controller.borrow_mut().source_failed(id, &reason);
            return Err(RecorderError::SourceAcquisitionFailed(reason));
        }
    };

    let format = inner.controller.borrow().format().clone();
    let handlers = session_handlers(Rc::downgrade(&inner), id);
    let recorder = match BrowserRecorder::open(&stream, &format, handlers) {
        Ok(recorder) => recorder,
        Err(err) => {
            stream.stop_all_tracks();
            inner.controller.borrow_mut().source_failed(id, &err.to_string());
            return Err(err);
        }
    };

    inner.callbacks.replace(Some(recorder.callbacks()));
    inner
        .controller
        .borrow_mut()
        .source_acquired(id, stream, recorder)
}

fn wire_buttons(inner: &Rc<Inner>) -> RecorderResult<()> {
    let (record_button, stop_button) = {
        let controller = inner.controller.borrow();
        (
            controller.view().record_button().clone(),
            controller.view().stop_button().clone(),
        )
    };

    let weak = Rc::downgrade(inner);
    let on_record = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
        if let Some(inner) = weak.upgrade() {
            wasm_bindgen_futures::spawn_local(async move {
                if let Err(err) = start_recording(inner).await {
                    debug!("start did not complete: {}", err);
                }
            });
        }
    });

    let weak = Rc::downgrade(inner);
    let on_stop = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
        if let Some(inner) = weak.upgrade() {
            inner.controller.borrow_mut().stop();
        }
    });

    record_button
        .add_event_listener_with_callback("click", on_record.as_ref().unchecked_ref())
        .map_err(|e| RecorderError::Platform(js_error(e)))?;
    stop_button
        .add_event_listener_with_callback("click", on_stop.as_ref().unchecked_ref())
        .map_err(|e| RecorderError::Platform(js_error(e)))?;

    inner.listeners.borrow_mut().extend([on_record, on_stop]);
    Ok(())
}

/// Screen recorder bound to the page's buttons, player and list
#[wasm_bindgen]
pub struct ScreenRecorder {
    inner: Rc<Inner>,
}

#[wasm_bindgen]
impl ScreenRecorder {
    /// Attach to the page. `config` is an optional JSON object overriding
    /// the defaults (element ids, storage key, MIME types, log level).
    #[wasm_bindgen]
    pub fn mount(config: Option<String>) -> Result<ScreenRecorder, String> {
        let config = match config {
            Some(raw) => RecorderConfig::from_json(&raw).map_err(|e| e.to_string())?,
            None => RecorderConfig::default(),
        };
        console_log::init(config.log_level());

        let window = web_sys::window().ok_or_else(|| "no window".to_string())?;
        let view = DomView::new(window.clone(), &config.elements).map_err(|e| e.to_string())?;
        let store = LocalStorage::from_window(&window).map_err(|e| e.to_string())?;

        let capability = detect_capability(&window);
        let format = if capability.media_recorder {
            RecordingFormat::negotiate(&config.mime_candidates, |mime| {
                MediaRecorder::is_type_supported(mime)
            })
        } else {
            RecordingFormat::default()
        };
        info!("recording as {} into {}", format.encoding, format.container);

        let inner = Rc::new_cyclic(|weak: &Weak<Inner>| {
            let weak = weak.clone();
            let view = view.with_play_handler(Rc::new(move |index| {
                if let Some(inner) = weak.upgrade() {
                    if let Err(err) = inner.controller.borrow_mut().play(index) {
                        warn!("could not play recording {}: {}", index, err);
                    }
                }
            }));

            Inner {
                controller: RefCell::new(RecordingController::new(
                    BrowserBackend::new(),
                    view,
                    store,
                    &config,
                    format,
                )),
                config,
                window,
                callbacks: RefCell::new(None),
                listeners: RefCell::new(Vec::new()),
            }
        });

        let available = inner.controller.borrow_mut().check_capability(capability);
        if available {
            wire_buttons(&inner).map_err(|e| e.to_string())?;
            if let Err(err) = inner.controller.borrow_mut().load_persisted_entries() {
                debug!("persisted recordings not loaded: {}", err);
            }
        }

        Ok(ScreenRecorder { inner })
    }

    /// Start recording; resolves once capture is granted and the recorder runs
    #[wasm_bindgen]
    pub fn start(&self) -> js_sys::Promise {
        let inner = self.inner.clone();
        wasm_bindgen_futures::future_to_promise(async move {
            start_recording(inner)
                .await
                .map(|()| JsValue::UNDEFINED)
                .map_err(|e| JsValue::from_str(&e.to_string()))
        })
    }

    /// Stop recording. Returns false if nothing was recording.
    #[wasm_bindgen]
    pub fn stop(&self) -> bool {
        self.inner.controller.borrow_mut().stop()
    }

    #[wasm_bindgen]
    pub fn play(&self, index: usize) -> Result<(), String> {
        self.inner
            .controller
            .borrow_mut()
            .play(index)
            .map_err(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = isRecording)]
    pub fn is_recording(&self) -> bool {
        self.inner.controller.borrow().is_recording()
    }

    #[wasm_bindgen(getter)]
    pub fn state(&self) -> String {
        self.inner.controller.borrow().state().to_string()
    }

    /// Recordings made on this page
    #[wasm_bindgen(js_name = recordingCount)]
    pub fn recording_count(&self) -> usize {
        self.inner.controller.borrow().recordings().len()
    }

    /// Persisted `{filename, timestamp}` entries as a JSON array
    #[wasm_bindgen(js_name = persistedEntries)]
    pub fn persisted_entries(&self) -> Result<String, String> {
        serde_json::to_string(self.inner.controller.borrow().persisted_entries())
            .map_err(|e| e.to_string())
    }
}
