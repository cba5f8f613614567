//! Page elements: start/stop buttons, the video player and the recordings list

use std::rc::Rc;

use log::warn;
use screen_recorder_common::{
    ElementIds, Locator, RecorderError, RecorderResult, RecorderView, RecordingEntry,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Document, Element, Event, HtmlAnchorElement, HtmlButtonElement, HtmlElement,
    HtmlVideoElement, Window,
};

use crate::backend::js_error;

/// Called with the list index when a Play button is clicked
pub type PlayHandler = Rc<dyn Fn(usize)>;

fn platform_error(value: JsValue) -> RecorderError {
    RecorderError::Platform(js_error(value))
}

fn element_by_id<T: JsCast>(document: &Document, id: &str) -> RecorderResult<T> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| RecorderError::Platform(format!("missing element #{}", id)))?
        .dyn_into::<T>()
        .map_err(|_| RecorderError::Platform(format!("element #{} has the wrong type", id)))
}

fn create<T: JsCast>(document: &Document, tag: &str) -> RecorderResult<T> {
    document
        .create_element(tag)
        .map_err(platform_error)?
        .dyn_into::<T>()
        .map_err(|_| RecorderError::Platform(format!("<{}> has the wrong type", tag)))
}

fn set_display(element: &HtmlElement, value: &str) {
    if let Err(err) = element.style().set_property("display", value) {
        warn!("could not set display: {}", js_error(err));
    }
}

pub struct DomView {
    window: Window,
    document: Document,
    record_button: HtmlButtonElement,
    stop_button: HtmlButtonElement,
    video: HtmlVideoElement,
    list: Element,
    on_play: Option<PlayHandler>,
    play_listeners: Vec<Closure<dyn FnMut(Event)>>,
}

impl DomView {
    pub fn new(window: Window, ids: &ElementIds) -> RecorderResult<Self> {
        let document = window
            .document()
            .ok_or_else(|| RecorderError::Platform("no document".to_string()))?;

        Ok(Self {
            record_button: element_by_id(&document, &ids.record_button)?,
            stop_button: element_by_id(&document, &ids.stop_button)?,
            video: element_by_id(&document, &ids.video)?,
            list: element_by_id(&document, &ids.recordings_list)?,
            window,
            document,
            on_play: None,
            play_listeners: Vec::new(),
        })
    }

    pub fn with_play_handler(mut self, on_play: PlayHandler) -> Self {
        self.on_play = Some(on_play);
        self
    }

    pub fn record_button(&self) -> &HtmlButtonElement {
        &self.record_button
    }

    pub fn stop_button(&self) -> &HtmlButtonElement {
        &self.stop_button
    }
}

impl RecorderView for DomView {
    fn set_start_enabled(&mut self, enabled: bool) {
        self.record_button.set_disabled(!enabled);
    }

    fn show_recording(&mut self, recording: bool) {
        let (start, stop) = if recording {
            ("none", "inline-block")
        } else {
            ("inline-block", "none")
        };
        set_display(&self.record_button, start);
        set_display(&self.stop_button, stop);
    }

    fn notify_error(&mut self, message: &str) {
        if let Err(err) = self.window.alert_with_message(message) {
            warn!("could not show alert: {}", js_error(err));
        }
    }

    fn present(&mut self, locator: &Locator) -> RecorderResult<()> {
        self.video.set_src(locator.as_str());
        Ok(())
    }

    fn play(&mut self, locator: &Locator) -> RecorderResult<()> {
        self.video.set_src(locator.as_str());
        let playback = self.video.play().map_err(platform_error)?;

        // Autoplay policies reject the promise rather than throwing.
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(err) = JsFuture::from(playback).await {
                warn!("playback did not start: {}", js_error(err));
            }
        });
        Ok(())
    }

    fn append_recording(
        &mut self,
        index: usize,
        entry: &RecordingEntry,
        locator: &Locator,
    ) -> RecorderResult<()> {
        let item: Element = create(&self.document, "li")?;

        let link: HtmlAnchorElement = create(&self.document, "a")?;
        link.set_href(locator.as_str());
        link.set_download(&entry.filename);
        link.set_text_content(Some(&entry.filename));
        item.append_child(&link).map_err(platform_error)?;

        let button: HtmlButtonElement = create(&self.document, "button")?;
        button.set_text_content(Some("Play"));
        button
            .style()
            .set_property("margin-left", "10px")
            .map_err(platform_error)?;

        if let Some(on_play) = self.on_play.clone() {
            let listener = Closure::<dyn FnMut(Event)>::new(move |_event: Event| on_play(index));
            button.set_onclick(Some(listener.as_ref().unchecked_ref()));
            self.play_listeners.push(listener);
        }
        item.append_child(&button).map_err(platform_error)?;

        self.list.append_child(&item).map_err(platform_error)?;
        Ok(())
    }
}
