// Copyright 2026 the Curtaincall Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM stage.
//!
//! [`DomStage`] binds every page surface by id or selector once, at startup,
//! and applies the core's commands as inline styles and classes. Floating
//! buttons are `<img>` elements appended to the button panel, absolutely
//! positioned at its center and moved with CSS transforms.

use alloc::format;
use alloc::string::String;
use core::fmt;

use kurbo::{Rect, Size};
use wasm_bindgen::JsCast as _;
use web_sys::{Document, Element, Event, HtmlElement, Window};

use curtaincall_core::layout::Geometry;
use curtaincall_core::stage::{ButtonId, ButtonPlacement, Stage, Surface};

const FLOATING_TRANSITION: &str = "transform 0.3s ease";

/// A required page element could not be found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BindError {
    /// The id or selector that matched nothing.
    pub selector: &'static str,
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no element matches `{}`", self.selector)
    }
}

impl core::error::Error for BindError {}

/// CSS `display` value for a shown surface.
#[must_use]
pub(crate) fn shown_display(surface: Surface) -> &'static str {
    match surface {
        Surface::Envelope | Surface::Letter | Surface::ButtonPanel | Surface::Countdown => "flex",
        _ => "block",
    }
}

/// Transform of a button floating at the panel's center.
#[must_use]
pub(crate) fn floating_transform(placement: ButtonPlacement) -> String {
    let ButtonPlacement { offset, scale } = placement;
    if scale == 1.0 {
        format!(
            "translate(calc(-50% + {}px), calc(-50% + {}px))",
            offset.x, offset.y
        )
    } else {
        format!(
            "translate(calc(-50% + {}px), calc(-50% + {}px)) scale({scale})",
            offset.x, offset.y
        )
    }
}

/// Transform of a button in the panel's flow layout.
#[must_use]
pub(crate) fn flow_transform(placement: ButtonPlacement) -> String {
    format!("scale({})", placement.scale)
}

/// Identifies a button from its `class` and `alt` attributes.
#[must_use]
pub fn classify_button(class_name: &str, alt: Option<&str>) -> Option<ButtonId> {
    let has = |token: &str| class_name.split_whitespace().any(|c| c == token);
    if has("converted-yes-btn") {
        Some(ButtonId::ConvertedYes)
    } else if has("moving-no-btn") {
        Some(ButtonId::DynamicNo)
    } else if has("no-btn") {
        Some(ButtonId::StaticNo)
    } else if alt == Some("Yes") {
        Some(ButtonId::Yes)
    } else {
        None
    }
}

/// The button an event was dispatched to, if any.
///
/// Walks up from the target to the nearest `.btn`, so delegated listeners
/// on the panel see clicks on nested content too.
#[must_use]
pub fn button_from_event(event: &Event) -> Option<ButtonId> {
    let target = event.target()?.dyn_into::<Element>().ok()?;
    let button = target.closest(".btn").ok()??;
    classify_button(&button.class_name(), button.get_attribute("alt").as_deref())
}

fn by_id(document: &Document, id: &'static str) -> Result<HtmlElement, BindError> {
    document
        .get_element_by_id(id)
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        .ok_or(BindError { selector: id })
}

fn by_selector(document: &Document, selector: &'static str) -> Result<HtmlElement, BindError> {
    document
        .query_selector(selector)
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        .ok_or(BindError { selector })
}

fn rect_of(element: &Element) -> Rect {
    let r = element.get_bounding_client_rect();
    Rect::new(r.left(), r.top(), r.right(), r.bottom())
}

/// Applies stage commands to the page.
pub struct DomStage {
    window: Window,
    document: Document,
    curtain: HtmlElement,
    loading_indicator: Option<HtmlElement>,
    countdown: HtmlElement,
    envelope: HtmlElement,
    letter: HtmlElement,
    letter_window: HtmlElement,
    title: HtmlElement,
    image: HtmlElement,
    buttons: HtmlElement,
    final_text: HtmlElement,
    yes: HtmlElement,
    static_no: HtmlElement,
    dynamic_no: Option<HtmlElement>,
    converted_yes: Option<HtmlElement>,
}

impl fmt::Debug for DomStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomStage")
            .field("dynamic_no", &self.dynamic_no.is_some())
            .field("converted_yes", &self.converted_yes.is_some())
            .finish_non_exhaustive()
    }
}

impl DomStage {
    /// Finds every surface of the page.
    ///
    /// The loading indicator is optional; everything else is required.
    pub fn bind(window: Window, document: Document) -> Result<Self, BindError> {
        Ok(Self {
            curtain: by_id(&document, "curtain")?,
            loading_indicator: by_selector(&document, ".loading-indicator").ok(),
            countdown: by_id(&document, "countdown-container")?,
            envelope: by_id(&document, "envelope-container")?,
            letter: by_id(&document, "letter-container")?,
            letter_window: by_selector(&document, ".letter-window")?,
            title: by_id(&document, "letter-title")?,
            image: by_id(&document, "letter-capy")?,
            buttons: by_id(&document, "letter-buttons")?,
            final_text: by_id(&document, "final-text")?,
            yes: by_selector(&document, ".btn[alt='Yes']")?,
            static_no: by_selector(&document, ".no-btn")?,
            dynamic_no: None,
            converted_yes: None,
            window,
            document,
        })
    }

    /// The envelope, for click registration.
    #[must_use]
    pub fn envelope(&self) -> &HtmlElement {
        &self.envelope
    }

    /// The button panel, for delegated listener registration.
    #[must_use]
    pub fn button_panel(&self) -> &HtmlElement {
        &self.buttons
    }

    fn surface(&self, surface: Surface) -> Option<&HtmlElement> {
        match surface {
            Surface::Curtain => Some(&self.curtain),
            Surface::LoadingIndicator => self.loading_indicator.as_ref(),
            Surface::Countdown => Some(&self.countdown),
            Surface::Envelope => Some(&self.envelope),
            Surface::Letter => Some(&self.letter),
            Surface::LetterWindow => Some(&self.letter_window),
            Surface::Prompt => Some(&self.title),
            Surface::LetterImage => Some(&self.image),
            Surface::ButtonPanel => Some(&self.buttons),
            Surface::FinalText => Some(&self.final_text),
        }
    }

    fn button(&self, button: ButtonId) -> Option<&HtmlElement> {
        match button {
            ButtonId::Yes => Some(&self.yes),
            ButtonId::StaticNo => Some(&self.static_no),
            ButtonId::DynamicNo => self.dynamic_no.as_ref(),
            ButtonId::ConvertedYes => self.converted_yes.as_ref(),
        }
    }

    fn create_floating(&self, button: ButtonId) -> Option<HtmlElement> {
        let (src, alt, classes, cursor) = match button {
            ButtonId::DynamicNo => ("no.png", "No", "btn moving-no-btn", "default"),
            ButtonId::ConvertedYes => ("yes.png", "Yes", "btn yes-btn converted-yes-btn", "pointer"),
            ButtonId::Yes | ButtonId::StaticNo => return None,
        };
        let el = self
            .document
            .create_element("img")
            .ok()?
            .dyn_into::<HtmlElement>()
            .ok()?;
        let _ = el.set_attribute("src", src);
        let _ = el.set_attribute("alt", alt);
        el.set_class_name(classes);
        let style = el.style();
        let _ = style.set_property("position", "absolute");
        let _ = style.set_property("top", "50%");
        let _ = style.set_property("left", "50%");
        let _ = style.set_property("z-index", "10");
        let _ = style.set_property("cursor", cursor);
        let _ = style.set_property("will-change", "transform");
        let _ = style.set_property("touch-action", "none");
        let _ = style.set_property(
            "transform",
            &floating_transform(ButtonPlacement::ANCHORED),
        );
        let _ = self.buttons.append_child(&el);
        Some(el)
    }

    fn viewport(&self) -> Size {
        let w = self.window.inner_width().ok().and_then(|v| v.as_f64());
        let h = self.window.inner_height().ok().and_then(|v| v.as_f64());
        Size::new(w.unwrap_or(0.0), h.unwrap_or(0.0))
    }
}

impl Stage for DomStage {
    fn set_visible(&mut self, surface: Surface, visible: bool) {
        let Some(el) = self.surface(surface) else {
            return;
        };
        let display = if visible {
            shown_display(surface)
        } else {
            "none"
        };
        let _ = el.style().set_property("display", display);
    }

    fn set_text(&mut self, surface: Surface, text: &str) {
        if let Some(el) = self.surface(surface) {
            el.set_text_content(Some(text));
        }
    }

    fn set_image(&mut self, surface: Surface, src: &str) {
        if let Some(el) = self.surface(surface) {
            let _ = el.set_attribute("src", src);
        }
    }

    fn add_class(&mut self, surface: Surface, class: &str) {
        if let Some(el) = self.surface(surface) {
            let _ = el.class_list().add_1(class);
        }
    }

    fn spawn_button(&mut self, button: ButtonId) {
        if self.button(button).is_some() {
            return;
        }
        let created = self.create_floating(button);
        match button {
            ButtonId::DynamicNo => self.dynamic_no = created,
            ButtonId::ConvertedYes => self.converted_yes = created,
            ButtonId::Yes | ButtonId::StaticNo => {}
        }
    }

    fn set_button_visible(&mut self, button: ButtonId, visible: bool) {
        let Some(el) = self.button(button) else {
            return;
        };
        let style = el.style();
        if visible {
            let _ = style.remove_property("display");
        } else {
            let _ = style.set_property("display", "none");
        }
    }

    fn place_button(&mut self, button: ButtonId, placement: ButtonPlacement) {
        let Some(el) = self.button(button) else {
            return;
        };
        let transform = match button {
            ButtonId::DynamicNo | ButtonId::ConvertedYes => floating_transform(placement),
            ButtonId::Yes | ButtonId::StaticNo => flow_transform(placement),
        };
        let style = el.style();
        let _ = style.set_property("transition", FLOATING_TRANSITION);
        let _ = style.set_property("transform", &transform);
    }

    fn geometry(&self, floating: ButtonId) -> Geometry {
        let button = self.button(floating).map_or(Size::ZERO, |el| {
            Size::new(
                f64::from(el.offset_width()),
                f64::from(el.offset_height()),
            )
        });
        Geometry {
            container: self
                .buttons
                .is_connected()
                .then(|| rect_of(&self.buttons)),
            viewport: self.viewport(),
            button,
            yes_button: Some(rect_of(&self.yes)),
        }
    }
}
