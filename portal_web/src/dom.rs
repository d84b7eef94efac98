use portal_core::attach::{self, Component, ATTACHED_ATTR};
use portal_core::{Messages, PortalError};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, Event, EventTarget, HtmlElement, HtmlInputElement, Window};

pub(crate) fn js_err(err: JsValue) -> PortalError {
    PortalError::Dom(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

pub(crate) fn window() -> Result<Window, PortalError> {
    web_sys::window().ok_or_else(|| PortalError::Dom("no window".into()))
}

pub(crate) fn document() -> Result<Document, PortalError> {
    window()?
        .document()
        .ok_or_else(|| PortalError::Dom("no document".into()))
}

/// A DOM subtree that a component looks up its elements in.
#[derive(Clone)]
pub struct Scope {
    root: Element,
}

impl Scope {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn find_opt<T: JsCast>(&self, id: &str) -> Option<T> {
        self.root
            .query_selector(&format!("#{id}"))
            .ok()
            .flatten()
            .and_then(|el| el.dyn_into::<T>().ok())
    }

    pub fn find<T: JsCast>(&self, id: &str) -> Result<T, PortalError> {
        let el = self
            .root
            .query_selector(&format!("#{id}"))
            .map_err(js_err)?
            .ok_or_else(|| PortalError::MissingElement(id.to_string()))?;
        el.dyn_into::<T>()
            .map_err(|_| PortalError::Dom(format!("#{id} has an unexpected element type")))
    }

    pub fn has(&self, id: &str) -> bool {
        self.find_opt::<Element>(id).is_some()
    }

    pub fn person_identifier(&self) -> Option<String> {
        self.root
            .query_selector(r#"input[name="person_identifier"]"#)
            .ok()
            .flatten()
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
            .map(|input| input.value())
    }
}

pub(crate) fn is_attached(el: &Element, component: Component) -> bool {
    attach::is_attached(el.get_attribute(ATTACHED_ATTR).as_deref(), component)
}

pub(crate) fn mark_attached(el: &Element, component: Component) -> Result<(), PortalError> {
    match attach::claim(el.get_attribute(ATTACHED_ATTR).as_deref(), component) {
        Some(marker) => el.set_attribute(ATTACHED_ATTR, &marker).map_err(js_err),
        None => Ok(()),
    }
}

/// Register `handler` for the lifetime of the page.
pub(crate) fn listen<F>(target: &EventTarget, event: &str, handler: F) -> Result<(), PortalError>
where
    F: FnMut(Event) + 'static,
{
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    target
        .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
        .map_err(js_err)?;
    closure.forget();
    Ok(())
}

pub(crate) fn set_shown(el: &HtmlElement, shown: bool) -> Result<(), PortalError> {
    el.style()
        .set_property("display", if shown { "flex" } else { "none" })
        .map_err(js_err)
}

pub(crate) fn set_disabled(el: &Element, disabled: bool) -> Result<(), PortalError> {
    el.toggle_attribute_with_force("disabled", disabled)
        .map(|_| ())
        .map_err(js_err)
}

/// Whether the element currently has a layout box.
pub(crate) fn is_rendered(el: &Element) -> bool {
    el.dyn_ref::<HtmlElement>()
        .map(|h| h.offset_parent().is_some())
        .unwrap_or(true)
}

pub(crate) fn create(document: &Document, tag: &str, class: &str) -> Result<Element, PortalError> {
    let el = document.create_element(tag).map_err(js_err)?;
    if !class.is_empty() {
        el.set_class_name(class);
    }
    Ok(el)
}

pub(crate) fn clear(el: &Element) {
    el.set_inner_html("");
}

/// Resolve `path` against the current page and append the query pairs.
pub(crate) fn page_url(path: &str, query: &[(&str, &str)]) -> Result<String, PortalError> {
    let base = window()?.location().href().map_err(js_err)?;
    let url = web_sys::Url::new_with_base(path, &base).map_err(js_err)?;
    let params = url.search_params();
    for (key, value) in query {
        params.append(key, value);
    }
    Ok(url.href())
}

pub(crate) fn alert(message: &str) {
    let shown = window().and_then(|w| w.alert_with_message(message).map_err(js_err));
    if let Err(err) = shown {
        log_warn("alert", &err);
    }
}

/// Log `err` and show it to the user in a blocking dialog.
pub(crate) fn report(context: &str, err: &PortalError, messages: &Messages) {
    if err.is_server_reported() {
        log_warn(context, err);
    } else {
        log_error(context, err);
    }
    alert(&format!("{}{}", messages.error_prefix, err.user_message(messages)));
}

pub(crate) fn log_error(context: &str, err: &PortalError) {
    web_sys::console::error_1(&JsValue::from_str(&format!("{context}: {err}")));
}

pub(crate) fn log_warn(context: &str, err: &PortalError) {
    web_sys::console::warn_1(&JsValue::from_str(&format!("{context}: {err}")));
}
