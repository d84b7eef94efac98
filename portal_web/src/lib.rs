//! Browser bindings for the loan portal pages.
//!
//! Each component looks for its anchor elements under a root and stays inert
//! when they are missing, so one bundle serves the person form, the loan form
//! and the upload page.

use std::rc::Rc;

use portal_core::{Component, PortalConfig, PortalError};
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element};

mod dom;
pub mod loan;
pub mod upload;
pub mod validator;

pub use dom::Scope;
pub use loan::LoanFormController;
pub use upload::UploadManager;
pub use validator::FormValidator;

const CONFIG_ELEMENT_ID: &str = "portalConfig";

/// Page-supplied overrides from `<script type="application/json" id="portalConfig">`.
fn load_config(document: &Document) -> PortalConfig {
    let Some(raw) = document
        .get_element_by_id(CONFIG_ELEMENT_ID)
        .and_then(|el| el.text_content())
    else {
        return PortalConfig::default();
    };
    PortalConfig::from_json_str(&raw).unwrap_or_else(|err| {
        dom::log_warn("config", &err);
        PortalConfig::default()
    })
}

fn submit_form(scope: &Scope, submit: &Element) -> Result<Option<Element>, PortalError> {
    if let Some(form) = submit.closest("form").map_err(dom::js_err)? {
        return Ok(Some(form));
    }
    scope.root().query_selector("form").map_err(dom::js_err)
}

fn attach_all(root: Element) -> Result<(), PortalError> {
    let document = dom::document()?;
    let config = Rc::new(load_config(&document));
    let scope = Scope::new(root);

    if let Some(form) = scope.find_opt::<Element>("uploadForm") {
        if !dom::is_attached(&form, Component::UploadManager) {
            UploadManager::attach(&scope, Rc::clone(&config))?;
            dom::mark_attached(&form, Component::UploadManager)?;
        }
    }
    if let Some(select) = scope.find_opt::<Element>("loan_type") {
        if !dom::is_attached(&select, Component::LoanForm) {
            LoanFormController::attach(&scope)?;
            dom::mark_attached(&select, Component::LoanForm)?;
        }
    }
    if let Some(submit) = scope.find_opt::<Element>("submitBtn") {
        match submit_form(&scope, &submit)? {
            Some(form) if !dom::is_attached(&form, Component::FormValidator) => {
                FormValidator::attach(form.clone(), submit)?;
                dom::mark_attached(&form, Component::FormValidator)?;
            }
            Some(_) => {}
            None => dom::log_warn("form validation", &PortalError::MissingElement("form".into())),
        }
    }
    Ok(())
}

/// Wire every component found under `root`. Components that are already
/// wired, e.g. by the automatic start-up pass, are left alone.
#[wasm_bindgen(js_name = attachPortal)]
pub fn attach_portal(root: Element) -> Result<(), JsValue> {
    attach_all(root).map_err(|err| JsValue::from_str(&err.to_string()))
}

#[cfg(target_arch = "wasm32")]
fn boot() {
    let root = dom::document().and_then(|d| {
        d.document_element()
            .ok_or_else(|| PortalError::Dom("document has no root element".into()))
    });
    if let Err(err) = root.and_then(attach_all) {
        dom::log_error("startup", &err);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    use wasm_bindgen::JsCast;

    console_error_panic_hook::set_once();
    web_sys::console::info_1(&JsValue::from_str(&format!(
        "portal_web {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("PORTAL_BUILD_ID")
    )));

    let Ok(document) = dom::document() else {
        return;
    };
    if document.ready_state() != "loading" {
        boot();
        return;
    }
    let on_ready = Closure::once_into_js(boot);
    if let Err(err) = document.add_event_listener_with_callback(
        "DOMContentLoaded",
        on_ready.unchecked_ref(),
    ) {
        dom::log_error("startup", &dom::js_err(err));
    }
}
