use std::rc::Rc;

use portal_core::{FieldKind, FieldState, PortalError, SubmitState};
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlInputElement, HtmlSelectElement};

use crate::dom::{is_rendered, js_err, listen, set_disabled};

/// Keeps `submit` disabled until every visible required field in `form`
/// holds a value.
pub struct FormValidator {
    form: Element,
    submit: Element,
}

impl FormValidator {
    pub fn attach(form: Element, submit: Element) -> Result<Rc<Self>, PortalError> {
        let validator = Rc::new(Self { form, submit });
        // input and change bubble, so one pair of listeners on the form
        // also covers fields that become required later.
        for event in ["input", "change"] {
            let v = Rc::clone(&validator);
            listen(&validator.form, event, move |_| {
                v.refresh();
            })?;
        }
        validator.refresh();
        Ok(validator)
    }

    fn field_states(&self) -> Result<Vec<FieldState>, PortalError> {
        let nodes = self.form.query_selector_all("[required]").map_err(js_err)?;
        let mut fields = Vec::with_capacity(nodes.length() as usize);
        for i in 0..nodes.length() {
            let Some(el) = nodes.item(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
                continue;
            };
            fields.push(field_state(&el));
        }
        Ok(fields)
    }

    pub fn refresh(&self) -> SubmitState {
        let state = match self.field_states() {
            Ok(fields) => SubmitState::from_fields(&fields),
            Err(err) => {
                crate::dom::log_warn("form validation", &err);
                SubmitState::NotReady
            }
        };
        let ready = state.is_enabled();
        if let Err(err) = set_disabled(&self.submit, !ready) {
            crate::dom::log_warn("form validation", &err);
        }
        if let Err(err) = self
            .submit
            .class_list()
            .toggle_with_force(SubmitState::READY_CLASS, ready)
        {
            crate::dom::log_warn("form validation", &js_err(err));
        }
        state
    }
}

fn field_state(el: &Element) -> FieldState {
    let kind = FieldKind::from_tag_name(&el.tag_name());
    let value = match kind {
        FieldKind::Text => el
            .dyn_ref::<HtmlInputElement>()
            .map(|i| i.value())
            .unwrap_or_default(),
        FieldKind::Select => el
            .dyn_ref::<HtmlSelectElement>()
            .map(|s| s.value())
            .unwrap_or_default(),
        FieldKind::Other => String::new(),
    };
    FieldState::new(kind, value, is_rendered(el))
}
