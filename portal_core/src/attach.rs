//! Which components have already been wired to a page element.
//!
//! The wasm bundle attaches itself on load, and a page may still call
//! `attachPortal(root)` for a subtree. Each component records itself in a
//! marker attribute on its anchor element so a second pass skips it instead
//! of registering every listener twice.

pub const ATTACHED_ATTR: &str = "data-portal-attached";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Component {
    UploadManager,
    LoanForm,
    FormValidator,
}

impl Component {
    pub fn as_str(self) -> &'static str {
        match self {
            Component::UploadManager => "upload",
            Component::LoanForm => "loan-form",
            Component::FormValidator => "validator",
        }
    }
}

/// Whether `marker`, the current attribute value, already lists `component`.
pub fn is_attached(marker: Option<&str>, component: Component) -> bool {
    marker.is_some_and(|m| m.split_whitespace().any(|c| c == component.as_str()))
}

/// The attribute value after claiming `component`, or `None` when it is
/// already claimed.
pub fn claim(marker: Option<&str>, component: Component) -> Option<String> {
    if is_attached(marker, component) {
        return None;
    }
    let name = component.as_str();
    Some(match marker.map(str::trim).filter(|m| !m.is_empty()) {
        Some(existing) => format!("{existing} {name}"),
        None => name.to_string(),
    })
}
