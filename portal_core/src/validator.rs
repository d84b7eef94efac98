//! Submit-button gating for forms with required fields.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum FieldKind {
    /// `<input>`: blank after trimming counts as missing.
    Text,
    /// `<select>`: the empty placeholder option counts as missing.
    Select,
    /// Anything else flagged required; never blocks submission.
    Other,
}

impl FieldKind {
    pub fn from_tag_name(tag: &str) -> Self {
        if tag.eq_ignore_ascii_case("input") {
            FieldKind::Text
        } else if tag.eq_ignore_ascii_case("select") {
            FieldKind::Select
        } else {
            FieldKind::Other
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldState {
    pub kind: FieldKind,
    pub value: String,
    /// Whether the field currently has a layout box.
    pub visible: bool,
}

impl FieldState {
    pub fn new(kind: FieldKind, value: impl Into<String>, visible: bool) -> Self {
        Self {
            kind,
            value: value.into(),
            visible,
        }
    }

    pub fn is_satisfied(&self) -> bool {
        if !self.visible {
            return true;
        }
        match self.kind {
            FieldKind::Text => !self.value.trim().is_empty(),
            FieldKind::Select => !self.value.is_empty(),
            FieldKind::Other => true,
        }
    }
}

/// Index of the first visible required field that is still missing a value.
pub fn first_blocking(fields: &[FieldState]) -> Option<usize> {
    fields.iter().position(|f| !f.is_satisfied())
}

pub fn compute_enabled(fields: &[FieldState]) -> bool {
    first_blocking(fields).is_none()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitState {
    Ready,
    NotReady,
}

impl SubmitState {
    pub fn from_fields(fields: &[FieldState]) -> Self {
        if compute_enabled(fields) {
            SubmitState::Ready
        } else {
            SubmitState::NotReady
        }
    }

    pub fn is_enabled(self) -> bool {
        self == SubmitState::Ready
    }

    /// Class toggled on the submit control while it is ready.
    pub const READY_CLASS: &'static str = "enabled";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> FieldState {
        FieldState::new(FieldKind::Text, value, true)
    }

    fn select(value: &str) -> FieldState {
        FieldState::new(FieldKind::Select, value, true)
    }

    #[test]
    fn all_filled_enables_submit() {
        let fields = vec![text("Anna"), select("immediate"), text(" 42 ")];
        assert!(compute_enabled(&fields));
        assert_eq!(SubmitState::from_fields(&fields), SubmitState::Ready);
    }

    #[test]
    fn whitespace_only_text_blocks() {
        let fields = vec![text("Anna"), text("   ")];
        assert!(!compute_enabled(&fields));
        assert_eq!(first_blocking(&fields), Some(1));
    }

    #[test]
    fn placeholder_select_blocks_but_whitespace_select_value_does_not() {
        assert!(!compute_enabled(&[select("")]));
        assert!(compute_enabled(&[select(" ")]));
    }

    #[test]
    fn hidden_required_fields_never_block() {
        let fields = vec![
            text("Anna"),
            FieldState::new(FieldKind::Text, "", false),
            FieldState::new(FieldKind::Select, "", false),
        ];
        assert!(compute_enabled(&fields));
    }

    #[test]
    fn enabled_iff_every_visible_field_filled() {
        let values = ["", " ", "x"];
        for a in values {
            for b in values {
                for hidden_b in [false, true] {
                    let fields = vec![
                        text(a),
                        FieldState::new(FieldKind::Text, b, !hidden_b),
                    ];
                    let expected = !a.trim().is_empty() && (hidden_b || !b.trim().is_empty());
                    assert_eq!(compute_enabled(&fields), expected, "a={a:?} b={b:?} hidden={hidden_b}");
                }
            }
        }
    }

    #[test]
    fn no_required_fields_is_ready() {
        assert!(SubmitState::from_fields(&[]).is_enabled());
    }

    #[test]
    fn tag_names_map_to_kinds() {
        assert_eq!(FieldKind::from_tag_name("INPUT"), FieldKind::Text);
        assert_eq!(FieldKind::from_tag_name("select"), FieldKind::Select);
        assert_eq!(FieldKind::from_tag_name("TEXTAREA"), FieldKind::Other);
        assert!(FieldState::new(FieldKind::Other, "", true).is_satisfied());
    }
}
