//! Core state derivation for the loan portal client.
//!
//! Everything in here is pure: the browser bindings in `portal_web` and the
//! `portal` CLI both feed raw values in and apply whatever comes back out.

use thiserror::Error;

pub mod api;
pub mod attach;
pub mod config;
pub mod loan;
pub mod upload;
pub mod validator;

pub use api::{
    delete_request, error_from_response, finalize_target, parse_delete_response,
    parse_upload_response, DeleteRequest, FinalizeTarget,
};
pub use attach::{Component, ATTACHED_ATTR};
pub use config::{Endpoints, Icons, Messages, PortalConfig};
pub use loan::{
    allowed_subtypes, compute_visibility, project, subtype_options, CollateralState,
    LoanFormProjection, LoanSubtype, LoanType, SubtypeOption, Visibility, COLLATERAL_FIELD_IDS,
};
pub use upload::{
    DeleteControl, DeleteOutcome, FileIcon, FileList, FileRecord, FileRow, SelectedFile,
    UploadPhase, UploadResponse,
};
pub use validator::{compute_enabled, first_blocking, FieldKind, FieldState, SubmitState};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PortalError {
    #[error("network request failed: {0}")]
    Transport(String),
    #[error("server rejected the request ({status}): {detail}")]
    Server { status: u16, detail: String },
    #[error("server returned an unreadable response ({status})")]
    MalformedBody { status: u16 },
    #[error("no person identifier on the page")]
    MissingPersonIdentifier,
    #[error("required element missing: #{0}")]
    MissingElement(String),
    #[error("cannot {action} while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("DOM operation failed: {0}")]
    Dom(String),
}

impl PortalError {
    /// Text shown to the user for this error.
    ///
    /// Server-reported details are passed through verbatim; transport and
    /// decoding failures fall back to the configured generic messages.
    pub fn user_message(&self, messages: &Messages) -> String {
        match self {
            PortalError::Server { detail, .. } => detail.clone(),
            PortalError::Transport(_) => messages.network_failed.clone(),
            PortalError::MalformedBody { .. } => messages.unknown_error.clone(),
            PortalError::MissingPersonIdentifier => messages.missing_person.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_server_reported(&self) -> bool {
        matches!(self, PortalError::Server { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_detail_is_shown_verbatim() {
        let messages = Messages::default();
        let err = PortalError::Server {
            status: 404,
            detail: "not found".into(),
        };
        assert_eq!(err.user_message(&messages), "not found");
        assert!(err.is_server_reported());
    }

    #[test]
    fn transport_and_malformed_fall_back_to_generic_text() {
        let messages = Messages::default();
        let transport = PortalError::Transport("connection reset".into());
        assert_eq!(transport.user_message(&messages), messages.network_failed);
        let malformed = PortalError::MalformedBody { status: 500 };
        assert_eq!(malformed.user_message(&messages), messages.unknown_error);
    }
}
