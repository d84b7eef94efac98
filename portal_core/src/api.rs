//! Request targets and response decoding for the file endpoints.
//!
//! Nothing here performs IO. Callers hand over the HTTP status and the raw
//! body text and get a typed result back, which keeps the error-message rules
//! testable outside a browser.

use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::warn;

use crate::config::Endpoints;
use crate::upload::{FileRecord, UploadResponse};
use crate::PortalError;

pub const PERSON_IDENTIFIER: &str = "person_identifier";

pub fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: JsonValue,
}

/// Turn `detail` into display text. Plain strings pass through; validation
/// error lists (`[{ "msg": ... }, ...]`) are joined.
fn detail_text(detail: &JsonValue) -> Option<String> {
    match detail {
        JsonValue::String(s) if !s.trim().is_empty() => Some(s.clone()),
        JsonValue::Array(items) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(JsonValue::as_str))
                .collect();
            if msgs.is_empty() {
                None
            } else {
                Some(msgs.join("; "))
            }
        }
        _ => None,
    }
}

/// Classify a non-success response.
pub fn error_from_response(status: u16, body: &str) -> PortalError {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| detail_text(&b.detail));
    match detail {
        Some(detail) => PortalError::Server { status, detail },
        None => {
            warn!(status, "error response without a usable detail");
            PortalError::MalformedBody { status }
        }
    }
}

pub fn parse_upload_response(status: u16, body: &str) -> Result<Vec<FileRecord>, PortalError> {
    if !is_success(status) {
        return Err(error_from_response(status, body));
    }
    let parsed: UploadResponse = serde_json::from_str(body).map_err(|e| {
        warn!(status, error = %e, "upload response did not decode");
        PortalError::MalformedBody { status }
    })?;
    Ok(parsed.files)
}

/// Any 2xx counts as deleted; the body is ignored.
pub fn parse_delete_response(status: u16, body: &str) -> Result<(), PortalError> {
    if is_success(status) {
        Ok(())
    } else {
        Err(error_from_response(status, body))
    }
}

fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeleteRequest {
    pub path: String,
    pub person_identifier: Option<String>,
}

impl DeleteRequest {
    /// Query pairs to append to `path`.
    pub fn query(&self) -> Vec<(&'static str, &str)> {
        self.person_identifier
            .as_deref()
            .map(|p| vec![(PERSON_IDENTIFIER, p)])
            .unwrap_or_default()
    }
}

pub fn delete_request(
    endpoints: &Endpoints,
    file_id: u64,
    person_identifier: Option<&str>,
    include_person: bool,
) -> DeleteRequest {
    DeleteRequest {
        path: format!("{}/{file_id}", endpoints.file),
        person_identifier: if include_person {
            non_empty(person_identifier)
        } else {
            None
        },
    }
}

/// Navigation target that turns the uploaded files into database records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FinalizeTarget {
    pub path: String,
    pub person_identifier: String,
}

impl FinalizeTarget {
    pub fn query(&self) -> [(&'static str, &str); 1] {
        [(PERSON_IDENTIFIER, self.person_identifier.as_str())]
    }
}

pub fn finalize_target(
    endpoints: &Endpoints,
    person_identifier: Option<&str>,
) -> Result<FinalizeTarget, PortalError> {
    let person_identifier =
        non_empty(person_identifier).ok_or(PortalError::MissingPersonIdentifier)?;
    Ok(FinalizeTarget {
        path: endpoints.finalize.clone(),
        person_identifier,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_success_yields_records() {
        let body = r#"{ "files": [ { "id": 1, "file_name": "a.pdf", "download_url": "/d/1" } ] }"#;
        let files = parse_upload_response(200, body).unwrap();
        assert_eq!(
            files,
            vec![FileRecord {
                id: Some(1),
                file_name: "a.pdf".into(),
                download_url: Some("/d/1".into()),
            }]
        );
    }

    #[test]
    fn upload_success_without_download_url() {
        let body = r#"{ "files": [ { "id": 3, "file_name": "b.png" } ] }"#;
        let files = parse_upload_response(200, body).unwrap();
        assert_eq!(files[0].download_url, None);
        assert_eq!(files[0].href(&Endpoints::default()).as_deref(), Some("/download/3"));
    }

    #[test]
    fn upload_error_detail_is_extracted() {
        let err = parse_upload_response(404, r#"{"detail":"Application not found or not yours."}"#)
            .unwrap_err();
        assert_eq!(
            err,
            PortalError::Server {
                status: 404,
                detail: "Application not found or not yours.".into()
            }
        );
    }

    #[test]
    fn unparseable_bodies_are_malformed() {
        assert_eq!(
            parse_upload_response(500, "<html>Internal Server Error</html>").unwrap_err(),
            PortalError::MalformedBody { status: 500 }
        );
        assert_eq!(
            parse_upload_response(200, "not json").unwrap_err(),
            PortalError::MalformedBody { status: 200 }
        );
        assert_eq!(
            parse_delete_response(400, r#"{"detail": 17}"#).unwrap_err(),
            PortalError::MalformedBody { status: 400 }
        );
    }

    #[test]
    fn validation_error_lists_are_joined() {
        let body = r#"{"detail":[{"loc":["body","files"],"msg":"field required"},{"msg":"too big"}]}"#;
        assert_eq!(
            error_from_response(422, body),
            PortalError::Server {
                status: 422,
                detail: "field required; too big".into()
            }
        );
    }

    #[test]
    fn delete_ignores_success_body() {
        assert!(parse_delete_response(200, "").is_ok());
        assert!(parse_delete_response(204, "").is_ok());
        assert!(parse_delete_response(200, r#"{"detail":"File 1 deleted successfully."}"#).is_ok());
    }

    #[test]
    fn delete_not_found_surfaces_detail() {
        let err = parse_delete_response(404, r#"{"detail":"not found"}"#).unwrap_err();
        assert_eq!(err.user_message(&crate::Messages::default()), "not found");
    }

    #[test]
    fn delete_request_carries_person_when_enabled() {
        let endpoints = Endpoints::default();
        let req = delete_request(&endpoints, 9, Some(" 12 "), true);
        assert_eq!(req.path, "/file/9");
        assert_eq!(req.query(), vec![("person_identifier", "12")]);

        let without = delete_request(&endpoints, 9, Some("12"), false);
        assert!(without.query().is_empty());

        let blank = delete_request(&endpoints, 9, Some("  "), true);
        assert_eq!(blank.person_identifier, None);
    }

    #[test]
    fn finalize_requires_person() {
        let endpoints = Endpoints::default();
        assert_eq!(
            finalize_target(&endpoints, None).unwrap_err(),
            PortalError::MissingPersonIdentifier
        );
        assert_eq!(
            finalize_target(&endpoints, Some("")).unwrap_err(),
            PortalError::MissingPersonIdentifier
        );
        let target = finalize_target(&endpoints, Some("5")).unwrap();
        assert_eq!(target.path, "/create_db_records");
        assert_eq!(target.query(), [("person_identifier", "5")]);
    }
}
