//! Endpoint paths, icon assets and UI strings.
//!
//! `PortalConfig::default()` matches what the server-rendered pages expect, so
//! a page only has to ship a JSON override when it deviates.

use serde::{Deserialize, Serialize};

use crate::PortalError;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PortalConfig {
    pub endpoints: Endpoints,
    pub icons: Icons,
    pub messages: Messages,
    /// Send `?person_identifier=` along with file deletions.
    pub delete_with_person_identifier: bool,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            icons: Icons::default(),
            messages: Messages::default(),
            delete_with_person_identifier: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Endpoints {
    pub upload: String,
    pub file: String,
    pub download: String,
    pub finalize: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            upload: "/upload_temp".to_string(),
            file: "/file".to_string(),
            download: "/download".to_string(),
            finalize: "/create_db_records".to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Icons {
    pub photo: String,
    pub document: String,
}

impl Default for Icons {
    fn default() -> Self {
        Self {
            photo: "/static/icons/photo.png".to_string(),
            document: "/static/icons/pdf.png".to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Messages {
    pub delete_label: String,
    pub deleting_label: String,
    pub no_files: String,
    pub uploading: String,
    pub error_prefix: String,
    pub network_failed: String,
    pub unknown_error: String,
    pub missing_person: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            delete_label: "Löschen".to_string(),
            deleting_label: "Wird gelöscht…".to_string(),
            no_files: "Keine Datei wurde Hochgeladen.".to_string(),
            uploading: "Dateien werden hochgeladen…".to_string(),
            error_prefix: "Fehler: ".to_string(),
            network_failed: "Verbindung zum Server fehlgeschlagen.".to_string(),
            unknown_error: "Ein unbekannter Fehler ist aufgetreten.".to_string(),
            missing_person: "Keine Personenkennung gefunden.".to_string(),
        }
    }
}

impl PortalConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, PortalError> {
        let config: PortalConfig =
            serde_json::from_str(raw).map_err(|e| PortalError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_path(path: &std::path::Path) -> Result<Self, PortalError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| PortalError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&raw)
    }

    /// Endpoint paths must be absolute so they resolve the same way from
    /// every page.
    pub fn validate(&self) -> Result<(), PortalError> {
        let paths = [
            ("upload", &self.endpoints.upload),
            ("file", &self.endpoints.file),
            ("download", &self.endpoints.download),
            ("finalize", &self.endpoints.finalize),
        ];
        for (name, path) in paths {
            if !path.starts_with('/') {
                return Err(PortalError::InvalidConfig(format!(
                    "endpoint `{name}` must start with '/': {path:?}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_override_keeps_defaults() {
        let config = PortalConfig::from_json_str(
            r#"{ "messages": { "delete_label": "Delete" }, "delete_with_person_identifier": false }"#,
        )
        .unwrap();
        assert_eq!(config.messages.delete_label, "Delete");
        assert_eq!(config.messages.no_files, Messages::default().no_files);
        assert_eq!(config.endpoints, Endpoints::default());
        assert!(!config.delete_with_person_identifier);
    }

    #[test]
    fn relative_endpoint_is_rejected() {
        let err = PortalConfig::from_json_str(r#"{ "endpoints": { "file": "file" } }"#).unwrap_err();
        assert!(matches!(err, PortalError::InvalidConfig(msg) if msg.contains("file")));
    }

    #[test]
    fn garbage_is_an_invalid_config() {
        assert!(matches!(
            PortalConfig::from_json_str("not json"),
            Err(PortalError::InvalidConfig(_))
        ));
    }
}
