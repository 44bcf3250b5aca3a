use std::path::Path;

use serde::Serialize;
use ts_rs::TS;

use crate::config::ToolConfig;
use crate::document::{output_name, read_document, MapDocument};
use crate::error::AppError;
use crate::mapfile::{
    build_inventory, clone_calibration, rename, CloneRequest, DeviceRecord, RenameRequest,
};

/// Suffix for rename output files: `site.map` → `site_renamed.map`.
pub const RENAMED_SUFFIX: &str = "_renamed";
/// Suffix for calibration-clone output files.
pub const CALIBRATED_SUFFIX: &str = "_calibrated";

/// Summary of the currently loaded document.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct DocumentInfo {
    pub name: String,
    #[ts(type = "number")]
    pub device_count: usize,
}

/// One produced output file. The loaded document is never modified; callers
/// decide where the patched content ends up.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct PatchInfo {
    pub file_name: String,
    pub content: String,
}

/// One editing session: the active config, at most one loaded document, and
/// the inventory derived from it.
///
/// Transformations are pure with respect to the session: they hand back a
/// [`PatchInfo`] and leave the document and inventory exactly as loaded, so
/// repeated operations always start from the same source text.
pub struct Session {
    config: ToolConfig,
    document: Option<MapDocument>,
    inventory: Vec<DeviceRecord>,
}

impl Session {
    #[must_use]
    pub fn new(config: ToolConfig) -> Self {
        Self {
            config,
            document: None,
            inventory: Vec::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    #[must_use]
    pub fn devices(&self) -> &[DeviceRecord] {
        &self.inventory
    }

    #[must_use]
    pub fn document_info(&self) -> Option<DocumentInfo> {
        self.document.as_ref().map(|doc| DocumentInfo {
            name: doc.name.clone(),
            device_count: self.inventory.len(),
        })
    }

    /// Load a document, replacing whatever was loaded before. The previous
    /// inventory is discarded entirely; nothing carries over between files.
    pub fn load(&mut self, document: MapDocument) -> usize {
        self.inventory = build_inventory(&document.text, &self.config);
        self.document = Some(document);
        self.inventory.len()
    }

    /// Read a file from disk and load it.
    pub fn load_path(&mut self, path: &Path) -> Result<usize, AppError> {
        let document = read_document(path)?;
        Ok(self.load(document))
    }

    /// Drop the loaded document and its inventory.
    pub fn reset(&mut self) {
        self.document = None;
        self.inventory.clear();
    }

    /// Rename a device. The output file name carries the `_renamed` suffix.
    pub fn rename(&self, request: &RenameRequest) -> Result<PatchInfo, AppError> {
        let document = self.document.as_ref().ok_or(AppError::NoDocument)?;
        if request.target_serial.is_empty() || request.new_serial.is_empty() {
            return Err(AppError::ValidationError {
                message: "target serial and new serial must not be empty".to_string(),
            });
        }
        self.require_device(&request.target_serial)?;
        if let Some(donor) = request.clone_source.as_deref() {
            self.require_device(donor)?;
        }
        let content = rename(&document.text, &self.inventory, &self.config, request)
            .ok_or(AppError::NoOutput)?;
        Ok(PatchInfo {
            file_name: output_name(&document.name, RENAMED_SUFFIX),
            content,
        })
    }

    /// Copy calibration data between devices. The output file name carries
    /// the `_calibrated` suffix.
    pub fn clone_calibration(&self, request: &CloneRequest) -> Result<PatchInfo, AppError> {
        let document = self.document.as_ref().ok_or(AppError::NoDocument)?;
        if request.source_serial.is_empty() || request.target_serial.is_empty() {
            return Err(AppError::ValidationError {
                message: "source serial and target serial must not be empty".to_string(),
            });
        }
        self.require_device(&request.source_serial)?;
        let content = clone_calibration(&document.text, &self.inventory, &self.config, request)
            .ok_or(AppError::NoOutput)?;
        Ok(PatchInfo {
            file_name: output_name(&document.name, CALIBRATED_SUFFIX),
            content,
        })
    }

    fn require_device(&self, serial: &str) -> Result<&DeviceRecord, AppError> {
        self.inventory
            .iter()
            .find(|record| record.serial == serial)
            .ok_or_else(|| AppError::NotFound {
                what: format!("Device {serial}"),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const TWO_DEVICE_MAP: &str = concat!(
        r#"<PMU sn="111" networkid="A01" amb_act_lev="40"/>"#,
        r#"<PMU sn="222" networkid="A02" amb_act_lev="10"/>"#,
    );

    fn loaded_session() -> Session {
        let mut session = Session::new(ToolConfig::default());
        session.load(MapDocument {
            name: "site.map".to_string(),
            text: TWO_DEVICE_MAP.to_string(),
        });
        session
    }

    fn rename_request(target: &str, new: &str) -> RenameRequest {
        RenameRequest {
            target_serial: target.to_string(),
            new_serial: new.to_string(),
            occurrence_limit: None,
            clone_source: None,
            network_override: None,
        }
    }

    #[test]
    fn load_builds_inventory_and_reports_count() {
        let session = loaded_session();
        assert_eq!(session.devices().len(), 2);
        let info = session.document_info().unwrap();
        assert_eq!(info.name, "site.map");
        assert_eq!(info.device_count, 2);
    }

    #[test]
    fn rename_produces_suffix_named_output() {
        let session = loaded_session();
        let patch = session.rename(&rename_request("111", "999")).unwrap();
        assert_eq!(patch.file_name, "site_renamed.map");
        assert!(patch.content.contains(r#"sn="999""#));
        assert!(!patch.content.contains(r#"sn="111""#));
    }

    #[test]
    fn clone_produces_suffix_named_output() {
        let session = loaded_session();
        let patch = session
            .clone_calibration(&CloneRequest {
                source_serial: "111".to_string(),
                target_serial: "222".to_string(),
                network_override: None,
            })
            .unwrap();
        assert_eq!(patch.file_name, "site_calibrated.map");
        assert!(patch
            .content
            .contains(r#"<PMU sn="222" networkid="A02" amb_act_lev="40"/>"#));
    }

    #[test]
    fn transformations_never_touch_the_loaded_document() {
        let session = loaded_session();
        session.rename(&rename_request("111", "999")).unwrap();
        // A second identical request starts from the original text again.
        let patch = session.rename(&rename_request("111", "999")).unwrap();
        assert!(patch.content.contains(r#"sn="999""#));
        assert_eq!(session.devices().len(), 2);
    }

    #[test]
    fn operations_without_a_document_fail() {
        let session = Session::new(ToolConfig::default());
        assert!(matches!(
            session.rename(&rename_request("111", "999")),
            Err(AppError::NoDocument)
        ));
    }

    #[test]
    fn unknown_target_reports_not_found() {
        let session = loaded_session();
        let err = session.rename(&rename_request("555", "999")).unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
        assert_eq!(err.to_string(), "Device 555 not found");
    }

    #[test]
    fn missing_donor_reports_not_found() {
        let session = loaded_session();
        let request = RenameRequest {
            clone_source: Some("555".to_string()),
            ..rename_request("111", "999")
        };
        assert!(matches!(
            session.rename(&request),
            Err(AppError::NotFound { .. })
        ));
    }

    #[test]
    fn empty_serials_rejected_up_front() {
        let session = loaded_session();
        assert!(matches!(
            session.rename(&rename_request("", "999")),
            Err(AppError::ValidationError { .. })
        ));
    }

    #[test]
    fn reset_clears_document_and_inventory() {
        let mut session = loaded_session();
        session.reset();
        assert!(session.document_info().is_none());
        assert!(session.devices().is_empty());
        assert!(matches!(
            session.rename(&rename_request("111", "999")),
            Err(AppError::NoDocument)
        ));
    }

    #[test]
    fn load_replaces_previous_inventory() {
        let mut session = loaded_session();
        session.load(MapDocument {
            name: "other.map".to_string(),
            text: r#"<PMU sn="777"/>"#.to_string(),
        });
        assert_eq!(session.devices().len(), 1);
        assert_eq!(session.devices()[0].serial, "777");
        assert!(matches!(
            session.rename(&rename_request("111", "999")),
            Err(AppError::NotFound { .. })
        ));
    }
}
