//! Request/response types for the publish endpoint

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn is_false(b: &bool) -> bool {
    !*b
}

/// Publish trigger: an explicit SPU list or "publish all drafts".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    #[serde(default)]
    pub spus: Option<Vec<String>>,
    #[serde(default)]
    pub publish_all: bool,
}

/// What the request resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    Explicit(Vec<String>),
}

impl PublishRequest {
    /// Resolve the trigger, rejecting requests that name neither an explicit
    /// list nor the publish-all flag.
    pub fn selection(&self) -> Result<Selection, SelectionError> {
        if self.publish_all {
            return Ok(Selection::All);
        }
        let spus: Vec<String> = self
            .spus
            .iter()
            .flatten()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if spus.is_empty() {
            return Err(SelectionError::Empty);
        }
        Ok(Selection::Explicit(spus))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error("Request must carry a non-empty 'spus' list or 'publishAll': true")]
    Empty,
}

/// Successful publish response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    pub ok: bool,
    pub spus: Vec<String>,
    pub staged: StagedCounts,
    pub moved: Vec<MoveOutcome>,
    pub archived: Vec<ArchiveOutcome>,
}

#[derive(Debug, Serialize)]
pub struct StagedCounts {
    pub spus: usize,
    pub skus: usize,
}

/// Per-SPU outcome of the image folder move phase.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveOutcome {
    pub spu: String,
    pub moved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-run-folder outcome of the archive phase.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveOutcome {
    pub run_folder: String,
    pub archived: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One SPU's image folder validation problems.
///
/// Serialized into the 400 payload; field names are part of the operator
/// contract, so booleans are camelCase and omitted when clean.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageIssue {
    pub spu: String,
    #[serde(skip_serializing_if = "is_false")]
    pub folder_missing: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub missing_main: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub invalid_path: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub invalid_prefixes: Vec<String>,
}

impl ImageIssue {
    pub fn clean(spu: &str) -> Self {
        Self {
            spu: spu.to_string(),
            ..Default::default()
        }
    }

    pub fn is_clean(&self) -> bool {
        !self.folder_missing
            && !self.missing_main
            && !self.invalid_path
            && self.invalid_prefixes.is_empty()
    }
}

/// A SPU whose image folder passed validation, ready for the destructive
/// phases.
#[derive(Debug, Clone)]
pub struct ValidatedSpu {
    pub spu: String,
    /// Absolute path of the SPU image folder under the draft root.
    pub dir: PathBuf,
    /// Parent run folder, `None` when the SPU folder sits directly under the
    /// draft root.
    pub run_folder: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_selection_trims_and_drops_blanks() {
        let request = PublishRequest {
            spus: Some(vec![" AB123 ".into(), "".into(), "CD456".into()]),
            publish_all: false,
        };
        assert_eq!(
            request.selection().unwrap(),
            Selection::Explicit(vec!["AB123".into(), "CD456".into()])
        );
    }

    #[test]
    fn publish_all_wins_over_list() {
        let request = PublishRequest {
            spus: Some(vec!["AB123".into()]),
            publish_all: true,
        };
        assert_eq!(request.selection().unwrap(), Selection::All);
    }

    #[test]
    fn empty_request_is_rejected() {
        assert!(PublishRequest::default().selection().is_err());
    }

    #[test]
    fn issue_serializes_contract_field_names() {
        let issue = ImageIssue {
            spu: "C".into(),
            missing_main: true,
            ..Default::default()
        };
        let value = serde_json::to_value(&issue).unwrap();
        assert_eq!(value, serde_json::json!({"spu": "C", "missingMain": true}));
    }

    #[test]
    fn move_outcome_omits_absent_error() {
        let value = serde_json::to_value(MoveOutcome {
            spu: "A".into(),
            moved: true,
            error: None,
        })
        .unwrap();
        assert!(value.get("error").is_none());
    }
}
