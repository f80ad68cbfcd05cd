//! Download of the current workflow as a JSON file

use chrono::{DateTime, Utc};
use musicmash_common::model::WorkflowSnapshot;
use musicmash_common::Result;

/// File name offered to the browser
pub const EXPORT_FILE_NAME: &str = "musicmash-workflow.json";

/// Pretty-printed `{nodes, edges, timestamp}` document stamped with `at`
pub fn export_document(snapshot: WorkflowSnapshot, at: DateTime<Utc>) -> Result<String> {
    Ok(serde_json::to_string_pretty(&snapshot.stamped(at))?)
}

/// `Content-Disposition` value for the download
pub fn content_disposition() -> String {
    format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME)
}
