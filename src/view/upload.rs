/// Local checks for a vaccination-record upload.
///
/// All of these run before the network is touched: a missing file, a
/// non-`.json` extension, or content that does not parse stops here.
use std::fs;
use std::io;
use std::path::Path;

use serde_json::Value;

use crate::error::{Error, Result};

pub const NO_FILE: &str = "Please select a file first.";
pub const WRONG_TYPE: &str = "Invalid file type. Only .json files are allowed.";

pub fn has_json_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Read and parse the selected file.
pub fn load_upload(path: &Path) -> Result<Value> {
    if path.as_os_str().is_empty() {
        return Err(Error::validation(NO_FILE));
    }
    if !has_json_extension(path) {
        return Err(Error::validation(WRONG_TYPE));
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::validation(NO_FILE));
        }
        Err(e) => {
            return Err(Error::validation(format!(
                "Could not read {}: {e}",
                path.display()
            )));
        }
    };

    serde_json::from_str(&content)
        .map_err(|e| Error::validation(format!("The selected file is not valid JSON: {e}")))
}
