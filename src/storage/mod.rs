// Storage module for persistent data
pub mod settings_store;
pub mod hijack_history;
pub mod lookup_cache;

pub use settings_store::*;
pub use hijack_history::*;
pub use lookup_cache::*;

use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::Result;

/// Write pretty JSON to a temp file, fsync, then rename over `path`.
pub(crate) fn write_json_file<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(value)?;
    let tmp_path = path.with_extension("json.tmp");
    {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}
