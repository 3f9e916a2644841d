// Userdata backups: one zip holding the whole data directory plus a
// small metadata file that marks it as ours.
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{CopilotError, Result};

pub const METADATA_FILE: &str = "backup_metadata.json";
pub const BACKUP_SOURCE: &str = "ShippingManagerCoPilot";
pub const BACKUP_VERSION: &str = "1.0";
const USERDATA_PREFIX: &str = "userdata/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupMetadata {
    pub version: String,
    pub created: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_mode: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BackupSummary {
    pub path: PathBuf,
    pub files: usize,
    pub bytes: u64,
}

/// `SMCoPilot_Backup_YYYYMMDD_HHMMSS.zip`
pub fn default_backup_name() -> String {
    format!("SMCoPilot_Backup_{}.zip", Local::now().format("%Y%m%d_%H%M%S"))
}

/// Zip every file under `data_dir` as `userdata/<relative path>`.
pub fn create_backup(data_dir: &Path, out: &Path) -> Result<BackupSummary> {
    if !data_dir.is_dir() {
        return Err(CopilotError::Backup(format!("no userdata at {}", data_dir.display())));
    }
    let out_dir = out.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    fs::create_dir_all(out_dir)?;

    let mut files = Vec::new();
    collect_files(data_dir, &mut files)?;
    // Skip the archive itself when it is written inside the data directory
    let out_abs = fs::canonicalize(out_dir)
        .map(|dir| dir.join(out.file_name().unwrap_or_default()))
        .ok();

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(File::create(out)?);

    let metadata = BackupMetadata {
        version: BACKUP_VERSION.to_string(),
        created: Local::now().to_rfc3339(),
        source: BACKUP_SOURCE.to_string(),
        execution_mode: Some("binary".to_string()),
    };
    writer.start_file(METADATA_FILE, options)?;
    writer.write_all(serde_json::to_string_pretty(&metadata)?.as_bytes())?;

    let mut count = 0;
    let mut bytes = 0;
    for file in files {
        if out_abs.as_deref() == fs::canonicalize(&file).ok().as_deref() {
            continue;
        }
        let Ok(relative) = file.strip_prefix(data_dir) else {
            continue;
        };
        let name = format!("{}{}", USERDATA_PREFIX, archive_path(relative));
        writer.start_file(name, options)?;
        bytes += io::copy(&mut File::open(&file)?, &mut writer)?;
        count += 1;
    }
    writer.finish()?;

    info!("💾 Backed up {} files ({} bytes) to {}", count, bytes, out.display());
    Ok(BackupSummary {
        path: out.to_path_buf(),
        files: count,
        bytes,
    })
}

/// Check that `path` is a readable backup made by this application.
pub fn validate_backup(path: &Path) -> Result<BackupMetadata> {
    let mut archive = ZipArchive::new(File::open(path)?)
        .map_err(|_| CopilotError::Backup("not a valid ZIP file".to_string()))?;

    let raw = {
        let mut entry = archive
            .by_name(METADATA_FILE)
            .map_err(|_| CopilotError::Backup("missing metadata file".to_string()))?;
        let mut raw = String::new();
        entry
            .read_to_string(&mut raw)
            .map_err(|_| CopilotError::Backup("corrupted metadata".to_string()))?;
        raw
    };

    let value: serde_json::Value =
        serde_json::from_str(&raw).map_err(|_| CopilotError::Backup("corrupted metadata".to_string()))?;
    let missing: Vec<&str> = ["version", "created", "source"]
        .into_iter()
        .filter(|field| value.get(*field).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(CopilotError::Backup(format!("missing metadata fields: {}", missing.join(", "))));
    }
    let metadata: BackupMetadata =
        serde_json::from_value(value).map_err(|_| CopilotError::Backup("corrupted metadata".to_string()))?;

    if metadata.source != BACKUP_SOURCE {
        return Err(CopilotError::Backup("not a ShippingManagerCoPilot backup".to_string()));
    }
    if !archive.file_names().any(|name| name.contains(USERDATA_PREFIX)) {
        return Err(CopilotError::Backup("no userdata folder found".to_string()));
    }

    Ok(metadata)
}

/// Restore a validated backup over `data_dir`. Files in the archive replace
/// their counterparts, other files are left alone. When extraction fails the
/// directory is put back exactly as it was.
pub fn restore_backup(path: &Path, data_dir: &Path) -> Result<usize> {
    let metadata = validate_backup(path)?;
    info!("📦 Restoring backup created {} (version {})", metadata.created, metadata.version);

    let snapshot = snapshot_path(data_dir);
    let had_data = data_dir.exists();
    if had_data {
        copy_dir(data_dir, &snapshot)?;
    }

    match extract_userdata(path, data_dir) {
        Ok(count) => {
            if had_data {
                if let Err(e) = fs::remove_dir_all(&snapshot) {
                    warn!("⚠️ Could not remove {}: {}", snapshot.display(), e);
                }
            }
            info!("✅ Restored {} files into {}", count, data_dir.display());
            Ok(count)
        }
        Err(e) => {
            warn!("⚠️ Restore failed, rolling back: {}", e);
            if data_dir.exists() {
                fs::remove_dir_all(data_dir)?;
            }
            if had_data {
                copy_dir(&snapshot, data_dir)?;
                fs::remove_dir_all(&snapshot)?;
            }
            Err(e)
        }
    }
}

fn extract_userdata(path: &Path, data_dir: &Path) -> Result<usize> {
    let mut archive = ZipArchive::new(File::open(path)?)?;
    let mut count = 0;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.name() == METADATA_FILE {
            continue;
        }
        let Some(name) = entry.enclosed_name() else {
            warn!("⚠️ Skipping unsafe backup entry {}", entry.name());
            continue;
        };
        let Ok(relative) = name.strip_prefix(USERDATA_PREFIX.trim_end_matches('/')) else {
            continue;
        };
        let target = data_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
        count += 1;
    }

    Ok(count)
}

/// Sibling directory holding the pre-restore copy, e.g. `userdata_backup_20250101_120000`.
fn snapshot_path(data_dir: &Path) -> PathBuf {
    let name = data_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "userdata".to_string());
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    data_dir.with_file_name(format!("{}_backup_{}", name, stamp))
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}

fn copy_dir(from: &Path, to: &Path) -> io::Result<()> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}

// Zip entry names always use forward slashes
fn archive_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
