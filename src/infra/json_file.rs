// File plumbing shared by the JSON stores.
//
// An unreadable file is moved aside to `<name>.corrupt` before the store starts
// empty, so the next save cannot overwrite the only copy. Saves go to a
// sibling temp file that is renamed over the real one.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Where an unreadable file is moved.
pub fn quarantine_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".corrupt");
    path.with_file_name(name)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Read and parse `path`. `Ok(None)` when the file is missing or had to be
/// quarantined; only I/O failures are errors.
pub fn load<T: DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = std::fs::read_to_string(path)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            let aside = quarantine_path(path);
            std::fs::rename(path, &aside)?;
            tracing::warn!(
                path = %path.display(),
                kept_at = %aside.display(),
                "{what} is unreadable, starting empty: {e}"
            );
            Ok(None)
        }
    }
}

/// Replace `path` with the pretty-printed `value` in one rename.
pub fn save<T: Serialize>(path: &Path, value: &T) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp = temp_path(path);
    let mut writer = std::io::BufWriter::new(std::fs::File::create(&tmp)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    drop(file);

    std::fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn unreadable_file_is_moved_aside() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fight_stats.json");
        std::fs::write(&path, r#"{"global": {"1": "#).unwrap();

        let loaded: Option<BTreeMap<String, u32>> = load(&path, "Fight stats").unwrap();

        assert!(loaded.is_none());
        assert!(!path.exists());
        assert_eq!(
            std::fs::read_to_string(quarantine_path(&path)).unwrap(),
            r#"{"global": {"1": "#
        );
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded: Option<Vec<u8>> = load(&dir.path().join("nope.json"), "Nothing").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn save_replaces_the_file_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ask_history.json");

        save(&path, &vec![1, 2, 3]).unwrap();
        save(&path, &vec![4]).unwrap();

        let reread: Vec<i32> = load(&path, "History").unwrap().unwrap();
        assert_eq!(reread, vec![4]);
        assert!(!temp_path(&path).exists());
    }
}
