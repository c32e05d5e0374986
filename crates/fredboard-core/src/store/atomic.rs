use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `value` as pretty JSON so readers see either the old file or the
/// complete new one: temp file in the same directory, fsync, then rename.
pub(crate) fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp = temp_path(path);
    let result = write_and_sync(&tmp, value).and_then(|()| fs::rename(&tmp, path));
    if result.is_err() {
        // best effort; the target file is untouched either way
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn write_and_sync<T: Serialize + ?Sized>(tmp: &Path, value: &T) -> io::Result<()> {
    let file = File::create(tmp)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writer.write_all(b"\n")?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_path_is_sibling() {
        let tmp = temp_path(Path::new("/data/saved_metrics.json"));
        assert_eq!(tmp, PathBuf::from("/data/saved_metrics.json.tmp"));
    }

    #[test]
    fn test_write_replaces_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("doc.json");

        write_json_atomic(&path, &vec![1, 2, 3]).unwrap();
        write_json_atomic(&path, &vec![4]).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let parsed: Vec<i32> = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed, vec![4]);
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_failed_write_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        write_json_atomic(&path, &"original").unwrap();

        // a directory squatting on the temp name makes File::create fail
        fs::create_dir(temp_path(&path)).unwrap();
        assert!(write_json_atomic(&path, &"replacement").is_err());

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(serde_json::from_str::<String>(&contents).unwrap(), "original");
    }
}
