use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex};

/// A loaded `.map` file: the name it arrived under and its exact text.
/// The text is never re-serialized; every edit is a splice into this string,
/// so bytes the user didn't touch survive verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapDocument {
    pub name: String,
    pub text: String,
}

/// Read a `.map` file from disk. The document keeps only the file name, not
/// the path; output naming works from the name alone.
pub fn read_document(path: &Path) -> Result<MapDocument, std::io::Error> {
    let text = fs::read_to_string(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "untitled.map".to_string());
    Ok(MapDocument { name, text })
}

/// Derive an output file name by inserting `suffix` before the final
/// extension: `site.map` + `_renamed` → `site_renamed.map`. A name without
/// an extension just gets the suffix appended.
#[must_use]
pub fn output_name(input: &str, suffix: &str) -> String {
    match input.rfind('.') {
        Some(dot) if dot > 0 => {
            let (stem, ext) = input.split_at(dot);
            format!("{stem}{suffix}{ext}")
        }
        _ => format!("{input}{suffix}"),
    }
}

/// Per-file mutex map to serialize concurrent writes to the same path.
static FILE_LOCKS: LazyLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Atomically write bytes to a file using write-to-temp-then-rename.
///
/// 1. Acquires a per-file mutex to prevent concurrent writes to the same path
/// 2. Writes data to a `.tmp` sibling file
/// 3. Calls `fsync` to flush to disk
/// 4. Renames the existing file to `.bak` (best-effort)
/// 5. Renames the `.tmp` file to the target path
///
/// An interrupted write leaves either the old file or the new one, never a
/// truncated mix.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<(), std::io::Error> {
    // Acquire per-file lock to serialize writes to the same path
    let lock = {
        let mut locks = FILE_LOCKS
            .lock()
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    };
    let _guard = lock
        .lock()
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    // Build sibling paths: site.map → site.map.tmp, site.map.bak
    let file_name = path.file_name().unwrap_or_default();

    let mut tmp_name = OsString::from(file_name);
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(&tmp_name);

    let mut bak_name = OsString::from(file_name);
    bak_name.push(".bak");
    let bak_path = path.with_file_name(&bak_name);

    // Write to temporary file + fsync
    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    // Backup existing file (best-effort — ignore errors)
    if path.exists() {
        let _ = fs::rename(path, &bak_path);
    }

    // Rename temp to target
    fs::rename(&tmp_path, path)?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mapconfig_test_{name}"));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn output_name_inserts_suffix_before_extension() {
        assert_eq!(output_name("site.map", "_renamed"), "site_renamed.map");
        assert_eq!(output_name("floor2.MAP", "_calibrated"), "floor2_calibrated.MAP");
    }

    #[test]
    fn output_name_uses_final_extension_only() {
        assert_eq!(
            output_name("north.site.map", "_renamed"),
            "north.site_renamed.map"
        );
    }

    #[test]
    fn output_name_without_extension_appends() {
        assert_eq!(output_name("export", "_renamed"), "export_renamed");
        assert_eq!(output_name(".map", "_renamed"), ".map_renamed");
    }

    #[test]
    fn read_document_captures_name_and_exact_text() {
        let dir = scratch_dir("document_read");
        let path = dir.join("hall.map");
        let text = "<PMU sn=\"1\"/>\r\n  trailing  ";
        fs::write(&path, text).unwrap();

        let doc = read_document(&path).unwrap();
        assert_eq!(doc.name, "hall.map");
        assert_eq!(doc.text, text);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn read_document_missing_file_errors() {
        let path = std::env::temp_dir().join("mapconfig_test_document_missing/none.map");
        assert!(read_document(&path).is_err());
    }

    #[test]
    fn atomic_write_replaces_and_backs_up() {
        let dir = scratch_dir("document_atomic");
        let path = dir.join("out.map");

        atomic_write(&path, b"first").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "first");

        atomic_write(&path, b"second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        assert_eq!(
            fs::read_to_string(dir.join("out.map.bak")).unwrap(),
            "first"
        );
        assert!(!dir.join("out.map.tmp").exists());

        let _ = fs::remove_dir_all(&dir);
    }
}
