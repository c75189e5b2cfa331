//! Snapshot archive unpacking.
//!
//! A snapshot is a ZIP archive carrying the catalog JSON. When the archive
//! holds a single file that file is the catalog, whatever its name;
//! otherwise the entry is looked up by name. Decompressed reads are bounded
//! so a hostile archive cannot exhaust memory.

use std::io::{Cursor, Read};

use shelf_core::Error;

/// Extract the catalog entry from a snapshot archive.
pub fn unpack_catalog(snapshot: &[u8], entry_name: &str, max_entry_bytes: u64) -> Result<Vec<u8>, Error> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(snapshot)).map_err(|e| Error::Archive(format!("unreadable archive: {e}")))?;

    let files: Vec<String> = archive
        .file_names()
        .filter(|name| !name.ends_with('/'))
        .map(str::to_owned)
        .collect();

    let name = match files.as_slice() {
        [] => return Err(Error::Archive("archive is empty".into())),
        [only] => only.clone(),
        _ if files.iter().any(|f| f == entry_name) => entry_name.to_string(),
        _ => {
            return Err(Error::Archive(format!(
                "archive has {} files and none is named `{entry_name}`",
                files.len()
            )));
        }
    };

    let entry = archive
        .by_name(&name)
        .map_err(|e| Error::Archive(format!("{name}: {e}")))?;

    let mut out = Vec::new();
    entry
        .take(max_entry_bytes.saturating_add(1))
        .read_to_end(&mut out)
        .map_err(|e| Error::Archive(format!("{name}: {e}")))?;

    if out.len() as u64 > max_entry_bytes {
        return Err(Error::Archive(format!("{name} exceeds size limit ({max_entry_bytes} bytes)")));
    }

    tracing::debug!(entry = %name, bytes = out.len(), "unpacked catalog entry");

    Ok(out)
}

/// Build an in-memory archive holding `files`.
#[cfg(test)]
pub(crate) fn zip_snapshot(files: &[(&str, &[u8])]) -> Vec<u8> {
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in files {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(contents).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: u64 = 1024 * 1024;

    #[test]
    fn test_single_entry_used_regardless_of_name() {
        let snapshot = zip_snapshot(&[("books-2024.json", b"[]")]);
        assert_eq!(unpack_catalog(&snapshot, "ebook-list.json", LIMIT).unwrap(), b"[]");
    }

    #[test]
    fn test_named_entry_among_several() {
        let snapshot = zip_snapshot(&[("README.txt", b"hello"), ("ebook-list.json", b"[{}]")]);
        assert_eq!(unpack_catalog(&snapshot, "ebook-list.json", LIMIT).unwrap(), b"[{}]");
    }

    #[test]
    fn test_missing_named_entry() {
        let snapshot = zip_snapshot(&[("a.json", b"[]"), ("b.json", b"[]")]);
        let err = unpack_catalog(&snapshot, "ebook-list.json", LIMIT).unwrap_err();
        assert!(matches!(err, Error::Archive(ref msg) if msg.contains("ebook-list.json")));
    }

    #[test]
    fn test_empty_archive() {
        let snapshot = zip_snapshot(&[]);
        let err = unpack_catalog(&snapshot, "ebook-list.json", LIMIT).unwrap_err();
        assert!(matches!(err, Error::Archive(ref msg) if msg.contains("empty")));
    }

    #[test]
    fn test_not_an_archive() {
        let err = unpack_catalog(b"not a zip", "ebook-list.json", LIMIT).unwrap_err();
        assert!(matches!(err, Error::Archive(_)));
    }

    #[test]
    fn test_entry_size_limit() {
        let snapshot = zip_snapshot(&[("ebook-list.json", &[b' '; 64])]);
        assert!(unpack_catalog(&snapshot, "ebook-list.json", 64).is_ok());

        let err = unpack_catalog(&snapshot, "ebook-list.json", 63).unwrap_err();
        assert!(matches!(err, Error::Archive(ref msg) if msg.contains("size limit")));
    }
}
