//! Tar helpers for the engine's archive transfer primitives.

use crate::error::{GatewayError, GatewayResult};
use std::io::{Cursor, Read};
use tar::{Archive, Builder, EntryType, Header};

/// Package `data` as a tar archive holding exactly one regular file.
pub fn single_file_archive(name: &str, data: &[u8]) -> GatewayResult<Vec<u8>> {
    let mut header = Header::new_gnu();
    header.set_entry_type(EntryType::Regular);
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(chrono::Utc::now().timestamp().max(0) as u64);

    let mut builder = Builder::new(Vec::new());
    builder
        .append_data(&mut header, name, data)
        .map_err(|e| GatewayError::transport("build archive", e))?;

    builder
        .into_inner()
        .map_err(|e| GatewayError::transport("build archive", e))
}

/// Contents of the first entry of `archive`.
///
/// Empty archives are `NotFound`; directories and links are `InvalidRequest`;
/// anything unreadable is `Transport`.
pub fn extract_first_file(archive: &[u8]) -> GatewayResult<Vec<u8>> {
    let mut archive = Archive::new(Cursor::new(archive));
    let mut entries = archive
        .entries()
        .map_err(|e| GatewayError::transport("read archive", format!("Tar extraction error: {}", e)))?;

    let mut entry = match entries.next() {
        Some(entry) => entry
            .map_err(|e| GatewayError::transport("read archive", format!("Tar extraction error: {}", e)))?,
        None => return Err(GatewayError::not_found("Archive is empty")),
    };

    let entry_type = entry.header().entry_type();
    if entry_type.is_dir() {
        return Err(GatewayError::invalid_request(
            "Path is a directory. Use /files/tree to browse.",
        ));
    }
    if entry_type.is_symlink() || entry_type.is_hard_link() {
        return Err(GatewayError::invalid_request("Path is a link, not a regular file"));
    }

    let mut data = Vec::with_capacity(entry.size() as usize);
    entry
        .read_to_end(&mut data)
        .map_err(|e| GatewayError::transport("read archive", format!("Tar extraction error: {}", e)))?;

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir_archive() -> Vec<u8> {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Directory);
        header.set_size(0);
        header.set_mode(0o755);
        let mut builder = Builder::new(Vec::new());
        builder
            .append_data(&mut header, "somedir/", std::io::empty())
            .unwrap();
        builder.into_inner().unwrap()
    }

    #[test]
    fn test_single_file_archive_has_one_entry() {
        let archive = single_file_archive("_llm_run_abc.py", b"print('hi')\n").unwrap();
        let mut reader = Archive::new(Cursor::new(archive));
        let names: Vec<String> = reader
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["_llm_run_abc.py".to_string()]);
    }

    #[test]
    fn test_extract_returns_file_bytes() {
        let archive = single_file_archive("notes.txt", b"line one\nline two\n").unwrap();
        assert_eq!(extract_first_file(&archive).unwrap(), b"line one\nline two\n");
    }

    #[test]
    fn test_extract_rejects_directory() {
        let err = extract_first_file(&dir_archive()).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidRequest { .. }));
    }

    #[test]
    fn test_extract_empty_archive_is_not_found() {
        let empty = Builder::new(Vec::new()).into_inner().unwrap();
        let err = extract_first_file(&empty).unwrap_err();
        assert!(matches!(err, GatewayError::NotFound { .. }));
    }

    #[test]
    fn test_extract_rejects_symlink() {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Symlink);
        header.set_size(0);
        let mut builder = Builder::new(Vec::new());
        builder
            .append_link(&mut header, "passwd", "/etc/passwd")
            .unwrap();
        let archive = builder.into_inner().unwrap();
        let err = extract_first_file(&archive).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidRequest { .. }));
    }
}
