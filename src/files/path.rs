use crate::error::{GatewayError, GatewayResult};
use path_clean::PathClean;
use std::path::Path;

/// Lexically normalize an absolute POSIX path: collapse separators, drop `.`,
/// resolve `..` (never above `/`), strip any trailing slash.
pub fn normalize(path: &str) -> GatewayResult<String> {
    if path.is_empty() {
        return Err(GatewayError::validation("Path must not be empty"));
    }
    if path.contains('\0') {
        return Err(GatewayError::validation("Path must not contain NUL bytes"));
    }
    if !path.starts_with('/') {
        return Err(GatewayError::validation(format!(
            "Path must be absolute: {}",
            path
        )));
    }

    Ok(Path::new(path).clean().to_string_lossy().into_owned())
}

/// Normalize `path` and require it to sit at or below `allowed_root`,
/// comparing whole components (`/workspace2` is not inside `/workspace`).
pub fn validate_path(path: &str, allowed_root: &str) -> GatewayResult<String> {
    let resolved = normalize(path)?;
    let root = normalize(allowed_root)?;

    if !Path::new(&resolved).starts_with(Path::new(&root)) {
        return Err(GatewayError::validation(format!(
            "Path must be within {}",
            root
        )));
    }

    Ok(resolved)
}

/// Last path segment, or the path itself for `/`.
pub fn file_name(path: &str) -> &str {
    match path.trim_end_matches('/').rsplit('/').next() {
        Some(name) if !name.is_empty() => name,
        _ => path,
    }
}

/// `path` minus its final segment; `/` is its own parent.
pub fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &path[..idx],
    }
}
