use super::path::validate_path;
use crate::error::{GatewayError, GatewayResult};
use crate::sandbox::{shell, CommandExecutor};
use tracing::warn;

/// Shell line printing the symlink-free form of `allowed_root` then `path`,
/// one per line. Only the final component of `path` may be missing.
pub fn readlink_command(allowed_root: &str, path: &str) -> String {
    format!(
        "readlink -f -- {} && readlink -f -- {}",
        shell::quote(allowed_root),
        shell::quote(path)
    )
}

/// Lexically validate `path`, then resolve symlinks inside the sandbox and
/// validate the real path against the real root. Returns the real path.
pub async fn resolve_within(
    commands: &CommandExecutor,
    path: &str,
    allowed_root: &str,
) -> GatewayResult<String> {
    let safe_path = validate_path(path, allowed_root)?;

    let result = commands
        .run(&readlink_command(allowed_root, &safe_path), None)
        .await?;
    let mut lines = result.stdout.lines().map(str::trim);

    let (real_root, real_path) = match (lines.next(), lines.next()) {
        (Some(root), Some(real)) if result.success() && !real.is_empty() => (root, real),
        _ => {
            return Err(GatewayError::not_found(format!(
                "File not found: {}",
                safe_path
            )))
        }
    };

    validate_path(real_path, real_root).map_err(|e| {
        warn!("{} resolves to {} outside {}", safe_path, real_path, real_root);
        e
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readlink_command_quotes_both_paths() {
        assert_eq!(
            readlink_command("/workspace", "/workspace/my file.txt"),
            "readlink -f -- /workspace && readlink -f -- '/workspace/my file.txt'"
        );
    }
}
