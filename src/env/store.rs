use crate::error::{GatewayError, GatewayResult};
use parking_lot::Mutex;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::info;

pub type EnvMap = BTreeMap<String, String>;

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"))
}

/// Characters `sh` acts on inside an unquoted `KEY=VALUE` assignment
const SHELL_ACTIVE: &[char] = &[';', '&', '|', '$', '`', '\'', '"', '<', '>', '(', ')', '\\'];

/// Names must be assignable by `sh`. Values are written unquoted, so they must
/// be a single word with nothing the shell would expand or execute.
pub fn validate_entry(name: &str, value: &str) -> GatewayResult<()> {
    if !name_pattern().is_match(name) {
        return Err(GatewayError::validation(format!(
            "Invalid variable name '{}': must match [A-Za-z_][A-Za-z0-9_]*",
            name
        )));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(GatewayError::validation(format!(
            "Value for '{}' must not contain whitespace",
            name
        )));
    }
    if let Some(c) = value.chars().find(|c| SHELL_ACTIVE.contains(c)) {
        return Err(GatewayError::validation(format!(
            "Value for '{}' must not contain shell character '{}'",
            name, c
        )));
    }
    Ok(())
}

/// Parse `KEY=VALUE` records. Blank lines, `#` comments and lines without `=`
/// are skipped; only the first `=` splits.
pub fn parse_env(content: &str) -> EnvMap {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter_map(|l| l.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

pub fn render_env(env: &EnvMap) -> String {
    env.iter().map(|(k, v)| format!("{}={}\n", k, v)).collect()
}

/// The env file shared with the sandbox container.
///
/// The file is the only source of truth; nothing is cached between calls.
pub struct EnvStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl EnvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> GatewayResult<EnvMap> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(parse_env(&content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(EnvMap::new()),
            Err(e) => Err(GatewayError::storage("read env file", e)),
        }
    }

    /// Replace the whole file. The snapshot is written next to the target and
    /// renamed over it, so readers see either the old or the new content.
    pub fn write(&self, env: &EnvMap) -> GatewayResult<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|e| GatewayError::storage("create env dir", e))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&parent)
            .map_err(|e| GatewayError::storage("write env file", e))?;
        tmp.write_all(render_env(env).as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| GatewayError::storage("write env file", e))?;

        // Temp files start as 0600; the sandbox user has to be able to source it
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o644))
                .map_err(|e| GatewayError::storage("write env file", e))?;
        }

        tmp.persist(&self.path)
            .map_err(|e| GatewayError::storage("write env file", e.error))?;

        Ok(())
    }

    fn update<F>(&self, mutate: F) -> GatewayResult<EnvMap>
    where
        F: FnOnce(&mut EnvMap) -> GatewayResult<()>,
    {
        let _guard = self.write_lock.lock();
        let mut env = self.read()?;
        mutate(&mut env)?;
        self.write(&env)?;
        Ok(env)
    }

    pub fn set(&self, name: &str, value: &str) -> GatewayResult<EnvMap> {
        validate_entry(name, value)?;
        let env = self.update(|env| {
            env.insert(name.to_string(), value.to_string());
            Ok(())
        })?;
        info!("Set env var: {}", name);
        Ok(env)
    }

    pub fn delete(&self, name: &str) -> GatewayResult<EnvMap> {
        let env = self.update(|env| {
            env.remove(name)
                .map(|_| ())
                .ok_or_else(|| GatewayError::not_found(format!("Variable '{}' not found", name)))
        })?;
        info!("Deleted env var: {}", name);
        Ok(env)
    }

    pub fn bulk_set(&self, variables: &HashMap<String, String>) -> GatewayResult<EnvMap> {
        for (name, value) in variables {
            validate_entry(name, value)?;
        }
        let env = self.update(|env| {
            env.extend(variables.iter().map(|(k, v)| (k.clone(), v.clone())));
            Ok(())
        })?;
        info!("Bulk set {} env var(s)", variables.len());
        Ok(env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        let env = parse_env("# managed\n\nFOO=bar\n  BAZ = qux \nnoequals\n");
        assert_eq!(env.len(), 2);
        assert_eq!(env["FOO"], "bar");
        assert_eq!(env["BAZ"], "qux");
    }

    #[test]
    fn test_parse_splits_on_first_equals() {
        let env = parse_env("URL=postgres://u:p@h/db?sslmode=require\n");
        assert_eq!(env["URL"], "postgres://u:p@h/db?sslmode=require");
    }

    #[test]
    fn test_render_is_key_sorted_with_trailing_newline() {
        let mut env = EnvMap::new();
        env.insert("ZED".into(), "1".into());
        env.insert("ALPHA".into(), "2".into());
        assert_eq!(render_env(&env), "ALPHA=2\nZED=1\n");
    }

    #[test]
    fn test_read_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = EnvStore::new(dir.path().join("absent/.env"));
        assert!(store.read().unwrap().is_empty());
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let store = EnvStore::new(dir.path().join("nested/sandbox-env/.env"));
        store.set("FOO", "bar").unwrap();
        let content = fs::read_to_string(store.path()).unwrap();
        assert_eq!(content, "FOO=bar\n");
    }

    #[test]
    fn test_set_replaces_existing_value() {
        let dir = tempdir().unwrap();
        let store = EnvStore::new(dir.path().join(".env"));
        store.set("FOO", "one").unwrap();
        let env = store.set("FOO", "two").unwrap();
        assert_eq!(env.len(), 1);
        assert_eq!(store.read().unwrap()["FOO"], "two");
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let store = EnvStore::new(dir.path().join(".env"));
        let err = store.delete("NOPE").unwrap_err();
        assert!(matches!(err, GatewayError::NotFound { .. }));
        assert!(!store.path().exists());
    }

    #[test]
    fn test_bulk_set_merges() {
        let dir = tempdir().unwrap();
        let store = EnvStore::new(dir.path().join(".env"));
        store.set("KEEP", "1").unwrap();
        let vars: HashMap<String, String> = [("B".to_string(), "2".to_string()), ("A".to_string(), "3".to_string())]
            .into_iter()
            .collect();
        store.bulk_set(&vars).unwrap();
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "A=3\nB=2\nKEEP=1\n");
    }

    #[test]
    fn test_invalid_entries_rejected_before_write() {
        let dir = tempdir().unwrap();
        let store = EnvStore::new(dir.path().join(".env"));
        assert!(matches!(
            store.set("1BAD", "x").unwrap_err(),
            GatewayError::Validation { .. }
        ));
        assert!(matches!(
            store.set("GOOD", "two\nlines").unwrap_err(),
            GatewayError::Validation { .. }
        ));
        assert!(!store.path().exists());
    }

    #[test]
    fn test_shell_active_values_rejected() {
        let rejected = [
            "two\nlines",
            "a\rb",
            "a b",
            "tab\there",
            "hello;touch",
            "a&b",
            "a|b",
            "$HOME",
            "`id`",
            "it's",
            "say\"hi\"",
            "a<b",
            "a>b",
            "(sub)",
            "back\\slash",
        ];
        for value in rejected {
            assert!(
                matches!(
                    validate_entry("FOO", value).unwrap_err(),
                    GatewayError::Validation { .. }
                ),
                "{:?}",
                value
            );
        }
    }

    #[test]
    fn test_plain_values_accepted() {
        for value in ["", "bar", "x=y", "postgres://u:p@h/db?sslmode=require", "a,b:c/d-e_f.g+h"] {
            assert!(validate_entry("FOO", value).is_ok(), "{:?}", value);
        }
    }

    #[test]
    fn test_concurrent_sets_in_process_all_survive() {
        let dir = tempdir().unwrap();
        let store = std::sync::Arc::new(EnvStore::new(dir.path().join(".env")));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || store.set(&format!("VAR_{}", i), "x").unwrap())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.read().unwrap().len(), 8);
    }
}
