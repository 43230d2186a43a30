//! Composite `sh -c` strings used by both executors.
//!
//! The env file is only sourced behind `[ -f ]`: dash aborts the whole shell
//! on `. <missing-file>`, even with stderr redirected.

use std::borrow::Cow;

pub fn quote(value: &str) -> Cow<'_, str> {
    shell_escape::unix::escape(Cow::Borrowed(value))
}

/// Export everything the env file assigns, then stop exporting.
pub fn env_prelude(env_file: &str) -> String {
    let env_file = quote(env_file);
    format!("set -a; [ -f {env_file} ] && . {env_file}; set +a; ")
}

pub fn command_line(env_file: &str, workdir: &str, command: &str) -> String {
    format!("{}cd {} && {}", env_prelude(env_file), quote(workdir), command)
}

/// Runs the script, removes it whatever the interpreter does, and re-exits
/// with the interpreter's status.
pub fn script_line(env_file: &str, workdir: &str, interpreter: &str, script_path: &str) -> String {
    let script = quote(script_path);
    format!(
        "{}cd {} && {} {}; _exit=$?; rm -f {}; exit $_exit",
        env_prelude(env_file),
        quote(workdir),
        interpreter,
        script,
        script
    )
}

pub fn sh_argv(composite: String) -> Vec<String> {
    vec!["sh".to_string(), "-c".to_string(), composite]
}

/// Join a file name onto a POSIX directory path.
pub fn join_posix(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    format!("{}/{}", dir, name)
}
