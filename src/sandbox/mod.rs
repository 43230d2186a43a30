use crate::runtime::ExecOutput;
use serde::Serialize;

pub mod code;
pub mod command;
pub mod shell;

pub use code::CodeExecutor;
pub use command::CommandExecutor;

/// Appended to a stream cut at the output limit
pub const TRUNCATION_MARKER: &str = "\n... [output truncated]";

/// Outcome of one command or script run. A non-zero exit code is a result,
/// not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    pub exit_code: Option<i64>,
    pub stdout: String,
    pub stderr: String,
    pub stdout_truncated: bool,
    pub stderr_truncated: bool,
}

impl ExecutionResult {
    pub fn from_output(output: ExecOutput, max_chars: usize) -> Self {
        let (stdout, stdout_truncated) =
            truncate_output(String::from_utf8_lossy(&output.stdout).into_owned(), max_chars);
        let (stderr, stderr_truncated) =
            truncate_output(String::from_utf8_lossy(&output.stderr).into_owned(), max_chars);

        Self {
            exit_code: output.exit_code,
            stdout,
            stderr,
            stdout_truncated,
            stderr_truncated,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Cut `text` to `max_chars` characters and append [`TRUNCATION_MARKER`].
pub fn truncate_output(mut text: String, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            text.truncate(cut);
            text.push_str(TRUNCATION_MARKER);
            (text, true)
        }
        None => (text, false),
    }
}
