//! Shell command capability.
//!
//! Exclude lists and hooks both need "run this command line, give me its
//! stdout and exit status". The reconciliation core only sees the
//! [`CommandRunner`] trait so tests can swap in a fake.

use std::io;
use std::process::{Command, Stdio};

/// Captured result of one command invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Raw standard output, byte for byte.
    pub stdout: Vec<u8>,
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
}

impl CommandOutput {
    /// Returns true when the command exited with status 0.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Splits stdout into lines, dropping the line terminators.
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.stdout)
            .lines()
            .map(str::to_string)
            .collect()
    }
}

/// Runs a command line and captures its standard output.
pub trait CommandRunner {
    /// Runs `command_line` to completion.
    ///
    /// # Errors
    ///
    /// Returns an error only when the command could not be started at all.
    /// A non-zero exit is reported through [`CommandOutput::code`].
    fn run(&self, command_line: &str) -> io::Result<CommandOutput>;
}

/// Runs command lines through `sh -c`.
///
/// The child gets a closed stdin so it can never consume confirmation
/// answers, and inherits stderr.
#[derive(Debug, Clone, Default)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, command_line: &str) -> io::Result<CommandOutput> {
        tracing::debug!("sh -c {}", command_line);
        let output = Command::new("sh")
            .arg("-c")
            .arg(command_line)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()?;

        Ok(CommandOutput {
            stdout: output.stdout,
            code: output.status.code(),
        })
    }
}

/// Simple shell escaping: wrap in single quotes, escape any existing single quotes.
pub fn shell_escape(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_escape_plain() {
        assert_eq!(shell_escape("/tmp/a b/.keep"), "'/tmp/a b/.keep'");
    }

    #[test]
    fn test_shell_escape_single_quote() {
        assert_eq!(shell_escape("it's"), "'it'\\''s'");
    }

    #[test]
    fn test_output_lines_and_status() {
        let output = CommandOutput {
            stdout: b"a/b\n/abs/c\n".to_vec(),
            code: Some(0),
        };
        assert!(output.success());
        assert_eq!(output.lines(), vec!["a/b".to_string(), "/abs/c".to_string()]);

        let failed = CommandOutput {
            stdout: Vec::new(),
            code: None,
        };
        assert!(!failed.success());
        assert!(failed.lines().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_runner_captures_stdout() {
        let output = ShellRunner.run("echo hello; exit 3").unwrap();
        assert_eq!(output.stdout, b"hello\n");
        assert_eq!(output.code, Some(3));
    }
}
