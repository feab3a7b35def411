//! Applying planned keepfile actions.
//!
//! For each action the executor optionally asks for confirmation, prints the
//! report line, touches the filesystem (unless dry-run) and then runs the
//! hooks for that action kind. Hooks run in dry-run mode too.

use crate::config::HookList;
use crate::error::Result;
use crate::output::OutputFormatter;
use crate::plan::{ActionKind, ActionRecord};
use crate::shell::{CommandRunner, shell_escape};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Source of confirmation answers, one line at a time.
///
/// `Ok(None)` means end of input.
pub trait LineSource {
    fn next_line(&mut self) -> io::Result<Option<String>>;
}

impl<B: BufRead> LineSource for B {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}

/// Whether the walk should keep going after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// The user declined or closed the input; nothing more is done.
    Halt,
}

/// Tally of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub created: usize,
    pub deleted: usize,
    /// Keepfile creates/deletes that failed on the filesystem.
    pub failures: usize,
    /// Hooks that could not start or exited non-zero.
    pub hook_failures: usize,
    /// Set when an interactive answer stopped the run early.
    pub halted: bool,
}

impl RunReport {
    /// Returns true when every attempted keepfile change went through.
    pub fn is_success(&self) -> bool {
        self.failures == 0
    }
}

/// Builds the command line for one hook.
///
/// With a replace token, its first occurrence is replaced by the path as-is,
/// so the template controls any quoting around it, and a template without
/// the token runs unchanged. Without a token the path is shell-quoted and
/// appended as the last argument.
pub fn render_hook(template: &str, path: &Path, replace: Option<&str>) -> String {
    let path = path.to_string_lossy();
    match replace {
        Some(token) if template.contains(token) => template.replacen(token, &path, 1),
        Some(_) => template.to_string(),
        None => format!("{} {}", template, shell_escape(&path)),
    }
}

/// Settings the executor reads on every action.
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    pub dry_run: bool,
    pub quiet: bool,
    pub interactive: bool,
    pub replace: Option<String>,
    pub hooks: HookList,
}

/// Applies [`ActionRecord`]s in order.
///
/// Report lines, prompts and hook output all go to `out`, so their relative
/// order is exactly the order things happened.
pub struct ActionExecutor<'a, R, L, W> {
    options: &'a ExecOptions,
    runner: &'a R,
    input: L,
    out: W,
    report: RunReport,
}

impl<'a, R, L, W> ActionExecutor<'a, R, L, W>
where
    R: CommandRunner,
    L: LineSource,
    W: Write,
{
    pub fn new(options: &'a ExecOptions, runner: &'a R, input: L, out: W) -> Self {
        Self {
            options,
            runner,
            input,
            out,
            report: RunReport::default(),
        }
    }

    /// Runs one action.
    ///
    /// Filesystem and hook failures are reported and counted but do not stop
    /// the run. Once this returns [`Flow::Halt`] the caller must not pass any
    /// more actions.
    ///
    /// # Errors
    ///
    /// Returns an error when writing to `out` or reading the confirmation
    /// input fails.
    pub fn execute(&mut self, action: &ActionRecord) -> Result<Flow> {
        if self.report.halted {
            return Ok(Flow::Halt);
        }

        if self.options.interactive && !self.confirm(action)? {
            self.report.halted = true;
            return Ok(Flow::Halt);
        }

        if !self.options.quiet {
            writeln!(self.out, "{} {}", action.kind, action.path.display())?;
            self.out.flush()?;
        }

        if !self.options.dry_run
            && let Err(e) = apply(action)
        {
            OutputFormatter::error(&format!(
                "Failed to {} {}: {}",
                action.kind,
                action.path.display(),
                e
            ));
            self.report.failures += 1;
            return Ok(Flow::Continue);
        }

        match action.kind {
            ActionKind::Create => self.report.created += 1,
            ActionKind::Delete => self.report.deleted += 1,
        }
        tracing::info!(
            "{} {}{}",
            action.kind,
            action.path.display(),
            if self.options.dry_run { " (dry run)" } else { "" }
        );

        self.run_hooks(action)?;
        Ok(Flow::Continue)
    }

    /// Prompts and reads one answer. Only `y` or `Y` accepts.
    fn confirm(&mut self, action: &ActionRecord) -> Result<bool> {
        write!(self.out, "{} {}? ", action.kind, action.path.display())?;
        self.out.flush()?;

        match self.input.next_line()? {
            Some(answer) => {
                let answer = answer.trim();
                let accepted = answer == "y" || answer == "Y";
                if !accepted {
                    tracing::info!("declined {} {}, stopping", action.kind, action.path.display());
                }
                Ok(accepted)
            }
            None => {
                tracing::debug!("confirmation input closed");
                Ok(false)
            }
        }
    }

    fn run_hooks(&mut self, action: &ActionRecord) -> Result<()> {
        let replace = self.options.replace.as_deref();
        for template in self.options.hooks.for_kind(action.kind) {
            let command = render_hook(template, &action.path, replace);
            match self.runner.run(&command) {
                Ok(output) => {
                    self.out.write_all(&output.stdout)?;
                    self.out.flush()?;
                    if !output.success() {
                        OutputFormatter::warning(&format!(
                            "Hook '{}' exited with status {:?}",
                            command, output.code
                        ));
                        self.report.hook_failures += 1;
                    }
                }
                Err(e) => {
                    OutputFormatter::warning(&format!("Hook '{}' failed to start: {}", command, e));
                    self.report.hook_failures += 1;
                }
            }
        }
        Ok(())
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    pub fn into_report(self) -> RunReport {
        self.report
    }
}

fn apply(action: &ActionRecord) -> io::Result<()> {
    match action.kind {
        ActionKind::Create => fs::File::create(&action.path).map(drop),
        ActionKind::Delete => fs::remove_file(&action.path),
    }
}
