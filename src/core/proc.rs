//! The burrow process module.
//!
//! Every external program burrow starts goes through the [Dispatcher]. Command lines
//! are built with [ShellLine] and run as `sh -c <line>`. While a child owns the
//! terminal, the [TerminalDriver] is suspended and it is resumed by a guard, so the
//! UI comes back on every path out of the child, failed ones included.
//!
//! The dispatcher also owns the process-wide bits: the registry of temp files used to
//! read results back from children and the tracked tmux pane.
//!
//! Flows built on top of the primitives:
//! - [Dispatcher::fuzzy_select_path]: `find | sed | fzf` in the current directory.
//! - [Dispatcher::grep_select_line]: `nl | fzf` over one file, result via a temp file.
//! - [Dispatcher::toggle_terminal]: open or close the tracked tmux pane.

use crate::core::mux::{Multiplexer, PaneTracker, SplitSide, probe_confirms};
use crate::core::quote::{QuoteError, ShellLine, ToolCommand};
use crate::core::terminal::{Suspended, TerminalDriver};

use log::{debug, error, warn};
use thiserror::Error;

use std::ffi::{OsStr, OsString};
use std::fs;
use std::io::{self, BufRead, BufReader};
use std::os::unix::ffi::OsStringExt;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

/// Upper bound on temp files alive at the same time.
pub const MAX_TEMP_FILES: usize = 32;

pub const EDITOR_ENV: &str = "EDITOR";
pub const PAGER_ENV: &str = "PAGER";
pub const FINDER_ENV: &str = "BW_FINDER";

const SHELL: &str = "sh";
/// Exit status the shell uses for "command not found".
const NOT_FOUND_CODE: i32 = 127;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Quote(#[from] QuoteError),
    #[error("{0} was not found in PATH. Please install {0}")]
    ToolNotFound(String),
    #[error("Command failed ({code}). Tried: {command}")]
    Failed { code: i32, command: String },
    #[error("Failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("Terminal error: {0}")]
    Terminal(#[source] io::Error),
    #[error("Temp file error: {0}")]
    TempFile(#[source] io::Error),
    #[error("Too many temp files in use ({MAX_TEMP_FILES})")]
    RegistryFull,
    #[error("Not running inside tmux")]
    NoMultiplexer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Editor,
    Pager,
    Finder,
}

impl ToolKind {
    pub fn env_var(self) -> &'static str {
        match self {
            ToolKind::Editor => EDITOR_ENV,
            ToolKind::Pager => PAGER_ENV,
            ToolKind::Finder => FINDER_ENV,
        }
    }
}

/// Tools used when the environment variable is unset or blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDefaults {
    pub editor: String,
    pub pager: String,
    pub finder: String,
}

impl Default for ToolDefaults {
    fn default() -> Self {
        Self {
            editor: "vi".to_string(),
            pager: "less -R".to_string(),
            finder: "fzf".to_string(),
        }
    }
}

impl ToolDefaults {
    pub fn fallback(&self, kind: ToolKind) -> &str {
        match kind {
            ToolKind::Editor => &self.editor,
            ToolKind::Pager => &self.pager,
            ToolKind::Finder => &self.finder,
        }
    }
}

/// How a child finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildReport {
    code: i32,
    command: String,
    tool: String,
}

impl ChildReport {
    fn new(status: ExitStatus, line: &ShellLine, tool: &str) -> Self {
        Self {
            code: exit_code(status),
            command: line.to_string(),
            tool: tool.to_string(),
        }
    }

    #[inline]
    pub fn code(&self) -> i32 {
        self.code
    }

    #[inline]
    pub fn command(&self) -> &str {
        &self.command
    }

    #[inline]
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Turns a non-zero exit into the matching [DispatchError].
    pub fn check(self) -> Result<Self, DispatchError> {
        match self.code {
            0 => Ok(self),
            NOT_FOUND_CODE => Err(DispatchError::ToolNotFound(self.tool)),
            code => Err(DispatchError::Failed {
                code,
                command: self.command,
            }),
        }
    }
}

/// Temp files handed to children, unlinked again on release or drain.
#[derive(Debug, Default)]
pub struct TempFileRegistry {
    paths: Vec<PathBuf>,
}

impl TempFileRegistry {
    /// Creates an empty file in the system temp dir and records it.
    pub fn create(&mut self, prefix: &str) -> Result<PathBuf, DispatchError> {
        if self.paths.len() >= MAX_TEMP_FILES {
            return Err(DispatchError::RegistryFull);
        }
        let file = tempfile::Builder::new()
            .prefix(prefix)
            .tempfile()
            .map_err(DispatchError::TempFile)?;
        let path = file
            .into_temp_path()
            .keep()
            .map_err(|e| DispatchError::TempFile(e.error))?;
        self.paths.push(path.clone());
        Ok(path)
    }

    /// Unlinks `path` and stops tracking it.
    pub fn release(&mut self, path: &Path) {
        if let Some(pos) = self.paths.iter().position(|p| p == path) {
            let path = self.paths.swap_remove(pos);
            remove_temp(&path);
        }
    }

    /// Unlinks every tracked file. Returns how many were tracked.
    pub fn drain(&mut self) -> usize {
        let count = self.paths.len();
        for path in self.paths.drain(..) {
            remove_temp(&path);
        }
        count
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl Drop for TempFileRegistry {
    fn drop(&mut self) {
        self.drain();
    }
}

fn remove_temp(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => error!("failed to remove temp file {}: {}", path.display(), e),
    }
}

/// Result of [Dispatcher::toggle_terminal].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneToggle {
    Opened,
    Closed,
}

pub struct Dispatcher {
    defaults: ToolDefaults,
    driver: Box<dyn TerminalDriver>,
    mux: Multiplexer,
    pane: PaneTracker,
    temp_files: TempFileRegistry,
}

impl Dispatcher {
    pub fn new(defaults: ToolDefaults, driver: Box<dyn TerminalDriver>, mux: Multiplexer) -> Self {
        Self {
            defaults,
            driver,
            mux,
            pane: PaneTracker::default(),
            temp_files: TempFileRegistry::default(),
        }
    }

    /// Resolves a tool from its environment variable, falling back to the configured default.
    pub fn resolve(&self, kind: ToolKind) -> Result<ToolCommand, DispatchError> {
        Ok(ToolCommand::from_env(
            kind.env_var(),
            self.defaults.fallback(kind),
        )?)
    }

    /// Runs `tool args...` in the foreground and reports how it exited.
    pub fn run<S: AsRef<OsStr>>(
        &mut self,
        tool: &ToolCommand,
        args: &[S],
    ) -> Result<ChildReport, DispatchError> {
        let line = command_line(tool, args)?;
        self.execute(&line, tool.program().as_str())
    }

    /// Runs `tool args...` in a new tmux split next to burrow, or in the foreground
    /// when there is no multiplexer.
    pub fn run_in_split<S: AsRef<OsStr>>(
        &mut self,
        tool: &ToolCommand,
        args: &[S],
        side: SplitSide,
        cwd: &Path,
    ) -> Result<ChildReport, DispatchError> {
        if !self.mux.is_available() {
            return self.run(tool, args);
        }
        let inner = command_line(tool, args)?;
        let line = self.mux.split_line(side, cwd, Some(&inner), false)?;
        let (status, _) = self.control(&line)?;
        Ok(ChildReport::new(status, &line, self.mux.program().as_str()))
    }

    /// Runs `line` with the terminal handed over and returns the first line it prints.
    ///
    /// The rest of the output is discarded. A missing or empty first line is `None`,
    /// so is any exit of the child other than "not found".
    pub fn capture_single_line(
        &mut self,
        line: &ShellLine,
        tool: &str,
    ) -> Result<Option<OsString>, DispatchError> {
        debug!("capture: {}", line);
        let _suspended = Suspended::new(self.driver.as_mut()).map_err(DispatchError::Terminal)?;

        let mut child = shell(line)
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|source| spawn_error(line, source))?;

        let mut first = Vec::new();
        let read = match child.stdout.take() {
            Some(stdout) => BufReader::new(stdout).read_until(b'\n', &mut first),
            None => Ok(0),
        };
        let status = child.wait().map_err(|source| spawn_error(line, source))?;
        read.map_err(|source| spawn_error(line, source))?;

        if exit_code(status) == NOT_FOUND_CODE {
            return Err(DispatchError::ToolNotFound(tool.to_string()));
        }
        Ok(first_line(first))
    }

    /// Lets the user pick a path below `cwd` (depth 5) with the finder.
    ///
    /// Returns the picked path joined onto `cwd`.
    pub fn fuzzy_select_path(&mut self, cwd: &Path) -> Result<Option<PathBuf>, DispatchError> {
        let finder = self.resolve(ToolKind::Finder)?;
        ensure_available(&finder)?;

        let mut line = ShellLine::new();
        line.literal("cd")?
            .arg(cwd)?
            .literal("&& find . -mindepth 1 -maxdepth 5 2>/dev/null | sed")?
            .arg(r"s#^\./##")?
            .literal("|")?
            .tool(&finder)?
            .arg("--prompt=Search> ")?
            .literal("--height=40% --reverse")?;

        let picked = self.capture_single_line(&line, finder.program().as_str())?;
        Ok(picked.map(|rel| cwd.join(rel)))
    }

    /// Lets the user pick a line of `file` with the finder. Returns its 1-based number.
    pub fn grep_select_line(&mut self, file: &Path) -> Result<Option<usize>, DispatchError> {
        let finder = self.resolve(ToolKind::Finder)?;
        ensure_available(&finder)?;

        let out = self.temp_files.create("bw-line-")?;
        let res = self.pick_line_into(&finder, file, &out);
        self.temp_files.release(&out);
        res
    }

    fn pick_line_into(
        &mut self,
        finder: &ToolCommand,
        file: &Path,
        out: &Path,
    ) -> Result<Option<usize>, DispatchError> {
        let mut line = ShellLine::new();
        line.literal("nl -ba <")?
            .arg(file)?
            .literal("|")?
            .tool(finder)?
            .arg("--prompt=Line> ")?
            .literal("--reverse >")?
            .arg(out)?;

        let report = self.execute(&line, finder.program().as_str())?;
        if report.code() == NOT_FOUND_CODE {
            return Err(DispatchError::ToolNotFound(finder.program().to_string()));
        }
        let picked = fs::read(out).map_err(DispatchError::TempFile)?;
        Ok(parse_line_number(&picked))
    }

    /// Closes the tracked tmux pane if it is still alive, otherwise opens a new one in `cwd`.
    pub fn toggle_terminal(&mut self, cwd: &Path) -> Result<PaneToggle, DispatchError> {
        if !self.mux.is_available() {
            return Err(DispatchError::NoMultiplexer);
        }

        if let Some(id) = self.pane.forget() {
            let probe = self.mux.probe_line(&id)?;
            let (_, answer) = self.control(&probe)?;
            let answer = answer.map(|a| a.to_string_lossy().into_owned());
            if probe_confirms(&id, answer.as_deref()) {
                let kill = self.mux.kill_line(&id)?;
                let (status, _) = self.control(&kill)?;
                if !status.success() {
                    warn!("kill-pane {} exited with {}", id, exit_code(status));
                }
                return Ok(PaneToggle::Closed);
            }
            debug!("tracked pane {} is gone", id);
        }

        let split = self.mux.split_line(SplitSide::Below, cwd, None, true)?;
        let (status, answer) = self.control(&split)?;
        ChildReport::new(status, &split, self.mux.program().as_str()).check()?;

        match answer.map(|a| a.to_string_lossy().trim().to_string()) {
            Some(id) if !id.is_empty() => self.pane.track(id),
            _ => warn!("tmux did not report a pane id for the new split"),
        }
        Ok(PaneToggle::Opened)
    }

    /// Unlinks all registered temp files.
    pub fn cleanup(&mut self) {
        let n = self.temp_files.drain();
        if n > 0 {
            debug!("removed {} temp files", n);
        }
    }

    /// Runs `line` in the foreground with the terminal handed over.
    fn execute(&mut self, line: &ShellLine, tool: &str) -> Result<ChildReport, DispatchError> {
        debug!("run: {}", line);
        let _suspended = Suspended::new(self.driver.as_mut()).map_err(DispatchError::Terminal)?;
        let status = shell(line)
            .status()
            .map_err(|source| spawn_error(line, source))?;
        Ok(ChildReport::new(status, line, tool))
    }

    /// Runs a multiplexer control command. It never reads the terminal, so the UI stays up.
    fn control(&self, line: &ShellLine) -> Result<(ExitStatus, Option<OsString>), DispatchError> {
        debug!("control: {}", line);
        let output = shell(line)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|source| spawn_error(line, source))?;
        Ok((output.status, first_line(output.stdout)))
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// `tool [tool args] args...`
pub fn command_line<S: AsRef<OsStr>>(
    tool: &ToolCommand,
    args: &[S],
) -> Result<ShellLine, QuoteError> {
    let mut line = ShellLine::new();
    line.tool(tool)?;
    for arg in args {
        line.arg(arg)?;
    }
    Ok(line)
}

/// Parses the leading line number `nl` put in front of a picked line.
pub fn parse_line_number(picked: &[u8]) -> Option<usize> {
    let start = picked.iter().position(|b| !b.is_ascii_whitespace())?;
    let digits = &picked[start..];
    let end = digits
        .iter()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    std::str::from_utf8(&digits[..end])
        .ok()?
        .parse::<usize>()
        .ok()
        .filter(|&n| n > 0)
}

fn ensure_available(tool: &ToolCommand) -> Result<(), DispatchError> {
    match which::which(tool.program().as_str()) {
        Ok(_) => Ok(()),
        Err(_) => Err(DispatchError::ToolNotFound(tool.program().to_string())),
    }
}

fn shell(line: &ShellLine) -> Command {
    let mut cmd = Command::new(SHELL);
    cmd.arg("-c").arg(line.to_os_string());
    cmd
}

fn spawn_error(line: &ShellLine, source: io::Error) -> DispatchError {
    DispatchError::Spawn {
        command: line.to_string(),
        source,
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(-1)
}

fn first_line(mut bytes: Vec<u8>) -> Option<OsString> {
    if let Some(end) = bytes.iter().position(|&b| b == b'\n') {
        bytes.truncate(end);
    }
    if bytes.last() == Some(&b'\r') {
        bytes.pop();
    }
    if bytes.is_empty() {
        None
    } else {
        Some(OsString::from_vec(bytes))
    }
}

/// Integration tests for proc
#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::terminal::NullDriver;

    use std::cell::Cell;
    use std::rc::Rc;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(
            ToolDefaults::default(),
            Box::new(NullDriver),
            Multiplexer::with_availability(false),
        )
    }

    /// Counts suspend/resume calls.
    struct CountingDriver {
        suspended: Rc<Cell<u32>>,
        resumed: Rc<Cell<u32>>,
    }

    impl TerminalDriver for CountingDriver {
        fn suspend(&mut self) -> io::Result<()> {
            self.suspended.set(self.suspended.get() + 1);
            Ok(())
        }

        fn resume(&mut self) -> io::Result<()> {
            self.resumed.set(self.resumed.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn capture_reads_only_the_first_line() -> Result<(), Box<dyn std::error::Error>> {
        let mut d = dispatcher();
        let mut line = ShellLine::new();
        line.literal("printf")?.arg(r"first\nsecond\n")?;
        let got = d.capture_single_line(&line, "printf")?;
        assert_eq!(got, Some(OsString::from("first")));
        Ok(())
    }

    #[test]
    fn capture_without_output_is_none() -> Result<(), Box<dyn std::error::Error>> {
        let mut d = dispatcher();
        let mut line = ShellLine::new();
        line.literal("true")?;
        assert_eq!(d.capture_single_line(&line, "true")?, None);

        let mut line = ShellLine::new();
        line.literal("exit 1")?;
        assert_eq!(d.capture_single_line(&line, "sh")?, None);
        Ok(())
    }

    #[test]
    fn missing_tool_is_reported_as_not_found() -> Result<(), Box<dyn std::error::Error>> {
        let mut d = dispatcher();
        let tool = ToolCommand::parse("bw-test-no-such-tool")?;
        let report = d.run(&tool, &["x"])?;
        assert_eq!(report.code(), NOT_FOUND_CODE);
        match report.check() {
            Err(DispatchError::ToolNotFound(name)) => assert_eq!(name, "bw-test-no-such-tool"),
            other => panic!("expected ToolNotFound, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn failed_child_reports_code_and_command() -> Result<(), Box<dyn std::error::Error>> {
        let mut d = dispatcher();
        let mut line = ShellLine::new();
        line.literal("exit 3")?;
        let report = d.execute(&line, "sh")?;
        assert_eq!(report.code(), 3);
        match report.check() {
            Err(e @ DispatchError::Failed { .. }) => {
                assert_eq!(e.to_string(), "Command failed (3). Tried: exit 3");
            }
            other => panic!("expected Failed, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn arguments_reach_the_child_unchanged() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let name = "it's a $(weird) `name`; rm -rf *";
        let target = dir.path().join(name);

        let mut d = dispatcher();
        let tool = ToolCommand::parse("touch")?;
        d.run(&tool, &[target.as_os_str()])?.check()?;
        assert!(target.is_file());
        assert_eq!(fs::read_dir(dir.path())?.count(), 1);
        Ok(())
    }

    #[test]
    fn terminal_is_resumed_after_failure() -> Result<(), Box<dyn std::error::Error>> {
        let suspended = Rc::new(Cell::new(0));
        let resumed = Rc::new(Cell::new(0));
        let driver = CountingDriver {
            suspended: Rc::clone(&suspended),
            resumed: Rc::clone(&resumed),
        };
        let mut d = Dispatcher::new(
            ToolDefaults::default(),
            Box::new(driver),
            Multiplexer::with_availability(false),
        );

        let tool = ToolCommand::parse("bw-test-no-such-tool")?;
        let res = d.run(&tool, &[] as &[&str])?.check();
        assert!(res.is_err());
        assert_eq!(suspended.get(), 1);
        assert_eq!(resumed.get(), 1);
        Ok(())
    }

    #[test]
    fn split_without_multiplexer_runs_in_foreground() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let target = dir.path().join("made-by-split");
        let mut d = dispatcher();
        let tool = ToolCommand::parse("touch")?;
        d.run_in_split(&tool, &[target.as_os_str()], SplitSide::Right, dir.path())?
            .check()?;
        assert!(target.exists());
        assert!(matches!(
            d.toggle_terminal(dir.path()),
            Err(DispatchError::NoMultiplexer)
        ));
        Ok(())
    }

    #[test]
    fn registry_is_bounded_and_drains() -> Result<(), Box<dyn std::error::Error>> {
        let mut reg = TempFileRegistry::default();
        let mut made = Vec::new();
        for _ in 0..MAX_TEMP_FILES {
            made.push(reg.create("bw-test-")?);
        }
        assert!(matches!(reg.create("bw-test-"), Err(DispatchError::RegistryFull)));
        assert!(made.iter().all(|p| p.exists()));

        reg.release(&made[0]);
        assert!(!made[0].exists());
        assert_eq!(reg.len(), MAX_TEMP_FILES - 1);

        assert_eq!(reg.drain(), MAX_TEMP_FILES - 1);
        assert!(made.iter().all(|p| !p.exists()));
        assert!(reg.is_empty());
        Ok(())
    }

    #[test]
    fn dropping_the_dispatcher_removes_temp_files() -> Result<(), Box<dyn std::error::Error>> {
        let mut d = dispatcher();
        let path = d.temp_files.create("bw-test-")?;
        assert!(path.exists());
        drop(d);
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn line_numbers_from_nl_output() {
        assert_eq!(parse_line_number(b"    42\tfn main() {\n"), Some(42));
        assert_eq!(parse_line_number(b"7\t"), Some(7));
        assert_eq!(parse_line_number(b"\tno number"), None);
        assert_eq!(parse_line_number(b""), None);
        assert_eq!(parse_line_number(b"0\tzero"), None);
    }

    #[test]
    fn first_line_trims_newline_and_cr() {
        assert_eq!(first_line(b"a\r\nb".to_vec()), Some(OsString::from("a")));
        assert_eq!(first_line(b"\nb".to_vec()), None);
        assert_eq!(first_line(Vec::new()), None);
    }

    #[test]
    fn defaults_parse_as_tools() -> Result<(), QuoteError> {
        let defaults = ToolDefaults::default();
        for kind in [ToolKind::Editor, ToolKind::Pager, ToolKind::Finder] {
            ToolCommand::parse(defaults.fallback(kind))?;
        }
        assert_eq!(ToolKind::Finder.env_var(), "BW_FINDER");
        Ok(())
    }
}
