//! tmux integration: command lines for splits and the tracked terminal pane.
//!
//! Only command construction lives here. Running the lines is up to the dispatcher.

use crate::core::quote::{QuoteError, ShellLine, ToolName};

use std::path::Path;

/// Environment variable tmux sets inside its panes.
pub const MUX_ENV: &str = "TMUX";
const MUX_PROGRAM: &str = "tmux";
const PANE_ID_FORMAT: &str = "#{pane_id}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitSide {
    Right,
    Below,
}

impl SplitSide {
    fn flag(self) -> &'static str {
        match self {
            SplitSide::Right => "-h",
            SplitSide::Below => "-v",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Multiplexer {
    program: ToolName,
    available: bool,
}

impl Multiplexer {
    /// Detects tmux from the environment.
    pub fn detect() -> Self {
        let available = std::env::var_os(MUX_ENV).is_some_and(|v| !v.is_empty());
        Self::with_availability(available)
    }

    pub fn with_availability(available: bool) -> Self {
        Self {
            program: ToolName::builtin(MUX_PROGRAM),
            available,
        }
    }

    #[inline]
    pub fn is_available(&self) -> bool {
        self.available
    }

    #[inline]
    pub fn program(&self) -> &ToolName {
        &self.program
    }

    /// `tmux split-window -h|-v -c <cwd> [-P -F '#{pane_id}'] <inner>`
    ///
    /// `inner` is passed as a single quoted argument; tmux hands it to the shell.
    pub fn split_line(
        &self,
        side: SplitSide,
        cwd: &Path,
        inner: Option<&ShellLine>,
        print_id: bool,
    ) -> Result<ShellLine, QuoteError> {
        let mut line = ShellLine::new();
        line.program(&self.program)?
            .literal("split-window")?
            .literal(side.flag())?
            .literal("-c")?
            .arg(cwd)?;
        if print_id {
            line.literal("-P")?.literal("-F")?.arg(PANE_ID_FORMAT)?;
        }
        if let Some(inner) = inner {
            line.arg(inner.to_os_string())?;
        }
        Ok(line)
    }

    /// Prints the pane id back when `pane_id` still denotes a live pane.
    pub fn probe_line(&self, pane_id: &str) -> Result<ShellLine, QuoteError> {
        let mut line = ShellLine::new();
        line.program(&self.program)?
            .literal("display-message")?
            .literal("-p")?
            .literal("-t")?
            .arg(pane_id)?
            .arg(PANE_ID_FORMAT)?;
        Ok(line)
    }

    pub fn kill_line(&self, pane_id: &str) -> Result<ShellLine, QuoteError> {
        let mut line = ShellLine::new();
        line.program(&self.program)?
            .literal("kill-pane")?
            .literal("-t")?
            .arg(pane_id)?;
        Ok(line)
    }
}

/// The one pane burrow opens and closes on toggle.
#[derive(Debug, Default)]
pub struct PaneTracker {
    pane_id: Option<String>,
}

impl PaneTracker {
    #[inline]
    pub fn pane_id(&self) -> Option<&str> {
        self.pane_id.as_deref()
    }

    pub fn track(&mut self, pane_id: String) {
        self.pane_id = Some(pane_id);
    }

    pub fn forget(&mut self) -> Option<String> {
        self.pane_id.take()
    }
}

/// Whether a probe answer confirms the pane is still alive.
pub fn probe_confirms(pane_id: &str, answer: Option<&str>) -> bool {
    answer.is_some_and(|a| a.trim() == pane_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn split_line_nests_inner_command() -> Result<(), Box<dyn std::error::Error>> {
        let mux = Multiplexer::with_availability(true);
        let mut inner = ShellLine::new();
        inner.literal("vi")?.arg("it's.txt")?;

        let line = mux.split_line(
            SplitSide::Right,
            &PathBuf::from("/tmp/a b"),
            Some(&inner),
            false,
        )?;
        let words = shlex::split(&line.to_string()).ok_or("unbalanced quotes")?;
        assert_eq!(
            words,
            ["tmux", "split-window", "-h", "-c", "/tmp/a b", r#"vi 'it'"'"'s.txt'"#]
        );
        Ok(())
    }

    #[test]
    fn probe_and_kill_target_the_pane() -> Result<(), QuoteError> {
        let mux = Multiplexer::with_availability(true);
        assert_eq!(
            mux.probe_line("%12")?.to_string(),
            "tmux display-message -p -t '%12' '#{pane_id}'"
        );
        assert_eq!(mux.kill_line("%12")?.to_string(), "tmux kill-pane -t '%12'");
        Ok(())
    }

    #[test]
    fn probe_answer_must_match() {
        assert!(probe_confirms("%3", Some("%3\n")));
        assert!(!probe_confirms("%3", Some("%30")));
        assert!(!probe_confirms("%3", None));
    }

    #[test]
    fn tracker_forgets() {
        let mut t = PaneTracker::default();
        t.track("%7".into());
        assert_eq!(t.pane_id(), Some("%7"));
        assert_eq!(t.forget().as_deref(), Some("%7"));
        assert_eq!(t.pane_id(), None);
    }
}
