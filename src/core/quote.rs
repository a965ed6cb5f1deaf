//! Shell quoting for every command line burrow hands to `sh -c`.
//!
//! Paths and filenames enter a command line only through [ShellLine::arg], which wraps
//! the raw bytes in single quotes. An embedded `'` is closed out of the quoted region,
//! written as a double-quoted `'` and the quoting resumes: `abc'def` -> `'abc'"'"'def'`.
//!
//! Program names taken from the environment are never quoted. They are checked against
//! an allow-list by [validate_tool_name] instead, since they are used as the command
//! itself and quoting would not stop a name like `rm;` from meaning something else.
//!
//! Every append is checked against the line capacity before anything is written. A
//! token that would not fit is rejected as a whole with [QuoteError::WouldNotFit].

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::os::unix::ffi::{OsStrExt, OsStringExt};

use thiserror::Error;

/// Upper bound for a complete command line, in bytes.
pub const MAX_COMMAND_LEN: usize = 8192;

/// Replacement for an embedded single quote: close, `"'"`, reopen.
const QUOTE_ESCAPE: &[u8] = b"'\"'\"'";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuoteError {
    #[error("argument contains a NUL byte")]
    Nul,
    #[error("command line would exceed {capacity} bytes")]
    WouldNotFit { capacity: usize },
    #[error("invalid tool name '{0}' (allowed: letters, digits, '-', '_', '/', '.')")]
    InvalidToolName(String),
    #[error("no tool configured")]
    EmptyTool,
}

/// Exact size of the quoted form of `raw`, including the surrounding quotes.
pub fn quoted_len(raw: &[u8]) -> usize {
    let quotes = raw.iter().filter(|&&b| b == b'\'').count();
    raw.len() + 2 + quotes * (QUOTE_ESCAPE.len() - 1)
}

/// Appends the quoted form of `raw` to `out`, provided the result stays within `capacity`.
///
/// On error `out` is left exactly as it was.
pub fn quote_into(out: &mut Vec<u8>, raw: &[u8], capacity: usize) -> Result<(), QuoteError> {
    if raw.contains(&0) {
        return Err(QuoteError::Nul);
    }

    let needed = quoted_len(raw);
    if out
        .len()
        .checked_add(needed)
        .is_none_or(|total| total > capacity)
    {
        return Err(QuoteError::WouldNotFit { capacity });
    }

    out.reserve(needed);
    out.push(b'\'');
    for &b in raw {
        if b == b'\'' {
            out.extend_from_slice(QUOTE_ESCAPE);
        } else {
            out.push(b);
        }
    }
    out.push(b'\'');
    Ok(())
}

/// Quotes `raw` as a single shell word.
pub fn quote(raw: &[u8]) -> Result<Vec<u8>, QuoteError> {
    let mut out = Vec::new();
    quote_into(&mut out, raw, MAX_COMMAND_LEN)?;
    Ok(out)
}

/// A program name that passed [validate_tool_name].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolName(String);

impl ToolName {
    /// Program names compiled into burrow, e.g. `tmux`.
    pub(crate) fn builtin(name: &'static str) -> Self {
        debug_assert!(validate_tool_name(name).is_ok());
        Self(name.to_string())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Accepts only `[A-Za-z0-9-_/.]+`.
pub fn validate_tool_name(name: &str) -> Result<ToolName, QuoteError> {
    let valid = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'/' | b'.'));

    if valid {
        Ok(ToolName(name.to_string()))
    } else {
        Err(QuoteError::InvalidToolName(name.to_string()))
    }
}

/// A tool as configured by the user, e.g. `less -R` or `nvim -p`.
///
/// The first word is the program and has to pass [validate_tool_name]. The remaining
/// words are plain arguments and are quoted like any other argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: ToolName,
    args: Vec<String>,
}

impl ToolCommand {
    pub fn parse(spec: &str) -> Result<Self, QuoteError> {
        let mut words = spec.split_ascii_whitespace();
        let program = validate_tool_name(words.next().ok_or(QuoteError::EmptyTool)?)?;
        Ok(Self {
            program,
            args: words.map(str::to_string).collect(),
        })
    }

    /// Reads the tool from `env_var`, falling back to `fallback` when unset or blank.
    pub fn from_env(env_var: &str, fallback: &str) -> Result<Self, QuoteError> {
        match std::env::var(env_var) {
            Ok(value) if !value.trim().is_empty() => Self::parse(&value),
            _ => Self::parse(fallback),
        }
    }

    #[inline]
    pub fn program(&self) -> &ToolName {
        &self.program
    }

    #[inline]
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// Builder for a single `sh -c` command line.
///
/// Only three kinds of pieces exist: a validated program, static literal text (flags,
/// pipes, redirections) and quoted arguments.
#[derive(Debug, Clone)]
pub struct ShellLine {
    buf: Vec<u8>,
    capacity: usize,
}

impl ShellLine {
    pub fn new() -> Self {
        Self::with_capacity(MAX_COMMAND_LEN)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity.min(MAX_COMMAND_LEN)),
            capacity,
        }
    }

    /// Appends fixed text verbatim. Never pass anything derived from user input here.
    pub fn literal(&mut self, text: &'static str) -> Result<&mut Self, QuoteError> {
        self.push_unquoted(text.as_bytes())?;
        Ok(self)
    }

    pub fn program(&mut self, program: &ToolName) -> Result<&mut Self, QuoteError> {
        self.push_unquoted(program.as_str().as_bytes())?;
        Ok(self)
    }

    /// Appends the program and its configured arguments.
    pub fn tool(&mut self, tool: &ToolCommand) -> Result<&mut Self, QuoteError> {
        let mark = self.buf.len();
        let res = self.program(tool.program()).and_then(|line| {
            for arg in tool.args() {
                line.arg(arg)?;
            }
            Ok(())
        });
        if let Err(e) = res {
            self.buf.truncate(mark);
            return Err(e);
        }
        Ok(self)
    }

    /// Appends `raw` as one quoted word.
    pub fn arg<S: AsRef<OsStr>>(&mut self, raw: S) -> Result<&mut Self, QuoteError> {
        let mark = self.buf.len();
        if !self.buf.is_empty() {
            self.push_bytes(b" ")?;
        }
        if let Err(e) = quote_into(&mut self.buf, raw.as_ref().as_bytes(), self.capacity) {
            self.buf.truncate(mark);
            return Err(e);
        }
        Ok(self)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn to_os_string(&self) -> OsString {
        OsString::from_vec(self.buf.clone())
    }

    fn push_unquoted(&mut self, bytes: &[u8]) -> Result<(), QuoteError> {
        if bytes.contains(&0) {
            return Err(QuoteError::Nul);
        }
        let sep = usize::from(!self.buf.is_empty());
        if self.buf.len() + sep + bytes.len() > self.capacity {
            return Err(QuoteError::WouldNotFit {
                capacity: self.capacity,
            });
        }
        if sep == 1 {
            self.buf.push(b' ');
        }
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    fn push_bytes(&mut self, bytes: &[u8]) -> Result<(), QuoteError> {
        if self.buf.len() + bytes.len() > self.capacity {
            return Err(QuoteError::WouldNotFit {
                capacity: self.capacity,
            });
        }
        self.buf.extend_from_slice(bytes);
        Ok(())
    }
}

impl Default for ShellLine {
    fn default() -> Self {
        Self::new()
    }
}

/// Lossy rendering, used in log lines and error messages only.
impl fmt::Display for ShellLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_plain_and_embedded_quotes() -> Result<(), QuoteError> {
        assert_eq!(quote(b"abc")?, b"'abc'");
        assert_eq!(quote(b"abc'def")?, b"'abc'\"'\"'def'");
        assert_eq!(quote(b"")?, b"''");
        assert_eq!(quote(b"-rf *")?, b"'-rf *'");
        Ok(())
    }

    #[test]
    fn quote_rejects_nul() {
        assert_eq!(quote(b"a\0b"), Err(QuoteError::Nul));
    }

    #[test]
    fn quote_into_fails_closed() {
        let mut out = b"echo ".to_vec();
        let res = quote_into(&mut out, b"it's long", 10);
        assert_eq!(res, Err(QuoteError::WouldNotFit { capacity: 10 }));
        assert_eq!(out, b"echo ");
    }

    #[test]
    fn quoted_len_matches_output() -> Result<(), QuoteError> {
        for raw in [&b"x"[..], b"''", b"a'b'c", b"no quotes at all"] {
            assert_eq!(quote(raw)?.len(), quoted_len(raw));
        }
        Ok(())
    }

    #[test]
    fn tool_name_allow_list() {
        for ok in ["vim", "nvim", "bat-x", "/usr/bin/less", "fzf_0.4"] {
            assert!(validate_tool_name(ok).is_ok(), "{ok} should be accepted");
        }
        for bad in ["rm;", "a|b", "a&b", "`id`", "$EDITOR", "vim -p", "a\tb", ""] {
            assert!(validate_tool_name(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn tool_command_splits_args() -> Result<(), QuoteError> {
        let tool = ToolCommand::parse("less -R")?;
        assert_eq!(tool.program().as_str(), "less");
        assert_eq!(tool.args(), ["-R"]);

        assert!(matches!(
            ToolCommand::parse("vi;rm -rf ~"),
            Err(QuoteError::InvalidToolName(_))
        ));
        assert_eq!(ToolCommand::parse("   "), Err(QuoteError::EmptyTool));
        Ok(())
    }

    #[test]
    fn shell_line_quotes_args_only() -> Result<(), QuoteError> {
        let tool = ToolCommand::parse("less -R")?;
        let mut line = ShellLine::new();
        line.tool(&tool)?.arg("my file's.txt")?;
        assert_eq!(line.to_string(), r#"less '-R' 'my file'"'"'s.txt'"#);
        Ok(())
    }

    #[test]
    fn shell_line_rejects_overflow_without_partial_token() -> Result<(), QuoteError> {
        let mut line = ShellLine::with_capacity(16);
        line.literal("cat")?;
        let before = line.as_bytes().to_vec();
        assert!(line.arg("a-very-long-file-name").is_err());
        assert_eq!(line.as_bytes(), &before[..]);
        Ok(())
    }
}
