//! Command-line argument parsing and help for burrow.
//!
//! With no arguments (`bw`) burrow opens the TUI in the start directory.

use crate::config::Config;

use std::ffi::OsString;
use std::os::unix::ffi::OsStrExt;

#[derive(Debug, PartialEq, Eq)]
pub enum CliAction {
    RunApp,
    RunAppAtPath(OsString),
    Exit,
}

pub fn handle_args() -> CliAction {
    let args: Vec<OsString> = std::env::args_os().skip(1).collect();
    parse_args(&args)
}

/// Interprets the arguments after the program name. Informational flags print and exit.
///
/// Paths are taken as raw bytes; only the flags need to be UTF-8.
pub fn parse_args(args: &[OsString]) -> CliAction {
    let Some(first) = args.first() else {
        return CliAction::RunApp;
    };

    if args.len() > 1 {
        eprintln!("Error: bw accepts only one argument at a time.");
        eprintln!("Usage: bw [PATH] or bw [OPTION]");
        return CliAction::Exit;
    }

    let bytes = first.as_bytes();
    if !bytes.starts_with(b"-") {
        if bytes.trim_ascii().is_empty() {
            eprintln!("Error: the path argument is empty.");
            return CliAction::Exit;
        }
        return CliAction::RunAppAtPath(first.clone());
    }

    let flag = first.to_string_lossy();
    match &*flag {
        "--version" | "-v" => {
            print_version();
            CliAction::Exit
        }
        "-h" | "--help" => {
            print_help();
            CliAction::Exit
        }
        "--keybinds" | "--keys" => {
            print_keybinds();
            CliAction::Exit
        }
        "--init" => {
            if let Err(e) = Config::generate_default(&Config::default_path()) {
                eprintln!("Error: {}", e);
            }
            CliAction::Exit
        }
        arg => {
            eprintln!("Unknown argument: {}", arg);
            eprintln!("Try --help for available options");
            CliAction::Exit
        }
    }
}

fn print_version() {
    println!("burrow {}", env!("CARGO_PKG_VERSION"));
}

fn print_help() {
    println!(
        r#"burrow - a small keyboard-driven terminal directory browser

USAGE:
  bw [PATH]

PATH:
  Directory to open (defaults to $BW_START_DIR, then the current directory)

OPTIONS:
      --init              Generate the default configuration file
      --keybinds          Display the default key bindings
  -h, --help              Print help information
  -v, --version           Display the installed version of burrow

ENVIRONMENT:
  EDITOR                  Editor for "e", "v" and grep results (default: vi)
  PAGER                   Pager for "p" (default: less -R)
  BW_FINDER               Fuzzy finder for "/" and "?" (default: fzf)
  BW_START_DIR            Start directory when no PATH is given
  BW_CONFIG               Override the config file path
  BW_LOG, BW_LOG_FILE     Log level (error..trace) and log file

SHELL INTEGRATION:
  "o" writes the current directory to /tmp/.bw_lastdir and quits:
    bwcd() {{ bw "$@" && [ -f /tmp/.bw_lastdir ] && cd "$(cat /tmp/.bw_lastdir)"; }}
"#
    );
}

/// Default key bindings, shown by `--keybinds` and the in-app help.
pub const KEYBINDS_TEXT: &str = r##"Navigation
  j / Down         move down            k / Up           move up
  g                first entry          G                last entry
  l / Enter / Right  enter directory    Backspace / Left parent directory
  h                toggle hidden files

Files
  n                new file             N                new directory
  r                rename               d                delete (asks first)

Sort (s + key)
  sn  name    ss  size    st  modified    se  extension    sr  reverse

Filter (f + key)
  ff  files only    fd  directories only    fF  clear    fc  name contains...

Tools
  e                open in $EDITOR      v                $EDITOR in a tmux split
  p                open in $PAGER       /                fuzzy find a path
  ?                pick a line (grep)   ??               this help
  t                toggle tmux terminal pane

Quit
  o                quit and cd here (via hand-off file)
  q                quit
"##;

fn print_keybinds() {
    println!("{}", KEYBINDS_TEXT);
}
