//! main.rs
//! Entry point for burrow

pub(crate) mod app;
pub(crate) mod config;
pub(crate) mod core;
pub(crate) mod ui;
pub(crate) mod utils;

use crate::app::Session;
use crate::config::Config;
use crate::core::mux::Multiplexer;
use crate::core::proc::Dispatcher;
use crate::core::signals::SignalFlags;
use crate::core::terminal::{self, CrosstermDriver};
use crate::utils::cli::{CliAction, handle_args};
use crate::utils::{is_usable_directory, logging, resolve_start_dir};

use log::{error, info};

fn main() -> std::io::Result<()> {
    std::panic::set_hook(Box::new(|info| {
        let _ = crossterm::terminal::disable_raw_mode();
        let mut stdout = std::io::stdout();
        let _ = crossterm::execute!(
            stdout,
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::cursor::Show
        );

        eprintln!("\n[bw] Error occurred: {}", info);

        #[cfg(debug_assertions)]
        {
            let bt = std::backtrace::Backtrace::force_capture();
            eprintln!("\nStack Backtrace:\n{}", bt);
        }
    }));

    let path_arg = match handle_args() {
        CliAction::Exit => return Ok(()),
        CliAction::RunApp => None,
        CliAction::RunAppAtPath(path) => Some(path),
    };

    if let Err(e) = logging::init() {
        eprintln!("[bw] Logging disabled: {}", e);
    }

    let config = Config::load();

    let start_dir = match resolve_start_dir(path_arg.as_deref()) {
        Ok(dir) if is_usable_directory(&dir) => dir,
        Ok(dir) => {
            eprintln!("[bw] Error: Path '{}' cannot be opened.", dir.display());
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("[bw] Error: cannot determine the start directory: {}", e);
            std::process::exit(1);
        }
    };

    // Register signal handlers. They only set the atomic flags
    let signals = SignalFlags::new();
    signals.register()?;

    let dispatcher = Dispatcher::new(
        config.tools().defaults(),
        Box::new(CrosstermDriver),
        Multiplexer::detect(),
    );

    let mut session = match Session::new(&config, &start_dir, dispatcher, signals) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("[bw] Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = terminal::run_terminal(&mut session);
    session.cleanup();
    match &result {
        Ok(()) => info!("bye"),
        Err(e) => error!("terminal failure: {}", e),
    }
    result
}
