use std::io;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use pomodoro::args;
use pomodoro::config::ConfigStore;
use pomodoro::logging;
use pomodoro::notify::DesktopNotifier;
use pomodoro::render;
use pomodoro::terminal::RawMode;
use pomodoro::timer::{TimerLoop, wait_one_second};

const TOKENS_HELP: &str = "\
Tokens:
  <W>-<B>              work and break minutes for this run, e.g. 50-10
  n=<N>                number of work sessions for this run
  config [KEY=VALUE]   save settings instead of running the timer:
                         work=<N> break=<N> sessions=<N>
                         workcolor=(r,g,b) breakcolor=(r,g,b)";

#[derive(Parser)]
#[command(
    name = "pomodoro",
    version,
    about = "🍅 Pomodoro timer with a live progress bar",
    after_help = TOKENS_HELP
)]
struct Cli {
    /// Overrides for this run, or `config` followed by settings to save
    #[arg(value_name = "TOKEN", trailing_var_arg = true, allow_hyphen_values = true)]
    tokens: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let store = ConfigStore::locate();
    logging::init(&store);
    info!("pomodoro {} starting", env!("CARGO_PKG_VERSION"));

    let terminal = RawMode::enable();
    let config = store.load();
    let invocation = args::interpret(cli.tokens.as_slice(), config, &store);

    let mut status = ExitCode::SUCCESS;
    if invocation.run_timer {
        let mut timer = TimerLoop::new(
            io::stdout(),
            DesktopNotifier,
            wait_one_second,
            render::terminal_columns,
        );
        if let Err(err) = timer.run(&invocation.config) {
            eprintln!("Error: {err}");
            error!("timer stopped: {err}");
            status = ExitCode::FAILURE;
        }
    }

    terminal.restore();
    status
}
