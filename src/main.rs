mod config;
mod console;
mod error;
mod grading;
mod record;
mod roster;
mod session;
mod validate;

use std::io::{self, BufRead};
use std::process::exit;

use anyhow::Context;
use clap::Parser;

use config::{Cli, Config, OutputFormat};
use console::{Console, JsonConsole, TextConsole};
use session::{Mode, Session};

const EXIT_OK: i32 = 0;
const EXIT_FATAL: i32 = 1;
const EXIT_CONFIG: i32 = 2;

fn init_logger(default_filter: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    let config = match Config::resolve(cli) {
        Ok(v) => v,
        Err(e) => {
            init_logger("warn");
            log::error!("{e:#}");
            exit(EXIT_CONFIG);
        }
    };
    init_logger(&config.log_level);

    let code = match run(&config) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e:#}");
            EXIT_FATAL
        }
    };
    exit(code);
}

fn run(config: &Config) -> anyhow::Result<i32> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let stdout = io::stdout();
    match config.output {
        OutputFormat::Text => drive(
            &mut input,
            &mut TextConsole::new(stdout.lock(), config.quiet),
            config,
        ),
        OutputFormat::Json => drive(&mut input, &mut JsonConsole::new(stdout.lock()), config),
    }
}

fn drive<R: BufRead, C: Console>(
    input: &mut R,
    console: &mut C,
    config: &Config,
) -> anyhow::Result<i32> {
    console.welcome().context("failed to write output")?;

    let mut session = Session::Global;
    let mut seq: usize = 0;
    loop {
        console.prompt(&session).context("failed to write output")?;
        let Some(line) = console::read_line(input).context("failed to read input")? else {
            log::info!("end of input");
            break;
        };
        seq += 1;

        let before = session.mode();
        let (next, outcome) = session.execute(&line, &config.reports_dir);
        session = next;
        console
            .report(seq, before, &session, &outcome)
            .context("failed to write output")?;

        match &outcome {
            Err(e) if e.is_fatal() => {
                log::error!("fatal: {e}");
                drop(session);
                return Ok(EXIT_FATAL);
            }
            Err(e) => log::warn!("line {seq}: {e}"),
            Ok(_) => {}
        }
        if session.mode() == Mode::Terminated {
            break;
        }
    }

    console.farewell().context("failed to write output")?;
    Ok(EXIT_OK)
}
