use clap::Parser;
use occur_core::config::Config;
use occur_core::error::CoreError;
use occur_core::matcher::Matcher;
use owo_colors::{OwoColorize, Style};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod views;

const LOG_ENV: &str = "OCCUR_LOG";

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = cli::Cli::parse();
    let config = config::load(cli.config.as_deref()).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Invalid configuration, using defaults");
        Config::default()
    });

    let result = match cli.command {
        cli::Commands::Encode(command) => commands::encode::encode_rule(command),
        cli::Commands::Decode(command) => commands::decode::decode_rule(command),
        cli::Commands::Check(command) => {
            let matcher = Matcher::new(config.matcher.clone());
            commands::check::check_occurrence(&matcher, command)
        }
        cli::Commands::Search(command) => commands::search::search_events(command, &config).await,
    };

    if let Err(e) = result {
        handle_error(e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();
    let core_error = err.chain().find_map(|e| e.downcast_ref::<CoreError>());

    match core_error {
        Some(CoreError::InvalidDayCode(code)) => {
            eprintln!(
                "{} Invalid day code '{}'. Use MO, TU, WE, TH, FR, SA or SU.",
                "Error:".style(error_style),
                code.yellow()
            );
        }
        Some(CoreError::InvalidMonthDay(day)) => {
            eprintln!(
                "{} Invalid day of month {}. Use a value between 1 and 31.",
                "Error:".style(error_style),
                day.yellow()
            );
        }
        Some(CoreError::InvalidRule(reason)) => {
            eprintln!(
                "{} Invalid recurrence rule: {}",
                "Error:".style(error_style),
                reason.yellow()
            );
        }
        Some(CoreError::InvalidInput(reason)) => {
            eprintln!("{} Invalid input: {}", "Error:".style(error_style), reason);
        }
        _ => eprintln!("{} {:#}", "Error:".style(error_style), err),
    }
}
