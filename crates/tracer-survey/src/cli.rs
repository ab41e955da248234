use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cmd::{
    self, drafts::DraftsCommand, pin::PinCommand, report::ReportArgs, survey::SurveyCommand,
};
use crate::config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "tracer-survey",
    about = "Tooling for tracer study and user survey operators",
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Configuration file (defaults to $TRACER_SURVEY_CONFIG or the user config dir)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Override the directory holding local drafts
    #[arg(long = "data-dir", value_name = "DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG wins when set
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Respondent PIN checks
    #[command(subcommand)]
    Pin(PinCommand),
    /// Inspect and maintain locally saved drafts
    #[command(subcommand)]
    Drafts(DraftsCommand),
    /// Survey package utilities
    #[command(subcommand)]
    Survey(SurveyCommand),
    /// Export a response report from the survey backend
    Report(ReportArgs),
}

pub fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load(cli.config.as_deref())?.config;
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = Some(dir);
    }

    match cli.command {
        Commands::Pin(command) => cmd::pin::run(command, &config),
        Commands::Drafts(command) => cmd::drafts::run(command, &config),
        Commands::Survey(command) => cmd::survey::run(command, &config),
        Commands::Report(args) => cmd::report::run(args, &config),
    }
}

fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    // A second init in the same process (tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pin_validate_with_globals() {
        let cli = Cli::try_parse_from([
            "tracer-survey",
            "pin",
            "validate",
            "--type",
            "user-survey",
            "294817",
            "--config",
            "/tmp/tracer.toml",
            "-vv",
        ])
        .expect("expected CLI to parse");
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/tmp/tracer.toml")));
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Pin(PinCommand::Validate(args)) => {
                assert_eq!(args.pin, "294817");
                assert_eq!(args.survey_type, survey_store::SurveyType::UserSurvey);
            }
            _ => panic!("expected pin validate args"),
        }
    }

    #[test]
    fn parses_drafts_show() {
        let cli = Cli::try_parse_from([
            "tracer-survey",
            "--data-dir",
            "/tmp/drafts",
            "drafts",
            "show",
            "TS_001",
        ])
        .expect("expected CLI to parse");
        assert_eq!(cli.data_dir.as_deref(), Some(std::path::Path::new("/tmp/drafts")));
        match cli.command {
            Commands::Drafts(DraftsCommand::Show(args)) => assert_eq!(args.user_id, "TS_001"),
            _ => panic!("expected drafts show args"),
        }
    }

    #[test]
    fn parses_survey_page_index() {
        let cli = Cli::try_parse_from([
            "tracer-survey",
            "survey",
            "page",
            "package.json",
            "--index",
            "1",
        ])
        .expect("expected CLI to parse");
        match cli.command {
            Commands::Survey(SurveyCommand::Page(args)) => {
                assert_eq!(args.index, 1);
                assert_eq!(args.file, PathBuf::from("package.json"));
            }
            _ => panic!("expected survey page args"),
        }
    }

    #[test]
    fn rejects_unknown_survey_type() {
        let err = Cli::try_parse_from([
            "tracer-survey",
            "pin",
            "validate",
            "--type",
            "alumni",
            "482913",
        ])
        .expect_err("unknown survey type");
        assert!(err.to_string().contains("alumni"));
    }

    #[test]
    fn command_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
