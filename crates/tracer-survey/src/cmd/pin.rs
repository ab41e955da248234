use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use survey_store::{
    InMemoryPinRepository, PinDirectory, RespondentIdentity, SurveyType, crypto,
};

use super::print_json;
use crate::config::Config;

#[derive(Subcommand, Debug, Clone)]
pub enum PinCommand {
    /// Check a PIN against the configured directory and print the respondent
    Validate(ValidateArgs),
    /// List active respondents
    List(ListArgs),
    /// Print the salted hash stored for a PIN
    Hash(HashArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Survey the PIN belongs to (tracer-study or user-survey)
    #[arg(long = "type", value_name = "TYPE")]
    pub survey_type: SurveyType,
    pub pin: String,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Only list respondents of this survey
    #[arg(long = "type", value_name = "TYPE")]
    pub survey_type: Option<SurveyType>,
}

#[derive(Args, Debug, Clone)]
pub struct HashArgs {
    pub pin: String,
}

pub fn run(command: PinCommand, config: &Config) -> Result<()> {
    match command {
        PinCommand::Validate(args) => validate(&args, config),
        PinCommand::List(args) => list(&args, config),
        PinCommand::Hash(args) => {
            println!("{}", crypto::hash(args.pin.trim(), &config.pins.salt));
            Ok(())
        }
    }
}

fn directory(config: &Config) -> PinDirectory<InMemoryPinRepository> {
    let salt = config.pins.salt.as_str();
    PinDirectory::new(InMemoryPinRepository::seeded(&config.pins.seed(), salt), salt)
}

fn validate(args: &ValidateArgs, config: &Config) -> Result<()> {
    let Some(record) = directory(config).validate(&args.pin, args.survey_type) else {
        bail!("PIN rejected for {}", args.survey_type);
    };
    print_json(&RespondentIdentity::from(&record))
}

fn list(args: &ListArgs, config: &Config) -> Result<()> {
    let respondents: Vec<RespondentIdentity> = directory(config)
        .list_active(args.survey_type)
        .iter()
        .map(RespondentIdentity::from)
        .collect();
    print_json(&respondents)
}
