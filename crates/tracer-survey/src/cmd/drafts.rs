use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use serde_json::Value;
use survey_store::{FileStore, UserDraftStore};
use tracing::info;

use super::print_json;
use crate::config::Config;

#[derive(Subcommand, Debug, Clone)]
pub enum DraftsCommand {
    /// List users with a saved draft
    List,
    /// Print the decrypted draft of a user
    Show(UserArgs),
    /// Store a JSON object as the draft of a user
    Save(SaveArgs),
    /// Remove the draft of a user
    Clear(UserArgs),
    /// Remove every draft under the configured prefix
    ClearAll,
    /// Remove drafts written under timestamp-suffixed legacy user ids
    Cleanup,
}

#[derive(Args, Debug, Clone)]
pub struct UserArgs {
    pub user_id: String,
}

#[derive(Args, Debug, Clone)]
pub struct SaveArgs {
    pub user_id: String,
    /// JSON file holding the draft object
    pub file: PathBuf,
}

pub fn run(command: DraftsCommand, config: &Config) -> Result<()> {
    let mut drafts = open(config)?;
    match command {
        DraftsCommand::List => print_json(&drafts.list_user_ids()),
        DraftsCommand::Show(args) => {
            let Some(draft) = drafts.load(&args.user_id) else {
                bail!("no draft stored for {}", args.user_id);
            };
            print_json(&draft)
        }
        DraftsCommand::Save(args) => {
            let raw = fs::read_to_string(&args.file)
                .with_context(|| format!("failed to read {}", args.file.display()))?;
            let draft: Value = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not valid JSON", args.file.display()))?;
            drafts
                .save(&args.user_id, &draft)
                .with_context(|| format!("failed to save draft for {}", args.user_id))?;
            info!(user_id = %args.user_id, "draft saved");
            Ok(())
        }
        DraftsCommand::Clear(args) => {
            drafts.clear(&args.user_id)?;
            info!(user_id = %args.user_id, "draft cleared");
            Ok(())
        }
        DraftsCommand::ClearAll => {
            let removed = drafts.clear_all()?;
            println!("removed {removed} draft(s)");
            Ok(())
        }
        DraftsCommand::Cleanup => print_json(&drafts.cleanup_legacy()?),
    }
}

fn open(config: &Config) -> Result<UserDraftStore<FileStore>> {
    let path = config.drafts_path();
    let store = FileStore::open(&path)
        .with_context(|| format!("failed to open draft store {}", path.display()))?;
    Ok(UserDraftStore::new(store, config.storage.encryption_key.as_str())
        .with_prefix(config.storage.key_prefix.as_str()))
}
