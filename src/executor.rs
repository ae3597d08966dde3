use crate::config::Config;
use crate::model::{Entry, EntryKind};
use crate::sources::history;
use anyhow::Result;
use log::{info, warn};
use std::path::Path;
use std::process::{Command, Stdio};

/// Whether activating an entry of this kind should be remembered.
fn is_recorded(kind: EntryKind) -> bool {
    match kind {
        EntryKind::CommandLine | EntryKind::History => true,
        EntryKind::Application
        | EntryKind::File
        | EntryKind::Url
        | EntryKind::Calculation
        | EntryKind::WebSearch => false,
    }
}

/// Builds the process for an entry, or `None` when there is nothing to run.
pub fn build_command(entry: &Entry, config: &Config) -> Option<Command> {
    if entry.command().is_empty() {
        return None;
    }

    let mut command = match (&config.general.terminal, entry.terminal()) {
        (Some(term_cmd), true) => {
            let mut parts = term_cmd.split_whitespace();
            let mut command = Command::new(parts.next()?);
            command.args(parts).args(["sh", "-c", entry.command()]);
            command
        }
        _ => {
            let mut command = Command::new("sh");
            command.args(["-c", entry.command()]);
            command
        }
    };
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    Some(command)
}

pub fn execute(entry: &Entry, config: &Config, history_path: Option<&Path>) -> Result<()> {
    let Some(mut command) = build_command(entry, config) else {
        info!("Nothing to run for {:?}", entry.name());
        return Ok(());
    };

    if is_recorded(entry.kind()) {
        if let Some(path) = history_path {
            if let Err(err) = history::record(path, entry.command(), config.general.history_size) {
                warn!("Could not update history: {}", err);
            }
        }
    }

    command.spawn()?;
    Ok(())
}
