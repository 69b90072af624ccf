//! Command dispatch

use std::io::{self, Write};
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::Workspace;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::session::{render_view, Session};
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, Settings};
use crate::domain::{default_seed, display_forest};
use crate::infrastructure::{InfraError, ScriptSource};

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Seed { json }) => _seed(*json),
        Some(Commands::Session {
            script,
            json,
            strict,
        }) => _session(cli.config.as_deref(), script.clone(), *json, *strict),
        Some(Commands::Config { command }) => _config(cli.config.as_deref(), command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::Usage(
            "no command given, try 'stagetree --help'".to_string(),
        )),
    }
}

#[instrument]
fn _seed(json: bool) -> CliResult<()> {
    let forest = default_seed().map_err(crate::application::ApplicationError::from)?;
    let view = display_forest(&forest);
    output::info(&render_view("seed", &view, json)?);
    Ok(())
}

#[instrument(skip(config))]
fn _session(
    config: Option<&Path>,
    script: Option<std::path::PathBuf>,
    json: bool,
    strict: bool,
) -> CliResult<()> {
    let settings = Settings::load(config)?;
    debug!("settings: {:?}", settings);
    let json = json || settings.json;
    let strict = strict || settings.strict;

    let workspace = Workspace::new(settings)?;
    let reader = ScriptSource::from_arg(script).open()?;

    let stdout = io::stdout();
    let mut session = Session::new(workspace, stdout.lock())
        .json(json)
        .strict(strict);
    let summary = session.run(reader)?;

    if summary.failed > 0 {
        output::warning(&format!(
            "{} of {} command(s) failed",
            summary.failed, summary.executed
        ));
    }
    Ok(())
}

#[instrument(skip(config))]
fn _config(config: Option<&Path>, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(config)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action(
                    "global",
                    &format!(
                        "{} ({})",
                        path.display(),
                        if path.exists() { "exists" } else { "missing" }
                    ),
                ),
                None => output::action("global", "unavailable (no home directory)"),
            }
            if let Some(path) = config {
                output::action("file", &path.display());
            }
        }
        ConfigCommands::Init { force } => {
            let path = global_config_path().ok_or_else(|| {
                CliError::Usage("cannot determine global config directory".to_string())
            })?;
            if path.exists() && !force {
                return Err(CliError::Usage(format!(
                    "{} already exists, use --force to overwrite",
                    path.display()
                )));
            }
            write_template(&path)?;
            output::action("created", &path.display());
        }
    }
    Ok(())
}

fn write_template(path: &Path) -> CliResult<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .map_err(|e| InfraError::io(format!("create {}", dir.display()), e))?;
    }
    let mut file = std::fs::File::create(path)
        .map_err(|e| InfraError::io(format!("create {}", path.display()), e))?;
    file.write_all(Settings::template().as_bytes())
        .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
    Ok(())
}
