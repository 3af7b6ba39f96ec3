//! isegrid - structured spreadsheet editor, command mode

mod cli;
mod commands;
mod config;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use isegrid_core::{Editor, Workbook};
use std::process::ExitCode;

use crate::cli::Cli;

fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let (config, warnings) = config::load_config(cli.config.as_deref());
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }

    let (workbook, report) = Workbook::with_file(cli.file.clone(), config.schemas.clone())
        .with_context(|| format!("Failed to open {}", display_path(&cli.file)))?;
    for (address, err) in &report.rejected {
        eprintln!("Warning: skipped {}: {}", address, err);
    }

    let mut editor = Editor::new(workbook, config);
    for (i, line) in cli.commands.iter().enumerate() {
        let output = commands::execute(&mut editor, line)
            .with_context(|| format!("command {} `{}`", i + 1, line))?;
        for line in output {
            println!("{}", line);
        }
    }

    if let Some(path) = &cli.save {
        let saved = editor.workbook_mut()?.save_as(path)?;
        eprintln!("Saved {}", saved.display());
    }
    Ok(())
}

fn display_path(path: &Option<std::path::PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "new workbook".to_string())
}
