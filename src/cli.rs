use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "isegrid")]
#[command(about = "Structured spreadsheet editor (command mode)")]
#[command(version)]
#[command(after_help = "\
Commands (one per -c, run in order):
  activate A1          start editing a cell
  type TEXT            insert text at the caret
  accept N             accept suggestion N (0-based)
  commit | cancel      finish the edit
  move DIR [extend]    up, down, left, right, next, prev
  select A1 B3         select a range
  repeat A1 row|column N
                       store a repetition of N empty items
  resize A1 N [force]  resize the repetition anchored at A1
  sheet NAME           switch to (or create) a sheet
  undo | redo
  get A1 | bounds | suggest | selection | draft

Examples:
  isegrid -c 'activate C3' -c 'type su' -c suggest
  isegrid book.isegrid -c 'activate A1' -c 'type 42' -c commit --save book.isegrid")]
pub struct Cli {
    /// Document to open
    pub file: Option<PathBuf>,

    /// Config file (defaults to config.toml in the user config dir)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Command to run; repeat for a script
    #[arg(short = 'c', long = "command")]
    pub commands: Vec<String>,

    /// Save the document here after the commands ran
    #[arg(long)]
    pub save: Option<PathBuf>,
}
