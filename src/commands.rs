//! Command-mode interpreter.
//!
//! Each command is one line; queries return the lines to print.

use anyhow::{Context, Result, anyhow, bail};
use isegrid_core::{Address, CellValue, Direction, Editor, Orientation, Rect};

/// Run one command against the editor and return its output lines.
pub fn execute(editor: &mut Editor, line: &str) -> Result<Vec<String>> {
    let line = line.trim();
    let parts: Vec<&str> = line.splitn(2, ' ').collect();
    let command = parts[0];
    let args = parts.get(1).copied().unwrap_or("");
    let words: Vec<&str> = args.split_whitespace().collect();
    let mut out = Vec::new();

    match command {
        "activate" | "a" => {
            let address = single_address(editor, &words, "activate A1")?;
            editor.activate(address)?;
        }
        "type" | "t" => {
            // Everything after the command word is typed verbatim.
            let text = line.split_once(' ').map(|(_, rest)| rest).unwrap_or("");
            editor.type_text(text)?;
        }
        "accept" => {
            let index: usize = match words.as_slice() {
                [n] => n.parse().with_context(|| format!("Invalid index: {}", n))?,
                _ => bail!("Usage: accept N"),
            };
            let suggestion = editor
                .suggestions()
                .get(index)
                .cloned()
                .ok_or_else(|| anyhow!("No suggestion {}", index))?;
            editor.accept_suggestion(&suggestion)?;
        }
        "commit" => {
            editor.commit()?;
        }
        "cancel" => {
            editor.cancel()?;
        }
        "move" | "m" => {
            let (name, extend) = match words.as_slice() {
                [name] => (*name, false),
                [name, "extend"] => (*name, true),
                _ => bail!("Usage: move DIR [extend]"),
            };
            let direction =
                Direction::parse(name).ok_or_else(|| anyhow!("Unknown direction: {}", name))?;
            editor.move_focus(direction, extend);
        }
        "select" => {
            let (a, b) = match words.as_slice() {
                [range] if range.contains(':') => {
                    let rect = Rect::parse_a1(editor.current_sheet(), range)
                        .ok_or_else(|| anyhow!("Invalid range: {}", range))?;
                    (rect.top_left(), rect.bottom_right())
                }
                [a, b] => (parse_address(editor, a)?, parse_address(editor, b)?),
                _ => bail!("Usage: select A1 B3"),
            };
            editor.select_range(a, b)?;
        }
        "repeat" => {
            let (address, orientation, len) = match words.as_slice() {
                [a, o, n] => (
                    parse_address(editor, a)?,
                    parse_orientation(o)?,
                    n.parse::<usize>()
                        .with_context(|| format!("Invalid length: {}", n))?,
                ),
                _ => bail!("Usage: repeat A1 row|column N"),
            };
            let items = vec![CellValue::Empty; len];
            editor.set_value(address, CellValue::repetition(orientation, items))?;
        }
        "resize" => {
            let (address, len, force) = match words.as_slice() {
                [a, n] => (parse_address(editor, a)?, *n, false),
                [a, n, "force"] => (parse_address(editor, a)?, *n, true),
                _ => bail!("Usage: resize A1 N [force]"),
            };
            let len: usize = len
                .parse()
                .with_context(|| format!("Invalid length: {}", len))?;
            editor.resize(address, len, force)?;
        }
        "ir" | "insertrow" => {
            let sheet = editor.current_sheet();
            let row = editor.selection().focus().row;
            editor.insert_row(sheet, row)?;
        }
        "ic" | "insertcol" => {
            let sheet = editor.current_sheet();
            let col = editor.selection().focus().col;
            editor.insert_column(sheet, col)?;
        }
        "sheet" => {
            if args.trim().is_empty() {
                bail!("Usage: sheet NAME");
            }
            editor.switch_sheet(args)?;
        }
        "undo" | "u" => editor.undo()?,
        "redo" => editor.redo()?,
        "get" | "g" => {
            let address = single_address(editor, &words, "get A1")?;
            out.push(render_value(&editor.workbook().grid.resolve(&address)));
        }
        "bounds" => {
            let bounds = editor.workbook().grid.bounds_of(editor.current_sheet());
            out.push(bounds.map(|r| r.to_string()).unwrap_or_default());
        }
        "suggest" => {
            for (i, suggestion) in editor.suggestions().iter().enumerate() {
                out.push(format!("{}\t{}\t{:?}", i, suggestion.label, suggestion.kind));
            }
        }
        "selection" => out.push(editor.selection().to_string()),
        "draft" => {
            let session = editor
                .session()
                .ok_or_else(|| anyhow!("No cell is being edited"))?;
            out.push(session.draft().to_string());
        }
        "" => {}
        _ => bail!("Unknown command: {}", command),
    }
    Ok(out)
}

fn single_address(editor: &Editor, words: &[&str], usage: &str) -> Result<Address> {
    match words {
        [a] => parse_address(editor, a),
        _ => bail!("Usage: {}", usage),
    }
}

/// A1 address on the current sheet.
fn parse_address(editor: &Editor, text: &str) -> Result<Address> {
    Address::parse_a1(editor.current_sheet(), text)
        .ok_or_else(|| anyhow!("Invalid cell reference: {}", text))
}

fn parse_orientation(text: &str) -> Result<Orientation> {
    match text.to_ascii_lowercase().as_str() {
        "row" => Ok(Orientation::Row),
        "column" | "col" => Ok(Orientation::Column),
        _ => bail!("Unknown orientation: {}", text),
    }
}

/// Scalars print as their text, composites as a compact JSON tree.
fn render_value(value: &CellValue) -> String {
    match value {
        CellValue::Empty => String::new(),
        CellValue::Scalar { text, .. } => text.clone(),
        composite => composite
            .to_tree()
            .map(|tree| tree.to_string())
            .unwrap_or_else(|_| composite.shape_name().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isegrid_core::{EditorConfig, Workbook};

    fn editor() -> Editor {
        Editor::new(Workbook::new(), EditorConfig::default())
    }

    fn run(editor: &mut Editor, lines: &[&str]) -> Vec<String> {
        lines
            .iter()
            .flat_map(|line| execute(editor, line).unwrap())
            .collect()
    }

    #[test]
    fn test_type_keeps_spaces() {
        let mut ed = editor();
        let out = run(&mut ed, &["activate B2", "type  two words", "draft"]);
        assert_eq!(out, vec![" two words".to_string()]);
    }

    #[test]
    fn test_edit_and_query() {
        let mut ed = editor();
        let out = run(
            &mut ed,
            &["activate C3", "type 7", "commit", "selection", "get C3", "bounds"],
        );
        assert_eq!(out, vec!["C4", "7", "C3"]);
    }

    #[test]
    fn test_select_accepts_range_form() {
        let mut ed = editor();
        let out = run(&mut ed, &["select B3:A1", "selection"]);
        assert_eq!(out, vec!["A1:B3"]);
    }

    #[test]
    fn test_repeat_and_resize() {
        let mut ed = editor();
        let out = run(&mut ed, &["repeat A1 row 2", "resize A1 4", "bounds"]);
        assert_eq!(out, vec!["A1:D1"]);
        assert!(execute(&mut ed, "resize B1 1").is_err());
    }

    #[test]
    fn test_insert_row_commits_open_edit() {
        let mut ed = editor();
        let out = run(&mut ed, &["activate B2", "type kept", "ir", "get B3", "get B2"]);
        assert_eq!(out, vec!["kept".to_string(), "".to_string()]);
        assert!(!ed.is_editing());
    }

    #[test]
    fn test_get_composite_prints_tree() {
        let mut ed = editor();
        let out = run(&mut ed, &["repeat A1 column 1", "get A1"]);
        assert_eq!(out, vec!["".to_string()]);
        ed.set_value(
            Address::parse_a1(ed.current_sheet(), "B1").unwrap(),
            CellValue::variant("ok", CellValue::Empty),
        )
        .unwrap();
        let out = run(&mut ed, &["get B1"]);
        assert!(out[0].contains("\"tag\":\"ok\""));
    }

    #[test]
    fn test_bad_commands() {
        let mut ed = editor();
        assert!(execute(&mut ed, "frobnicate").is_err());
        assert!(execute(&mut ed, "move sideways").is_err());
        assert!(execute(&mut ed, "accept 0").is_err());
        assert!(execute(&mut ed, "commit").is_err());
    }
}
