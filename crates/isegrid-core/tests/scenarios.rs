// End-to-end editing scenarios through the public Editor API.

use isegrid_core::{
    Address, CellValue, Direction, EditState, Editor, EditorConfig, IseError, Orientation,
    ReactivatePolicy, SheetId, SuggestionKind, SymbolConfig, Workbook,
};
use isegrid_model::{GridError, Rect};

fn addr(row: usize, col: usize) -> Address {
    Address::new(SheetId(0), row, col)
}

fn config_with_foosum() -> EditorConfig {
    EditorConfig {
        functions: vec![SymbolConfig {
            name: "FOOSUM".to_string(),
            signature: Some("FOOSUM(range)".to_string()),
            description: None,
        }],
        ..EditorConfig::default()
    }
}

#[test]
fn formula_scalar_round_trips_with_unit_bounds() {
    let mut workbook = Workbook::new();
    workbook
        .set_value(addr(0, 0), CellValue::formula("=A2"))
        .unwrap();
    assert_eq!(workbook.grid.get(&addr(0, 0)), CellValue::formula("=A2"));
    assert_eq!(
        workbook.grid.bounds_of(SheetId(0)),
        Some(Rect::cell(addr(0, 0)))
    );
}

#[test]
fn member_of_column_repetition_rejects_direct_write() {
    let mut workbook = Workbook::new();
    let items = vec![
        CellValue::text("a"),
        CellValue::text("b"),
        CellValue::text("c"),
    ];
    workbook
        .set_value(addr(0, 0), CellValue::repetition(Orientation::Column, items))
        .unwrap();
    let err = workbook
        .set_value(addr(1, 0), CellValue::text("x"))
        .unwrap_err();
    assert!(matches!(
        err,
        IseError::Grid(GridError::OccupiedByRepetition { .. })
    ));
}

#[test]
fn typing_accepting_and_committing_a_function() {
    let mut editor = Editor::new(Workbook::new(), config_with_foosum());
    editor.activate(addr(2, 2)).unwrap();
    editor.type_text("su").unwrap();

    let labels: Vec<&str> = editor
        .suggestions()
        .iter()
        .map(|s| s.label.as_str())
        .collect();
    let sum = labels.iter().position(|l| *l == "SUM").unwrap();
    let foosum = labels.iter().position(|l| *l == "FOOSUM").unwrap();
    assert!(sum < foosum);
    assert!(editor.suggestions()[sum].rank < editor.suggestions()[foosum].rank);

    let suggestion = editor.suggestions()[sum].clone();
    assert_eq!(suggestion.kind, SuggestionKind::Function);
    editor.accept_suggestion(&suggestion).unwrap();
    assert_eq!(editor.session().unwrap().draft(), "SUM");

    assert_eq!(editor.commit().unwrap(), addr(2, 2));
    assert_eq!(
        editor.workbook().grid.get(&addr(2, 2)),
        CellValue::formula("SUM")
    );
    assert_eq!(editor.selection().active_address(), addr(3, 2));
    assert_eq!(editor.state(), &EditState::Idle);
}

#[test]
fn reactivation_commits_the_previous_session() {
    let mut editor = Editor::new(Workbook::new(), EditorConfig::default());
    editor.activate(addr(0, 0)).unwrap();
    editor.type_text("first").unwrap();
    editor.activate(addr(0, 1)).unwrap();

    assert_eq!(
        editor.workbook().grid.get(&addr(0, 0)),
        CellValue::text("first")
    );
    let session = editor.session().unwrap();
    assert_eq!(session.address(), addr(0, 1));
    assert_eq!(editor.selection().active_address(), addr(0, 1));
}

#[test]
fn reactivation_cancels_the_previous_session() {
    let config = EditorConfig {
        reactivate_policy: ReactivatePolicy::Cancel,
        ..EditorConfig::default()
    };
    let mut editor = Editor::new(Workbook::new(), config);
    editor.activate(addr(0, 0)).unwrap();
    editor.type_text("discarded").unwrap();
    editor.activate(addr(5, 5)).unwrap();

    assert!(editor.workbook().grid.is_empty());
    assert_eq!(editor.session().unwrap().address(), addr(5, 5));
    assert_eq!(editor.session().unwrap().draft(), "");
}

#[test]
fn grid_mutation_settles_the_open_edit_first() {
    let mut editor = Editor::new(Workbook::new(), EditorConfig::default());
    let items = vec![CellValue::text("a"), CellValue::text("b")];
    editor
        .set_value(addr(0, 0), CellValue::repetition(Orientation::Row, items))
        .unwrap();
    editor.activate(addr(0, 1)).unwrap();
    editor.type_text("!").unwrap();

    editor.set_value(addr(0, 0), CellValue::text("flat")).unwrap();
    assert!(!editor.is_editing());
    assert_eq!(editor.workbook().grid.get(&addr(0, 0)), CellValue::text("flat"));

    editor.undo().unwrap();
    assert_eq!(
        editor.workbook().grid.get(&addr(0, 0)),
        CellValue::repetition(
            Orientation::Row,
            vec![CellValue::text("a"), CellValue::text("b!")]
        )
    );
}

#[test]
fn inserting_a_row_commits_the_member_being_edited() {
    let mut editor = Editor::new(Workbook::new(), EditorConfig::default());
    let items = vec![CellValue::text("a"), CellValue::text("b")];
    editor
        .set_value(addr(0, 0), CellValue::repetition(Orientation::Column, items))
        .unwrap();
    editor.activate(addr(1, 0)).unwrap();
    editor.type_text("X").unwrap();

    editor.insert_row(SheetId(0), 1).unwrap();
    assert!(!editor.is_editing());
    let CellValue::Repetition { items, .. } = editor.workbook().grid.get(&addr(0, 0)) else {
        panic!("repetition should survive the insert");
    };
    assert_eq!(items.len(), 3);
    assert_eq!(items.first(), Some(&CellValue::text("a")));
    assert_eq!(items.last(), Some(&CellValue::text("bX")));
}

#[test]
fn cancel_policy_drops_the_draft_before_a_resize() {
    let config = EditorConfig {
        reactivate_policy: ReactivatePolicy::Cancel,
        ..EditorConfig::default()
    };
    let mut editor = Editor::new(Workbook::new(), config);
    let items = vec![CellValue::number("1"), CellValue::number("2")];
    editor
        .set_value(addr(0, 0), CellValue::repetition(Orientation::Column, items))
        .unwrap();
    editor.activate(addr(0, 0)).unwrap();
    editor.type_text("9").unwrap();

    editor.resize(addr(0, 0), 3, false).unwrap();
    assert!(!editor.is_editing());
    assert_eq!(
        editor.workbook().grid.get(&addr(0, 0)),
        CellValue::repetition(
            Orientation::Column,
            vec![CellValue::number("1"), CellValue::number("2"), CellValue::Empty]
        )
    );
}

#[test]
fn resize_of_a_plain_value_is_refused() {
    let mut editor = Editor::new(Workbook::new(), EditorConfig::default());
    editor.set_value(addr(0, 0), CellValue::text("x")).unwrap();
    let err = editor.resize(addr(0, 0), 2, false).unwrap_err();
    assert!(matches!(
        err,
        IseError::Grid(GridError::NotARepetition { .. })
    ));
}

#[test]
fn unchanged_commit_keeps_formula_text_and_composites() {
    let mut editor = Editor::new(Workbook::new(), EditorConfig::default());
    let values = [
        (addr(0, 0), CellValue::formula("SUM")),
        (addr(1, 0), CellValue::text("007")),
        (
            addr(2, 0),
            CellValue::variant(
                "list",
                CellValue::repetition(
                    Orientation::Row,
                    vec![CellValue::text("a"), CellValue::text("b")],
                ),
            ),
        ),
    ];
    for (address, value) in &values {
        editor.set_value(*address, value.clone()).unwrap();
    }

    for (address, value) in &values {
        editor.activate(*address).unwrap();
        editor.commit().unwrap();
        assert_eq!(&editor.workbook().grid.get(address), value);
    }
    for _ in 0..values.len() {
        editor.undo().unwrap();
    }
    assert!(editor.workbook().grid.is_empty());
    assert!(matches!(editor.undo(), Err(IseError::NothingToUndo)));
}

#[test]
fn unchanged_reactivation_keeps_values() {
    let mut editor = Editor::new(Workbook::new(), EditorConfig::default());
    editor.set_value(addr(0, 0), CellValue::formula("SUM")).unwrap();
    editor.set_value(addr(0, 1), CellValue::text("007")).unwrap();

    editor.activate(addr(0, 0)).unwrap();
    editor.activate(addr(0, 1)).unwrap();
    editor.activate(addr(5, 5)).unwrap();
    assert_eq!(editor.workbook().grid.get(&addr(0, 0)), CellValue::formula("SUM"));
    assert_eq!(editor.workbook().grid.get(&addr(0, 1)), CellValue::text("007"));
}

#[test]
fn walking_a_repetition_while_editing_items() {
    let mut editor = Editor::new(Workbook::new(), EditorConfig::default());
    let items = vec![CellValue::number("1"), CellValue::number("2")];
    editor
        .set_value(addr(1, 1), CellValue::repetition(Orientation::Row, items))
        .unwrap();

    editor.activate(addr(1, 1)).unwrap();
    editor.cancel().unwrap();
    editor.move_focus(Direction::NextInRepetition, false);
    assert_eq!(editor.selection().active_address(), addr(1, 2));
    editor.move_focus(Direction::NextInRepetition, false);
    assert_eq!(editor.selection().active_address(), addr(1, 1));

    editor.activate(addr(1, 2)).unwrap();
    editor.backspace().unwrap();
    editor.type_text("20").unwrap();
    editor.commit().unwrap();
    assert_eq!(
        editor.workbook().grid.get(&addr(1, 1)),
        CellValue::repetition(
            Orientation::Row,
            vec![CellValue::number("1"), CellValue::number("20")]
        )
    );
}
