use crate::language::LanguageRow;
use comfy_table::{presets::UTF8_FULL_CONDENSED, CellAlignment, ContentArrangement, Table};
use owo_colors::OwoColorize;
use serde::Serialize;

pub fn output<T: Serialize + ?Sized>(json_mode: bool, data: &T, render_table: impl FnOnce(&T)) {
    if json_mode {
        match serde_json::to_string_pretty(data) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("{} Failed to serialize JSON: {e}", "error:".red().bold()),
        }
    } else {
        render_table(data);
    }
}

pub fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers);
    table
}

/// Language | <value_header> | Percentage, one row per entry in the given order.
pub fn language_table(
    value_header: &str,
    rows: &[LanguageRow],
    format_value: impl Fn(u64) -> String,
) -> Table {
    let mut table = new_table(&["Language", value_header, "Percentage"]);
    for row in rows {
        table.add_row(vec![
            row.language.clone(),
            format_value(row.value),
            format!("{}%", row.percentage),
        ]);
    }
    for column in 1..=2 {
        if let Some(col) = table.column_mut(column) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }
    table
}

pub fn section_header(title: &str) {
    println!("\n{}", title.cyan().bold());
    println!("{}", "─".repeat(title.chars().count()).cyan());
}

pub fn info(msg: &str) {
    eprintln!("{} {msg}", "info:".blue().bold());
}

pub fn warn(msg: &str) {
    eprintln!("{} {msg}", "warning:".yellow().bold());
}

pub fn error(msg: &str) {
    eprintln!("{} {msg}", "error:".red().bold());
}
