use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use badea_core::{ActivityReport, QueryStage};

use crate::types::{ActivityListing, RunOutcome};

pub fn print_run_summary(outcome: &RunOutcome) {
    for report in &outcome.reports {
        print_activity_report(report);
    }
    if !outcome.aborted.is_empty() {
        eprintln!("Aborted activities:");
        for aborted in &outcome.aborted {
            eprintln!("- {}: {}", aborted.activity, aborted.message);
        }
    }
}

fn print_activity_report(report: &ActivityReport) {
    println!("Activity: {}", report.activity);
    if let Some(configuration) = &report.configuration {
        println!(
            "Groups: {}  Variables: {}",
            configuration.groups.len(),
            configuration.variables.join(", ")
        );
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Query"),
        header_cell("Title"),
        header_cell("Rows"),
        header_cell("Columns"),
        header_cell("Stage"),
        header_cell("Source"),
        header_cell("Hierarchies fetched"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Center);
    align_column(&mut table, 5, CellAlignment::Center);
    align_column(&mut table, 6, CellAlignment::Right);

    let mut total_rows = 0usize;
    for query in &report.queries {
        total_rows += query.rows;
        table.add_row(vec![
            Cell::new(query.id.as_str())
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(&query.title),
            Cell::new(query.rows),
            Cell::new(query.columns),
            stage_cell(query.stage),
            if query.cached {
                dim_cell("cache")
            } else {
                Cell::new("api").fg(Color::Green)
            },
            count_cell(query.hierarchies_fetched, Color::Green),
        ]);
    }
    for failure in &report.failures {
        table.add_row(vec![
            Cell::new(failure.id.as_str())
                .fg(Color::Red)
                .add_attribute(Attribute::Bold),
            Cell::new("FAILED").fg(Color::Red),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(format!("{} queries", report.queries.len()))
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(total_rows).add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
    ]);
    println!("{table}");

    if !report.merged.is_empty() {
        let mut merged = Table::new();
        merged.set_header(vec![
            header_cell("Group"),
            header_cell("Original rows"),
            header_cell("Extended rows"),
        ]);
        apply_table_style(&mut merged);
        align_column(&mut merged, 1, CellAlignment::Right);
        align_column(&mut merged, 2, CellAlignment::Right);
        for group in &report.merged {
            merged.add_row(vec![
                Cell::new(&group.group_id),
                Cell::new(group.original_rows),
                group.extended_rows.map_or_else(|| dim_cell("-"), Cell::new),
            ]);
        }
        println!("{merged}");
    }

    if !report.codelists.is_empty() {
        println!("Code lists: {}", report.codelists.join(", "));
    }

    if !report.consistency.is_empty() {
        let mut warnings = Table::new();
        warnings.set_header(vec![
            header_cell("Group"),
            header_cell("Query"),
            header_cell("Missing columns"),
        ]);
        apply_table_style(&mut warnings);
        for warning in &report.consistency {
            let missing: Vec<&str> = warning
                .union
                .difference(&warning.columns)
                .map(String::as_str)
                .collect();
            warnings.add_row(vec![
                Cell::new(&warning.title),
                Cell::new(&warning.query_id).fg(Color::Yellow),
                Cell::new(missing.join(", ")),
            ]);
        }
        println!("Inconsistent groups:");
        println!("{warnings}");
    }

    if !report.failures.is_empty() {
        eprintln!("Failed queries:");
        for failure in &report.failures {
            eprintln!("- {}: {}", failure.id, failure.message);
        }
    }
}

pub fn print_activities(listing: &[ActivityListing]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Activity"),
        header_cell("Category"),
        header_cell("Subcategory"),
        header_cell("Queries"),
        header_cell("Data actions"),
        header_cell("Activity actions"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Right);
    for activity in listing {
        table.add_row(vec![
            Cell::new(&activity.name)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(&activity.category),
            activity
                .subcategory
                .as_deref()
                .map_or_else(|| dim_cell("-"), Cell::new),
            Cell::new(activity.queries),
            Cell::new(activity.data_actions.join(", ")),
            Cell::new(activity.activity_actions.join(", ")),
        ]);
    }
    println!("{table}");
}

pub fn print_default_ids(ids: &[(String, Option<String>)]) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Description"), header_cell("Identifier")]);
    apply_table_style(&mut table);
    for (description, id) in ids {
        table.add_row(vec![
            Cell::new(description),
            id.as_deref().map_or_else(|| dim_cell("-"), Cell::new),
        ]);
    }
    println!("{table}");
}

fn stage_cell(stage: QueryStage) -> Cell {
    match stage {
        QueryStage::Extended => Cell::new(stage).fg(Color::Green),
        QueryStage::Refined => Cell::new(stage),
        QueryStage::Long => dim_cell(stage),
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
