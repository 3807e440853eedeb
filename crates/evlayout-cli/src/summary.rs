use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use evlayout_core::{BatchReport, CompiledBatch};
use evlayout_model::{CapacityMap, Schema};

use crate::commands::CompileResult;

pub fn print_summary(result: &CompileResult) {
    println!("Events: {}", result.input.display());
    if let Some(path) = &result.output {
        println!("Output: {}", path.display());
    }
    println!("Common root: {}", result.options.common_root);

    println!("{}", report_table(&result.batch));
    if !result.batch.capacities.is_empty() {
        println!();
        println!("Sequence capacities:");
        println!("{}", capacity_table(&result.batch.capacities));
    }
}

pub fn print_schema(batch: &CompiledBatch) {
    println!("{}", schema_table(batch.array.schema()));
    println!("Slot size: {} bytes", batch.array.schema().slot_size());
}

fn report_table(batch: &CompiledBatch) -> Table {
    let report: &BatchReport = &batch.report;
    let mut table = Table::new();
    table.set_header(vec![header_cell("Metric"), header_cell("Value")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);

    table.add_row(vec![Cell::new("Input records"), Cell::new(report.input_records)]);
    table.add_row(vec![
        Cell::new("Dropped without EEG"),
        count_cell(report.dropped_without_eeg, Color::Yellow),
    ]);
    table.add_row(vec![
        Cell::new("Output slots")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(report.output_records()).add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![Cell::new("Fields"), Cell::new(batch.array.schema().len())]);
    table.add_row(vec![
        Cell::new("Slot size (bytes)"),
        Cell::new(batch.array.schema().slot_size()),
    ]);
    table.add_row(vec![
        Cell::new("Paths rewritten"),
        count_cell(report.paths_rewritten, Color::Green),
    ]);
    match &report.sanitize {
        Some(sanitize) => {
            table.add_row(vec![
                Cell::new("NaN replaced"),
                count_cell(sanitize.replaced, Color::Green),
            ]);
            let skipped = if sanitize.skipped.is_empty() {
                dim_cell("-")
            } else {
                Cell::new(sanitize.skipped.join(", ")).fg(Color::DarkGrey)
            };
            table.add_row(vec![Cell::new("Fields not sanitized"), skipped]);
        }
        None => {
            table.add_row(vec![Cell::new("NaN replaced"), dim_cell("off")]);
        }
    }
    table
}

fn capacity_table(capacities: &CapacityMap) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Field"),
        header_cell("Element"),
        header_cell("Capacity"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for (name, capacity) in capacities.iter() {
        let element = match &capacity.element {
            Some(element) => Cell::new(element),
            None => dim_cell(format!("{} (all empty)", capacity.element_type())),
        };
        table.add_row(vec![Cell::new(name), element, Cell::new(capacity.max_len)]);
    }
    table
}

fn schema_table(schema: &Schema) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Field"),
        header_cell("Type"),
        header_cell("Bytes"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for field in schema.fields() {
        table.add_row(vec![
            Cell::new(&field.name)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(&field.field_type),
            Cell::new(field.field_type.byte_width()),
        ]);
    }
    table
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
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
