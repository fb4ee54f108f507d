//! Cell assembly: place clustered fragments on the row × column grid.

use super::columns::ColumnResolution;
use super::rows::RowGroup;
use super::types::{Cell, Table};

/// Build the table from rows and their resolved column assignments.
///
/// Fragments landing in the same cell are joined with a single space in
/// left-to-right order; OCR engines often split one cell's text into several
/// detections. Slots without a fragment stay empty.
pub fn assemble_table(rows: Vec<RowGroup>, resolution: &ColumnResolution) -> Table {
    let column_count = resolution.column_count();

    let grid = rows
        .into_iter()
        .zip(&resolution.assignments)
        .map(|(row, columns)| {
            let mut cells = vec![Cell::empty(); column_count];

            for (fragment, &column) in row.into_fragments().into_iter().zip(columns) {
                let cell = &mut cells[column.min(column_count - 1)];

                if cell.fragment_count == 0 {
                    cell.text = fragment.text;
                    cell.confidence = fragment.confidence;
                } else {
                    if !fragment.text.is_empty() {
                        if !cell.text.is_empty() {
                            cell.text.push(' ');
                        }
                        cell.text.push_str(&fragment.text);
                    }
                    cell.confidence = cell.confidence.min(fragment.confidence);
                }
                cell.fragment_count += 1;
            }

            cells
        })
        .collect();

    let table = Table::from_rows(grid);

    tracing::debug!(
        "Assembled table: {} rows x {} columns",
        table.row_count(),
        table.column_count()
    );

    table
}
