//! Terminal table rendering.

use crate::aggregator::FunctionStats;
use crate::parser::schema::{row_cells, REPORT_COLUMNS};
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Color, ContentArrangement, Row, Table};

/// Render ranked rows as a table
///
/// The caller decides how many rows to pass; nothing is truncated here.
pub fn render_table(rows: &[FunctionStats]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(Row::from(
            REPORT_COLUMNS
                .iter()
                .map(|title| Cell::new(title).fg(Color::Cyan))
                .collect::<Vec<_>>(),
        ));

    for stats in rows {
        table.add_row(Row::from(
            row_cells(stats)
                .into_iter()
                .map(|cell| Cell::new(cell).set_alignment(CellAlignment::Left))
                .collect::<Vec<_>>(),
        ));
    }

    table.to_string()
}
