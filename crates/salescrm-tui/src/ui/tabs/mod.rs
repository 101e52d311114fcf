//! Panel rendering, one module per dashboard.

pub mod admin;
pub mod agent;
pub mod super_admin;

use ratatui::{
    layout::{Constraint, Rect},
    widgets::{Block, Borders, Paragraph, Row, Table, TableState},
    Frame,
};

use salescrm_core::panel::ResourceList;

use crate::ui::styles;

/// Draw `list` as a table with the selected row highlighted, or a
/// placeholder while it is loading or empty.
#[allow(clippy::too_many_arguments)]
pub(crate) fn render_list_table<T>(
    frame: &mut Frame,
    area: Rect,
    list: &ResourceList<T>,
    title: &str,
    hints: &str,
    header: Row<'static>,
    widths: &[Constraint],
    row: impl Fn(&T) -> Row<'static>,
) {
    let block = Block::default()
        .title(format!(" {} ({}) - {} ", title, list.len(), hints))
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    if list.is_empty() {
        let placeholder = if list.is_loaded() {
            format!("No {}", list.name())
        } else {
            "Loading...".to_string()
        };
        let paragraph = Paragraph::new(format!(" {}", placeholder))
            .style(styles::muted_style())
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let rows: Vec<Row> = list.items().iter().map(row).collect();

    let table = Table::new(rows, widths.to_vec())
        .header(header.style(styles::title_style()).height(1))
        .block(block)
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(list.selected_index()));

    frame.render_stateful_widget(table, area, &mut state);
}
