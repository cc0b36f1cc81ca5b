//! Table component drawing a table page through the theme

use ratatui::{
    layout::{Alignment as LineAlignment, Constraint, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Cell as TableCell, Row, Table, TableState},
    Frame,
};

use crate::table::{Alignment, CellView, HeaderView, RowView, TablePage, TableRecord};
use crate::tui::ui::{truncate_to_width, Theme};

const SORT_ASCENDING: &str = " ▲";
const SORT_DESCENDING: &str = " ▼";
const EXPANSION_INDENT: &str = "    ";

fn line_alignment(align: Alignment) -> LineAlignment {
    match align {
        Alignment::Left => LineAlignment::Left,
        Alignment::Center => LineAlignment::Center,
        Alignment::Right => LineAlignment::Right,
    }
}

/// Relative column weights as layout constraints
pub fn column_constraints(headers: &[HeaderView]) -> Vec<Constraint> {
    let total: u32 = headers.iter().map(|h| u32::from(h.width)).sum();
    headers
        .iter()
        .map(|h| Constraint::Ratio(u32::from(h.width), total.max(1)))
        .collect()
}

pub fn header_line(header: &HeaderView, theme: &Theme) -> Line<'static> {
    let mut spans = vec![Span::raw(header.title.clone())];
    let style = if header.is_selected {
        let arrow = if header.is_ascending {
            SORT_ASCENDING
        } else {
            SORT_DESCENDING
        };
        spans.push(Span::raw(arrow));
        theme.sorted_header()
    } else {
        theme.header()
    };
    let mut line = Line::from(spans).alignment(line_alignment(header.align));
    line.style = style;
    line
}

/// Render one resolved cell as a styled line
pub fn cell_line(view: &CellView, align: Alignment, theme: &Theme) -> Line<'static> {
    let line = match view {
        CellView::Text(content) => Line::from(content.clone()),
        CellView::Editable {
            value,
            is_read_only: true,
            ..
        } => Line::from(value.clone()),
        CellView::Editable {
            value,
            is_editing: false,
            ..
        } => Line::from(Span::styled(value.clone(), theme.editable())),
        CellView::Editable { value, cursor, .. } => editing_line(value, *cursor, theme),
        CellView::Checkable { icon, state } => {
            Line::from(Span::styled(icon.clone(), theme.check(*state)))
        }
        CellView::Custom(line) => line.clone(),
    };
    line.alignment(line_alignment(align))
}

/// The character under the cursor is drawn reversed
fn editing_line(value: &str, cursor: usize, theme: &Theme) -> Line<'static> {
    let before: String = value.chars().take(cursor).collect();
    let at: String = value.chars().skip(cursor).take(1).collect();
    let after: String = value.chars().skip(cursor + 1).collect();
    let at = if at.is_empty() { " ".to_string() } else { at };
    Line::from(vec![
        Span::styled(before, theme.editing()),
        Span::styled(at, theme.editing().add_modifier(Modifier::REVERSED)),
        Span::styled(after, theme.editing()),
    ])
}

/// Plain text of a resolved cell, for non-interactive output
pub fn cell_text(view: &CellView) -> String {
    match view {
        CellView::Text(content) => content.clone(),
        CellView::Editable { value, .. } => value.clone(),
        CellView::Checkable { icon, .. } => icon.clone(),
        CellView::Custom(line) => line.spans.iter().map(|s| s.content.as_ref()).collect(),
    }
}

/// Build the display rows. Expanded rows are followed by one row per expansion line.
/// Returns the rows and the display index of the cursor row.
fn display_rows(
    headers: &[HeaderView],
    rows: &[RowView],
    cursor: usize,
    theme: &Theme,
) -> (Vec<Row<'static>>, Option<usize>) {
    let mut display = Vec::new();
    let mut cursor_index = None;

    for row in rows {
        if row.index == cursor {
            cursor_index = Some(display.len());
        }
        let cells: Vec<TableCell> = row
            .cells
            .iter()
            .zip(headers)
            .map(|(view, header)| TableCell::from(cell_line(view, header.align, theme)))
            .collect();
        display.push(Row::new(cells).style(theme.row(row.index)));

        if let Some(expansion) = &row.expansion {
            for line in &expansion.lines {
                let mut spans = vec![Span::raw(EXPANSION_INDENT)];
                spans.extend(line.spans.iter().cloned());
                display.push(
                    Row::new(vec![TableCell::from(Line::from(spans))])
                        .style(theme.row(row.index).add_modifier(Modifier::ITALIC)),
                );
            }
        }
    }
    (display, cursor_index)
}

/// Draw `page` as a bordered table with its cursor row highlighted
pub fn render_table_page<R: TableRecord>(
    f: &mut Frame,
    area: Rect,
    page: &TablePage<R>,
    title: &str,
    theme: &Theme,
) {
    let headers = page.header();
    let rows = page.rows();
    let (display, cursor_index) = display_rows(&headers, &rows, page.cursor(), theme);

    let title = if rows.is_empty() {
        format!("{} (Empty)", title)
    } else {
        format!("{} ({})", title, rows.len())
    };
    let header = Row::new(
        headers
            .iter()
            .map(|h| TableCell::from(header_line(h, theme)))
            .collect::<Vec<_>>(),
    )
    .style(theme.header())
    .bottom_margin(1);

    let table = Table::new(display, column_constraints(&headers))
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(theme.active_border()),
        )
        .style(theme.page())
        .highlight_style(theme.cursor_row());

    let mut state = TableState::default();
    state.select(cursor_index);
    f.render_stateful_widget(table, area, &mut state);
}

/// Fixed-width plain text rendering of the visible rows
pub fn format_plain_table<R: TableRecord>(page: &TablePage<R>, column_width: usize) -> String {
    let headers = page.header();
    let pad = |s: &str| format!("{:<width$}", truncate_to_width(s, column_width), width = column_width);

    let mut out = String::new();
    let header: Vec<String> = headers.iter().map(|h| pad(&h.title)).collect();
    out.push_str(header.join(" ").trim_end());
    out.push('\n');
    out.push_str(&"-".repeat((column_width + 1) * headers.len()));
    out.push('\n');

    for row in page.rows() {
        let cells: Vec<String> = row.cells.iter().map(|view| pad(&cell_text(view))).collect();
        out.push_str(cells.join(" ").trim_end());
        out.push('\n');
    }
    out
}
