//! Searchable, sortable table page over the object store
//!
//! A [`TablePage`] owns the search term, sort column and direction, the selection and
//! expansion sets, and the visible rows. Everything domain specific comes from the
//! capability bundle handed to [`TablePageBuilder`]: the data query, the cell renderer,
//! and optional row-press, end-editing and expansion hooks. A missing hook disables the
//! matching interaction.

use std::collections::BTreeSet;

use ratatui::text::Text;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tracing::{debug, warn};

use super::cell::{Cell, InputConstraints};
use super::column::Column;
use super::errors::TableError;
use super::focus::{FocusController, FocusHandle};
use super::input::InputField;
use super::render::{cell_view, CellView, HeaderView, RowView};
use crate::database::{ChangeType, Database, DatabaseError, ListenerId};
use crate::models::{RecordId, RecordType};

/// A row a table page can display
pub trait TableRecord: Clone + 'static {
    fn id(&self) -> &RecordId;
}

/// Inputs of the data query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataQuery {
    pub search_term: String,
    pub sort_by: Option<String>,
    pub is_ascending: bool,
}

/// Side effect requested by a row-press hook
#[derive(Debug, Clone, PartialEq)]
pub enum PageAction {
    None,
    /// Open the edit view of the record
    Navigate(RecordId),
    SetStatus(String),
}

/// Change notification as queued for the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseEvent {
    pub change_type: ChangeType,
    pub record_type: RecordType,
}

pub type QueryFn<R> = Box<dyn Fn(&Database, &DataQuery) -> Result<Vec<R>, DatabaseError>>;
pub type RenderCellFn<R> = Box<dyn Fn(&str, &R) -> Cell>;
pub type RowPressFn<R> = Box<dyn FnMut(&Database, &R) -> anyhow::Result<PageAction>>;
pub type EndEditingFn<R> = Box<dyn FnMut(&Database, &str, &R, &str) -> anyhow::Result<()>>;
pub type ExpansionFn<R> = Box<dyn Fn(&R) -> Text<'static>>;

struct Capabilities<R> {
    get_updated_data: QueryFn<R>,
    render_cell: RenderCellFn<R>,
    on_row_press: Option<RowPressFn<R>>,
    on_end_editing: Option<EndEditingFn<R>>,
    on_render_expansion: Option<ExpansionFn<R>>,
}

struct Subscription {
    listener_id: ListenerId,
    events: UnboundedReceiver<DatabaseEvent>,
}

struct EditSession {
    handle: FocusHandle,
    input: InputField,
    constraints: InputConstraints,
}

/// Collects the columns and capabilities of a table page
pub struct TablePageBuilder<R> {
    database: Database,
    columns: Vec<Column>,
    watched_types: Vec<RecordType>,
    sort_by: Option<String>,
    is_ascending: bool,
    get_updated_data: Option<QueryFn<R>>,
    render_cell: Option<RenderCellFn<R>>,
    on_row_press: Option<RowPressFn<R>>,
    on_end_editing: Option<EndEditingFn<R>>,
    on_render_expansion: Option<ExpansionFn<R>>,
}

impl<R: TableRecord> TablePageBuilder<R> {
    pub fn columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    /// Record types whose change notifications trigger a refresh
    pub fn watched_types(mut self, types: &[RecordType]) -> Self {
        self.watched_types = types.to_vec();
        self
    }

    pub fn default_sort(mut self, key: &str, is_ascending: bool) -> Self {
        self.sort_by = Some(key.to_string());
        self.is_ascending = is_ascending;
        self
    }

    pub fn get_updated_data<F>(mut self, f: F) -> Self
    where
        F: Fn(&Database, &DataQuery) -> Result<Vec<R>, DatabaseError> + 'static,
    {
        self.get_updated_data = Some(Box::new(f));
        self
    }

    pub fn render_cell<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &R) -> Cell + 'static,
    {
        self.render_cell = Some(Box::new(f));
        self
    }

    pub fn on_row_press<F>(mut self, f: F) -> Self
    where
        F: FnMut(&Database, &R) -> anyhow::Result<PageAction> + 'static,
    {
        self.on_row_press = Some(Box::new(f));
        self
    }

    pub fn on_end_editing<F>(mut self, f: F) -> Self
    where
        F: FnMut(&Database, &str, &R, &str) -> anyhow::Result<()> + 'static,
    {
        self.on_end_editing = Some(Box::new(f));
        self
    }

    pub fn on_render_expansion<F>(mut self, f: F) -> Self
    where
        F: Fn(&R) -> Text<'static> + 'static,
    {
        self.on_render_expansion = Some(Box::new(f));
        self
    }

    /// Validate the configuration. Missing collaborators are programming errors.
    pub fn build(self) -> Result<TablePage<R>, TableError> {
        let get_updated_data = self
            .get_updated_data
            .ok_or(TableError::MissingCollaborator("get_updated_data"))?;
        let render_cell = self
            .render_cell
            .ok_or(TableError::MissingCollaborator("render_cell"))?;

        if self.columns.is_empty() {
            return Err(TableError::NoColumns);
        }
        if let Some(key) = &self.sort_by {
            if !self.columns.iter().any(|column| &column.key == key) {
                return Err(TableError::UnknownColumn(key.clone()));
            }
        }

        Ok(TablePage {
            database: self.database,
            columns: self.columns,
            watched_types: self.watched_types,
            capabilities: Capabilities {
                get_updated_data,
                render_cell,
                on_row_press: self.on_row_press,
                on_end_editing: self.on_end_editing,
                on_render_expansion: self.on_render_expansion,
            },
            search_term: String::new(),
            sort_by: self.sort_by,
            is_ascending: self.is_ascending,
            selection: BTreeSet::new(),
            expanded_rows: BTreeSet::new(),
            visible_rows: Vec::new(),
            cursor: 0,
            editing: None,
            subscription: None,
        })
    }
}

/// Generic table page state machine
pub struct TablePage<R: TableRecord> {
    database: Database,
    columns: Vec<Column>,
    watched_types: Vec<RecordType>,
    capabilities: Capabilities<R>,
    search_term: String,
    sort_by: Option<String>,
    is_ascending: bool,
    selection: BTreeSet<RecordId>,
    expanded_rows: BTreeSet<RecordId>,
    visible_rows: Vec<R>,
    cursor: usize,
    editing: Option<EditSession>,
    subscription: Option<Subscription>,
}

impl<R: TableRecord> TablePage<R> {
    pub fn builder(database: Database) -> TablePageBuilder<R> {
        TablePageBuilder {
            database,
            columns: Vec::new(),
            watched_types: Vec::new(),
            sort_by: None,
            is_ascending: true,
            get_updated_data: None,
            render_cell: None,
            on_row_press: None,
            on_end_editing: None,
            on_render_expansion: None,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn sort_by(&self) -> Option<&str> {
        self.sort_by.as_deref()
    }

    pub fn is_ascending(&self) -> bool {
        self.is_ascending
    }

    pub fn selection(&self) -> &BTreeSet<RecordId> {
        &self.selection
    }

    pub fn expanded_rows(&self) -> &BTreeSet<RecordId> {
        &self.expanded_rows
    }

    pub fn visible_rows(&self) -> &[R] {
        &self.visible_rows
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn cursor_row(&self) -> Option<&R> {
        self.visible_rows.get(self.cursor)
    }

    /// Current position of the record with `id`
    pub fn row_of(&self, id: &RecordId) -> Option<usize> {
        self.visible_rows.iter().position(|record| record.id() == id)
    }

    fn record(&self, id: &RecordId) -> Option<&R> {
        self.visible_rows.iter().find(|record| record.id() == id)
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn has_expansion(&self) -> bool {
        self.capabilities.on_render_expansion.is_some()
    }

    pub fn query(&self) -> DataQuery {
        DataQuery {
            search_term: self.search_term.clone(),
            sort_by: self.sort_by.clone(),
            is_ascending: self.is_ascending,
        }
    }

    /// Subscribe to change notifications and load the first rows
    pub fn mount(&mut self) -> Result<(), TableError> {
        if self.subscription.is_none() {
            let (sender, events) = unbounded_channel();
            let listener_id = self.database.add_listener(move |change_type, record_type| {
                // The receiver is gone once the page unmounts
                let _ = sender.send(DatabaseEvent {
                    change_type,
                    record_type,
                });
            });
            debug!("Table page mounted with listener {:?}", listener_id);
            self.subscription = Some(Subscription {
                listener_id,
                events,
            });
        }
        self.refresh()
    }

    pub fn unmount(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            self.database.remove_listener(subscription.listener_id);
            debug!("Table page unmounted listener {:?}", subscription.listener_id);
        }
    }

    /// Replace the visible rows with a fresh query result.
    ///
    /// A failing query leaves the previous rows in place.
    pub fn refresh(&mut self) -> Result<(), TableError> {
        let query = self.query();
        let rows = match (self.capabilities.get_updated_data)(&self.database, &query) {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Refresh failed, keeping {} rows: {}", self.visible_rows.len(), e);
                return Err(TableError::Refresh(e));
            }
        };

        self.visible_rows = rows;
        if self.cursor >= self.visible_rows.len() {
            self.cursor = self.visible_rows.len().saturating_sub(1);
        }
        if let Some(session) = &self.editing {
            match self.row_of(&session.handle.record_id) {
                Some(row) => self.cursor = row,
                None => {
                    debug!("Edited record {} left the table, ending edit", session.handle.record_id);
                    self.editing = None;
                }
            }
        }
        Ok(())
    }

    /// Handle one change notification. Returns whether the page refreshed.
    pub fn on_database_event(
        &mut self,
        change_type: ChangeType,
        record_type: RecordType,
    ) -> Result<bool, TableError> {
        if !self.watched_types.contains(&record_type) {
            return Ok(false);
        }
        debug!("{:?} on {} triggers refresh", change_type, record_type.as_str());
        self.refresh()?;
        Ok(true)
    }

    /// Drain queued notifications, refreshing once per watched notification
    pub fn process_database_events(&mut self) -> Result<usize, TableError> {
        let mut events = Vec::new();
        if let Some(subscription) = &mut self.subscription {
            while let Ok(event) = subscription.events.try_recv() {
                events.push(event);
            }
        }

        // Every event is handled even after a failure; the first error is returned
        let mut refreshes = 0;
        let mut first_error = None;
        for event in events {
            match self.on_database_event(event.change_type, event.record_type) {
                Ok(true) => refreshes += 1,
                Ok(false) => {}
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(refreshes),
        }
    }

    pub fn on_search_change(&mut self, search_term: &str) -> Result<(), TableError> {
        self.search_term = search_term.to_string();
        self.cursor = 0;
        self.refresh()
    }

    /// Sort on `key`; pressing the current sort column flips the direction
    pub fn on_column_sort(&mut self, key: &str) -> Result<(), TableError> {
        if !self.columns.iter().any(|column| column.key == key) {
            return Err(TableError::UnknownColumn(key.to_string()));
        }

        if self.sort_by.as_deref() == Some(key) {
            self.is_ascending = !self.is_ascending;
        } else {
            self.sort_by = Some(key.to_string());
            self.is_ascending = true;
        }
        self.refresh()
    }

    /// Header press on the column at `index`. Non-sortable columns ignore it.
    pub fn on_header_press(&mut self, index: usize) -> Result<bool, TableError> {
        let key = match self.columns.get(index) {
            Some(column) if column.sortable => column.key.clone(),
            _ => return Ok(false),
        };
        self.on_column_sort(&key)?;
        Ok(true)
    }

    pub fn on_checkable_press(&mut self, record: &R) {
        let id = record.id().clone();
        Self::toggle(&mut self.selection, id);
    }

    pub fn on_expandable_press(&mut self, record: &R) {
        let id = record.id().clone();
        Self::toggle(&mut self.expanded_rows, id);
    }

    fn toggle(set: &mut BTreeSet<RecordId>, id: RecordId) {
        if !set.remove(&id) {
            set.insert(id);
        }
    }

    pub fn set_selection(&mut self, ids: impl IntoIterator<Item = RecordId>) {
        self.selection = ids.into_iter().collect();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Selected ids in a stable order
    pub fn selected_ids(&self) -> Vec<RecordId> {
        self.selection.iter().cloned().collect()
    }

    /// Press the row at `index`: expansion takes precedence over the row-press hook
    pub fn press_row(&mut self, index: usize) -> Result<PageAction, TableError> {
        let Some(record) = self.visible_rows.get(index).cloned() else {
            return Ok(PageAction::None);
        };

        if self.capabilities.on_render_expansion.is_some() {
            self.on_expandable_press(&record);
            return Ok(PageAction::None);
        }

        match self.capabilities.on_row_press.as_mut() {
            Some(hook) => Ok(hook(&self.database, &record)?),
            None => Ok(PageAction::None),
        }
    }

    pub fn press_cursor_row(&mut self) -> Result<PageAction, TableError> {
        self.press_row(self.cursor)
    }

    pub fn render_cell(&self, key: &str, record: &R) -> Cell {
        (self.capabilities.render_cell)(key, record)
    }

    /// Press the checkable cell at (`index`, `column_key`). Disabled cells ignore it.
    pub fn press_checkable(&mut self, index: usize, column_key: &str) -> bool {
        let Some(record) = self.visible_rows.get(index).cloned() else {
            return false;
        };
        match self.render_cell(column_key, &record) {
            Cell::Checkable(cell) if !cell.is_disabled => {
                self.on_checkable_press(&record);
                true
            }
            _ => false,
        }
    }

    /// First checkable column of the row at `index`
    pub fn checkable_column(&self, index: usize) -> Option<String> {
        let record = self.visible_rows.get(index)?;
        self.columns
            .iter()
            .find(|column| matches!(self.render_cell(&column.key, record), Cell::Checkable(_)))
            .map(|column| column.key.clone())
    }

    pub fn press_checkable_at_cursor(&mut self) -> bool {
        match self.checkable_column(self.cursor) {
            Some(key) => self.press_checkable(self.cursor, &key),
            None => false,
        }
    }

    pub fn move_cursor_up(&mut self) {
        if self.visible_rows.is_empty() {
            return;
        }
        self.cursor = if self.cursor == 0 {
            self.visible_rows.len() - 1
        } else {
            self.cursor - 1
        };
    }

    pub fn move_cursor_down(&mut self) {
        if self.visible_rows.is_empty() {
            return;
        }
        self.cursor = (self.cursor + 1) % self.visible_rows.len();
    }

    /// Move the cursor by `delta` rows, stopping at either end
    pub fn move_cursor_by(&mut self, delta: isize) {
        if self.visible_rows.is_empty() {
            return;
        }
        let last = self.visible_rows.len() - 1;
        self.cursor = if delta < 0 {
            self.cursor.saturating_sub(delta.unsigned_abs())
        } else {
            self.cursor.saturating_add(delta as usize).min(last)
        };
    }

    pub fn move_cursor_to_first(&mut self) {
        self.cursor = 0;
    }

    pub fn move_cursor_to_last(&mut self) {
        self.cursor = self.visible_rows.len().saturating_sub(1);
    }

    /// Start editing the cell at (`index`, `column_key`).
    ///
    /// Only editable cells of a page with an end-editing hook can be edited.
    pub fn begin_editing(&mut self, index: usize, column_key: &str) -> bool {
        if self.capabilities.on_end_editing.is_none() {
            return false;
        }
        let Some(record) = self.visible_rows.get(index) else {
            return false;
        };
        let record_id = record.id().clone();
        let Cell::Editable(editable) = self.render_cell(column_key, record) else {
            return false;
        };

        let mut input = InputField::new(column_key)
            .with_value(&editable.content)
            .with_keyboard(editable.constraints.keyboard);
        if editable.constraints.select_text_on_focus {
            input = input.select_all();
        }
        input.set_focus(true);

        self.cursor = index;
        self.editing = Some(EditSession {
            handle: FocusHandle {
                record_id,
                column_key: column_key.to_string(),
            },
            input,
            constraints: editable.constraints,
        });
        true
    }

    /// Edit the first editable cell of the cursor row
    pub fn begin_editing_at_cursor(&mut self) -> bool {
        let Some(record) = self.visible_rows.get(self.cursor) else {
            return false;
        };
        let key = self
            .columns
            .iter()
            .find(|column| self.render_cell(&column.key, record).is_editable())
            .map(|column| column.key.clone());
        match key {
            Some(key) => self.begin_editing(self.cursor, &key),
            None => false,
        }
    }

    pub fn edit_input(&mut self) -> Option<&mut InputField> {
        self.editing.as_mut().map(|session| &mut session.input)
    }

    pub fn cancel_editing(&mut self) {
        self.editing = None;
    }

    /// Hand the edited value to the end-editing hook, then follow the field's
    /// focus-next constraint. Returns whether another field took focus.
    pub fn submit_editing(&mut self) -> Result<bool, TableError> {
        let Some(session) = self.editing.take() else {
            return Ok(false);
        };
        let Some(record) = self.record(&session.handle.record_id).cloned() else {
            return Ok(false);
        };

        if let Some(hook) = self.capabilities.on_end_editing.as_mut() {
            hook(
                &self.database,
                &session.handle.column_key,
                &record,
                &session.input.value,
            )?;
        }

        // The next field is resolved against the rows as they are after the write
        self.process_database_events()?;
        if session.constraints.focus_next_field {
            if let Some(index) = self.handle_index(&session.handle) {
                return Ok(self.focus_next(index));
            }
        }
        Ok(false)
    }

    pub fn header(&self) -> Vec<HeaderView> {
        self.columns
            .iter()
            .map(|column| HeaderView {
                key: column.key.clone(),
                title: column.title.clone(),
                width: column.width,
                align: column.align,
                sortable: column.sortable,
                is_selected: self.sort_by.as_deref() == Some(column.key.as_str()),
                is_ascending: self.is_ascending,
            })
            .collect()
    }

    /// Render model of every visible row
    pub fn rows(&self) -> Vec<RowView> {
        let can_edit = self.capabilities.on_end_editing.is_some();
        let is_pressable = self.capabilities.on_render_expansion.is_some()
            || self.capabilities.on_row_press.is_some();

        self.visible_rows
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let is_selected = self.selection.contains(record.id());
                let cells = self
                    .columns
                    .iter()
                    .map(|column| {
                        let view = cell_view(self.render_cell(&column.key, record), is_selected, can_edit);
                        self.overlay_editing(record.id(), &column.key, view)
                    })
                    .collect();

                let is_expanded = self.expanded_rows.contains(record.id());
                let expansion = match (&self.capabilities.on_render_expansion, is_expanded) {
                    (Some(render), true) => Some(render(record)),
                    _ => None,
                };

                RowView {
                    id: record.id().clone(),
                    index,
                    cells,
                    is_expanded,
                    expansion,
                    is_pressable,
                }
            })
            .collect()
    }

    fn overlay_editing(&self, id: &RecordId, column_key: &str, view: CellView) -> CellView {
        match (&self.editing, view) {
            (Some(session), CellView::Editable { is_read_only, .. })
                if &session.handle.record_id == id && session.handle.column_key == column_key =>
            {
                CellView::Editable {
                    value: session.input.value.clone(),
                    is_editing: true,
                    cursor: session.input.cursor_position,
                    is_read_only,
                }
            }
            (_, view) => view,
        }
    }
}

impl<R: TableRecord> FocusController for TablePage<R> {
    fn focus_handles(&self) -> Vec<FocusHandle> {
        if self.capabilities.on_end_editing.is_none() {
            return Vec::new();
        }
        let mut handles = Vec::new();
        for record in &self.visible_rows {
            for column in &self.columns {
                if self.render_cell(&column.key, record).is_editable() {
                    handles.push(FocusHandle {
                        record_id: record.id().clone(),
                        column_key: column.key.clone(),
                    });
                }
            }
        }
        handles
    }

    fn focus(&mut self, index: usize) -> bool {
        let Some(handle) = self.focus_handles().into_iter().nth(index) else {
            return false;
        };
        match self.row_of(&handle.record_id) {
            Some(row) => self.begin_editing(row, &handle.column_key),
            None => false,
        }
    }
}

impl<R: TableRecord> Drop for TablePage<R> {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TransactionItem, User};
    use crate::table::{CheckableCell, Column};
    use std::cell::{Cell as Counter, RefCell};
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: RecordId,
        serial_number: String,
        quantity: u32,
    }

    impl TableRecord for Row {
        fn id(&self) -> &RecordId {
            &self.id
        }
    }

    fn row(id: &str, serial_number: &str) -> Row {
        Row {
            id: RecordId::from(id),
            serial_number: serial_number.to_string(),
            quantity: 1,
        }
    }

    type Source = Rc<RefCell<Vec<Row>>>;

    fn builder(source: &Source, calls: &Rc<Counter<usize>>) -> TablePageBuilder<Row> {
        let source = Rc::clone(source);
        let calls = Rc::clone(calls);
        TablePage::builder(Database::new())
            .columns(vec![
                Column::new("serialNumber", "Number", 1).sortable(),
                Column::new("quantity", "Quantity", 1),
                Column::new("remove", "Remove", 1),
            ])
            .watched_types(&[RecordType::TransactionItem])
            .get_updated_data(move |_, query| {
                calls.set(calls.get() + 1);
                let mut rows: Vec<Row> = source
                    .borrow()
                    .iter()
                    .filter(|r| r.serial_number.starts_with(&query.search_term))
                    .cloned()
                    .collect();
                if query.sort_by.as_deref() == Some("serialNumber") {
                    rows.sort_by(|a, b| a.serial_number.cmp(&b.serial_number));
                    if !query.is_ascending {
                        rows.reverse();
                    }
                }
                Ok(rows)
            })
            .render_cell(|key, r: &Row| match key {
                "serialNumber" => r.serial_number.as_str().into(),
                "quantity" => Cell::editable(r.quantity.to_string(), InputConstraints::numeric_chain()),
                "remove" => CheckableCell::new().with_icon("x").into(),
                _ => Cell::text(""),
            })
    }

    fn source(rows: Vec<Row>) -> Source {
        Rc::new(RefCell::new(rows))
    }

    fn ids(page: &TablePage<Row>) -> Vec<String> {
        page.visible_rows().iter().map(|r| r.id.to_string()).collect()
    }

    #[test]
    fn test_missing_query_fails_fast() {
        let result = TablePage::<Row>::builder(Database::new())
            .columns(vec![Column::new("a", "A", 1)])
            .render_cell(|_, _| Cell::text(""))
            .build();
        assert!(matches!(
            result,
            Err(TableError::MissingCollaborator("get_updated_data"))
        ));
    }

    #[test]
    fn test_missing_columns_fails_fast() {
        let result = TablePage::<Row>::builder(Database::new())
            .get_updated_data(|_, _| Ok(Vec::new()))
            .render_cell(|_, _| Cell::text(""))
            .build();
        assert!(matches!(result, Err(TableError::NoColumns)));
    }

    #[test]
    fn test_sort_direction_alternates_from_ascending() {
        let calls = Rc::new(Counter::new(0));
        let mut page = builder(&source(vec![]), &calls).build().unwrap();
        let mut seen = Vec::new();
        for _ in 0..5 {
            page.on_column_sort("serialNumber").unwrap();
            seen.push(page.is_ascending());
        }
        assert_eq!(seen, vec![true, false, true, false, true]);
    }

    #[test]
    fn test_sorting_orders_rows() {
        let calls = Rc::new(Counter::new(0));
        let rows = source(vec![row("1", "B"), row("2", "A")]);
        let mut page = builder(&rows, &calls).build().unwrap();
        page.mount().unwrap();

        page.on_column_sort("serialNumber").unwrap();
        assert_eq!(ids(&page), vec!["2", "1"]);

        page.on_column_sort("serialNumber").unwrap();
        assert_eq!(ids(&page), vec!["1", "2"]);
    }

    #[test]
    fn test_switching_sort_column_resets_to_ascending() {
        let calls = Rc::new(Counter::new(0));
        let mut page = builder(&source(vec![]), &calls)
            .default_sort("serialNumber", false)
            .build()
            .unwrap();
        page.on_column_sort("quantity").unwrap();
        assert_eq!(page.sort_by(), Some("quantity"));
        assert!(page.is_ascending());
    }

    #[test]
    fn test_unknown_sort_column_is_rejected() {
        let calls = Rc::new(Counter::new(0));
        let mut page = builder(&source(vec![]), &calls).build().unwrap();
        assert!(matches!(
            page.on_column_sort("missing"),
            Err(TableError::UnknownColumn(_))
        ));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_header_press_ignores_unsortable_columns() {
        let calls = Rc::new(Counter::new(0));
        let mut page = builder(&source(vec![]), &calls).build().unwrap();
        assert!(!page.on_header_press(1).unwrap());
        assert_eq!(page.sort_by(), None);
        assert!(page.on_header_press(0).unwrap());
        assert_eq!(page.sort_by(), Some("serialNumber"));
    }

    #[test]
    fn test_checkable_press_is_its_own_inverse() {
        let calls = Rc::new(Counter::new(0));
        let mut page = builder(&source(vec![]), &calls).build().unwrap();
        let a = row("1", "A");
        let b = row("2", "B");
        page.on_checkable_press(&b);
        let before = page.selection().clone();

        page.on_checkable_press(&a);
        page.on_checkable_press(&a);
        assert_eq!(page.selection(), &before);

        page.on_checkable_press(&b);
        page.on_checkable_press(&b);
        assert_eq!(page.selection(), &before);
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let calls = Rc::new(Counter::new(0));
        let rows = source(vec![row("1", "B"), row("2", "A"), row("3", "AB")]);
        let mut page = builder(&rows, &calls).build().unwrap();
        page.on_search_change("A").unwrap();
        let first = page.visible_rows().to_vec();
        page.refresh().unwrap();
        assert_eq!(page.visible_rows(), first.as_slice());
        assert_eq!(ids(&page), vec!["2", "3"]);
    }

    #[test]
    fn test_unwatched_notification_does_not_refresh() {
        let calls = Rc::new(Counter::new(0));
        let rows = source(vec![row("1", "A")]);
        let mut page = builder(&rows, &calls).build().unwrap();
        page.mount().unwrap();
        let before = page.visible_rows().to_vec();
        let calls_before = calls.get();

        rows.borrow_mut().push(row("2", "B"));
        page.database
            .write(|tx| {
                tx.save(User::new("someone"));
                Ok(())
            })
            .unwrap();

        assert_eq!(page.process_database_events().unwrap(), 0);
        assert_eq!(calls.get(), calls_before);
        assert_eq!(page.visible_rows(), before.as_slice());
    }

    #[test]
    fn test_each_watched_notification_refreshes() {
        let calls = Rc::new(Counter::new(0));
        let rows = source(vec![]);
        let mut page = builder(&rows, &calls).build().unwrap();
        page.mount().unwrap();
        let calls_before = calls.get();

        rows.borrow_mut().push(row("1", "A"));
        page.database
            .write(|tx| {
                let parent = RecordId::from("t1");
                tx.save(TransactionItem::new(&parent, "A", "Alpha", 1));
                tx.save(TransactionItem::new(&parent, "B", "Beta", 2));
                Ok(())
            })
            .unwrap();

        assert_eq!(page.process_database_events().unwrap(), 2);
        assert_eq!(calls.get(), calls_before + 2);
        assert_eq!(ids(&page), vec!["1"]);
    }

    #[test]
    fn test_unmount_removes_listener() {
        let calls = Rc::new(Counter::new(0));
        let mut page = builder(&source(vec![]), &calls).build().unwrap();
        let database = page.database.clone();
        page.mount().unwrap();
        assert_eq!(database.listener_count(), 1);
        page.unmount();
        assert_eq!(database.listener_count(), 0);

        page.mount().unwrap();
        drop(page);
        assert_eq!(database.listener_count(), 0);
    }

    #[test]
    fn test_failed_refresh_does_not_drop_later_notifications() {
        let rows = source(vec![row("1", "A")]);
        let fail_next = Rc::new(Counter::new(false));
        let (query_rows, flag) = (Rc::clone(&rows), Rc::clone(&fail_next));
        let mut page = TablePage::builder(Database::new())
            .columns(vec![Column::new("serialNumber", "Number", 1)])
            .watched_types(&[RecordType::TransactionItem])
            .get_updated_data(move |_, _| {
                if flag.replace(false) {
                    Err(DatabaseError::Aborted("offline".to_string()))
                } else {
                    Ok(query_rows.borrow().clone())
                }
            })
            .render_cell(|_, r: &Row| r.serial_number.as_str().into())
            .build()
            .unwrap();
        page.mount().unwrap();

        rows.borrow_mut().push(row("2", "B"));
        fail_next.set(true);
        page.database
            .write(|tx| {
                let parent = RecordId::from("t1");
                tx.save(TransactionItem::new(&parent, "A", "Alpha", 1));
                tx.save(TransactionItem::new(&parent, "B", "Beta", 2));
                Ok(())
            })
            .unwrap();

        assert!(matches!(
            page.process_database_events(),
            Err(TableError::Refresh(DatabaseError::Aborted(_)))
        ));
        assert_eq!(ids(&page), vec!["1", "2"]);
    }

    #[test]
    fn test_edit_session_ends_when_its_record_leaves() {
        let calls = Rc::new(Counter::new(0));
        let rows = source(vec![row("1", "A"), row("2", "B")]);
        let mut page = builder(&rows, &calls)
            .on_end_editing(|_, _, _: &Row, _| Ok(()))
            .build()
            .unwrap();
        page.refresh().unwrap();

        assert!(page.begin_editing(1, "quantity"));
        rows.borrow_mut().insert(0, row("0", "0"));
        page.refresh().unwrap();
        assert!(page.is_editing());
        assert_eq!(page.cursor(), 2);

        rows.borrow_mut().retain(|r| r.id != RecordId::from("2"));
        page.refresh().unwrap();
        assert!(!page.is_editing());
    }

    #[test]
    fn test_failed_refresh_keeps_previous_rows() {
        let fail = Rc::new(Counter::new(false));
        let flag = Rc::clone(&fail);
        let mut page = TablePage::builder(Database::new())
            .columns(vec![Column::new("serialNumber", "Number", 1)])
            .get_updated_data(move |_, _| {
                if flag.get() {
                    Err(DatabaseError::Aborted("offline".to_string()))
                } else {
                    Ok(vec![row("1", "A")])
                }
            })
            .render_cell(|_, r: &Row| r.serial_number.as_str().into())
            .build()
            .unwrap();
        page.refresh().unwrap();

        fail.set(true);
        assert!(page.on_search_change("zzz").is_err());
        assert_eq!(ids(&page), vec!["1"]);
    }

    #[test]
    fn test_expansion_replaces_row_press() {
        let pressed = Rc::new(Counter::new(0));
        let counter = Rc::clone(&pressed);
        let mut page = TablePage::builder(Database::new())
            .columns(vec![Column::new("serialNumber", "Number", 1)])
            .get_updated_data(|_, _| Ok(vec![row("1", "A")]))
            .render_cell(|_, r: &Row| r.serial_number.as_str().into())
            .on_row_press(move |_, _| {
                counter.set(counter.get() + 1);
                Ok(PageAction::SetStatus("pressed".to_string()))
            })
            .on_render_expansion(|r: &Row| Text::from(format!("Details of {}", r.serial_number)))
            .build()
            .unwrap();
        page.refresh().unwrap();

        assert_eq!(page.press_row(0).unwrap(), PageAction::None);
        assert_eq!(pressed.get(), 0);
        assert!(page.expanded_rows().contains(&RecordId::from("1")));
        let rows = page.rows();
        assert!(rows[0].is_expanded);
        assert_eq!(rows[0].expansion, Some(Text::from("Details of A")));

        page.press_row(0).unwrap();
        assert!(page.expanded_rows().is_empty());
    }

    #[test]
    fn test_row_press_hook_result_is_returned() {
        let mut page = TablePage::builder(Database::new())
            .columns(vec![Column::new("serialNumber", "Number", 1)])
            .get_updated_data(|_, _| Ok(vec![row("1", "A")]))
            .render_cell(|_, r: &Row| r.serial_number.as_str().into())
            .on_row_press(|_, r: &Row| Ok(PageAction::SetStatus(r.serial_number.clone())))
            .build()
            .unwrap();
        page.refresh().unwrap();
        assert_eq!(page.press_row(0).unwrap(), PageAction::SetStatus("A".to_string()));
        assert_eq!(page.press_row(5).unwrap(), PageAction::None);
    }

    #[test]
    fn test_rows_without_hooks_are_not_pressable_or_editable() {
        let calls = Rc::new(Counter::new(0));
        let mut page = builder(&source(vec![row("1", "A")]), &calls).build().unwrap();
        page.refresh().unwrap();
        assert!(!page.rows()[0].is_pressable);
        assert!(!page.begin_editing(0, "quantity"));
        assert!(page.focus_handles().is_empty());
    }

    #[test]
    fn test_cursor_wraps_by_step_and_clamps_by_page() {
        let calls = Rc::new(Counter::new(0));
        let rows = source(vec![row("1", "A"), row("2", "B"), row("3", "C")]);
        let mut page = builder(&rows, &calls).build().unwrap();
        page.refresh().unwrap();

        page.move_cursor_up();
        assert_eq!(page.cursor(), 2);
        page.move_cursor_down();
        assert_eq!(page.cursor(), 0);

        page.move_cursor_by(10);
        assert_eq!(page.cursor(), 2);
        page.move_cursor_by(-1);
        assert_eq!(page.cursor(), 1);
        page.move_cursor_by(-10);
        assert_eq!(page.cursor(), 0);
    }

    #[test]
    fn test_press_checkable_respects_disabled() {
        let mut page = TablePage::builder(Database::new())
            .columns(vec![Column::new("remove", "Remove", 1)])
            .get_updated_data(|_, _| Ok(vec![row("1", "A"), row("2", "B")]))
            .render_cell(|_, r: &Row| CheckableCell::new().disabled(r.serial_number == "B").into())
            .build()
            .unwrap();
        page.refresh().unwrap();

        assert!(page.press_checkable(0, "remove"));
        assert!(!page.press_checkable(1, "remove"));
        assert_eq!(page.selected_ids(), vec![RecordId::from("1")]);
    }

    #[test]
    fn test_submit_moves_focus_to_next_row() {
        let edits = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&edits);
        let calls = Rc::new(Counter::new(0));
        let mut page = builder(&source(vec![row("1", "A"), row("2", "B")]), &calls)
            .on_end_editing(move |_, key, r: &Row, value| {
                sink.borrow_mut()
                    .push((key.to_string(), r.id.to_string(), value.to_string()));
                Ok(())
            })
            .build()
            .unwrap();
        page.refresh().unwrap();

        assert_eq!(page.focus_handles().len(), 2);
        assert!(page.begin_editing(0, "quantity"));
        let input = page.edit_input().unwrap();
        input.insert_char('7');
        input.insert_char('5');

        assert!(page.submit_editing().unwrap());
        assert_eq!(page.cursor(), 1);
        assert!(page.is_editing());

        match &page.rows()[1].cells[1] {
            CellView::Editable { is_editing, value, .. } => {
                assert!(*is_editing);
                assert_eq!(value, "1");
            }
            other => panic!("unexpected cell {:?}", other),
        }

        // Last handle: nothing left to focus
        assert!(!page.submit_editing().unwrap());
        assert!(!page.is_editing());
        assert_eq!(
            *edits.borrow(),
            vec![
                ("quantity".to_string(), "1".to_string(), "75".to_string()),
                ("quantity".to_string(), "2".to_string(), "1".to_string()),
            ]
        );
    }
}
