//! Main TUI application state and logic

use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use tracing::{debug, error, info};

use super::components::{render_table_page, SupplierSelect};
use super::ui::{centered_rect, InputField, Theme};
use crate::config::Config;
use crate::database::Database;
use crate::localization::{button_strings, general_strings, modal_strings};
use crate::models::User;
use crate::pages::{Route, SupplierInvoicePage, SupplierInvoicesPage};
use crate::storage::Storage;
use crate::table::{PageAction, TableError, TablePage, TableRecord};

/// Where keystrokes go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    SelectSupplier,
}

/// Result of offering a key to a table page
#[derive(Debug, PartialEq)]
enum TableOutcome {
    Handled,
    Action(PageAction),
    Ignored,
}

/// Main TUI application state
pub struct App {
    pub config: Config,
    pub theme: Theme,
    database: Database,
    /// Current navigation target
    pub route: Route,
    pub invoices: SupplierInvoicesPage,
    /// Edit page, present while the route is an invoice
    pub invoice: Option<SupplierInvoicePage>,
    pub input_mode: InputMode,
    pub search_input: InputField,
    pub supplier_select: Option<SupplierSelect>,

    pub should_quit: bool,
    pub show_help_popup: bool,
    pub status_message: Option<String>,
    pub error_message: Option<String>,
}

impl App {
    pub fn new(config: Config, database: Database, user: User) -> Result<Self> {
        let mut invoices = SupplierInvoicesPage::new(database.clone(), user)?;
        invoices.table.mount()?;

        Ok(Self {
            config,
            theme: Theme::default(),
            database,
            route: Route::SupplierInvoices,
            invoices,
            invoice: None,
            input_mode: InputMode::Normal,
            search_input: search_input(&Route::SupplierInvoices),
            supplier_select: None,
            should_quit: false,
            show_help_popup: false,
            status_message: None,
            error_message: None,
        })
    }

    /// Run the main application loop, saving to `storage` whenever a write committed
    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>, storage: &Storage) -> Result<()> {
        let mut saved_generation = self.database.generation();
        self.set_status(format!(
            "Ready - signed in as {}",
            self.invoices.current_user().username
        ));

        loop {
            terminal.draw(|f| self.draw(f))?;

            if let Ok(Event::Key(key)) = crossterm::event::read() {
                if key.kind == KeyEventKind::Press {
                    self.handle_key_event(key)?;
                }
            }
            self.process_database_events();

            let generation = self.database.generation();
            if generation != saved_generation {
                if let Err(e) = storage.save(&self.database).await {
                    error!("Saving failed: {}", e);
                    self.set_error(format!("Saving failed: {}", e));
                }
                saved_generation = generation;
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Drain queued change notifications of every mounted page
    pub fn process_database_events(&mut self) {
        let mut result = self.invoices.table.process_database_events();
        if let Some(invoice) = &mut self.invoice {
            result = result.and(invoice.table.process_database_events());
        }
        if let Err(e) = result {
            self.report(e.into());
        }
    }

    /// Handle keyboard input events
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        if self.show_help_popup {
            if matches!(key.code, KeyCode::F(1) | KeyCode::Char('?') | KeyCode::Esc) {
                self.show_help_popup = false;
            }
            return Ok(());
        }

        match self.input_mode {
            InputMode::SelectSupplier => return self.handle_supplier_select_event(key),
            InputMode::Search => return self.handle_search_event(key),
            InputMode::Normal => {}
        }

        // An edit session takes every key until it ends
        if self.is_editing() {
            self.handle_table_event(key);
            self.process_database_events();
            return Ok(());
        }

        // Global shortcuts
        match key.code {
            KeyCode::F(1) | KeyCode::Char('?') => {
                self.show_help_popup = true;
                return Ok(());
            }
            KeyCode::Char('q') => {
                self.should_quit = true;
                return Ok(());
            }
            KeyCode::Char('/') => {
                self.input_mode = InputMode::Search;
                self.search_input.set_focus(true);
                return Ok(());
            }
            _ => {}
        }

        if self.has_selection() {
            match key.code {
                KeyCode::Char('d') | KeyCode::Delete => {
                    self.on_delete_confirm();
                    return Ok(());
                }
                KeyCode::Char('c') | KeyCode::Esc => {
                    self.on_delete_cancel();
                    return Ok(());
                }
                _ => {}
            }
        }

        match (&self.route, key.code) {
            (Route::SupplierInvoices, KeyCode::Char('n')) => {
                let options = self.invoices.supplier_options("");
                self.supplier_select = Some(SupplierSelect::new(options));
                self.input_mode = InputMode::SelectSupplier;
            }
            (Route::SupplierInvoice { .. }, KeyCode::Esc) => {
                self.navigate(Route::SupplierInvoices);
            }
            _ => self.handle_table_event(key),
        }
        Ok(())
    }

    fn handle_table_event(&mut self, key: KeyEvent) {
        let page_size = self.config.page_size;
        let outcome = match &mut self.invoice {
            Some(invoice) if self.route != Route::SupplierInvoices => {
                handle_table_key(&mut invoice.table, key, page_size)
            }
            _ => handle_table_key(&mut self.invoices.table, key, page_size),
        };

        match outcome {
            Ok(TableOutcome::Action(PageAction::Navigate(id))) => {
                match self.invoices.open_invoice(&id) {
                    Ok(route) => self.navigate(route),
                    Err(e) => self.report(e),
                }
            }
            Ok(TableOutcome::Action(PageAction::SetStatus(message))) => self.set_status(message),
            Ok(_) => {}
            Err(e) => self.report(e.into()),
        }
    }

    fn handle_search_event(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Enter => {
                self.search_input.set_focus(false);
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Esc => {
                self.search_input.clear();
                self.search_input.set_focus(false);
                self.input_mode = InputMode::Normal;
                self.apply_search();
            }
            KeyCode::Backspace => {
                self.search_input.delete_char();
                self.apply_search();
            }
            KeyCode::Left => self.search_input.move_cursor_left(),
            KeyCode::Right => self.search_input.move_cursor_right(),
            KeyCode::Char(c) => {
                self.search_input.insert_char(c);
                self.apply_search();
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_supplier_select_event(&mut self, key: KeyEvent) -> Result<()> {
        let Some(select) = self.supplier_select.as_mut() else {
            self.input_mode = InputMode::Normal;
            return Ok(());
        };

        match key.code {
            KeyCode::Esc => {
                self.supplier_select = None;
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Up => select.previous(),
            KeyCode::Down => select.next(),
            KeyCode::Enter => {
                let Some(supplier) = select.selected().cloned() else {
                    return Ok(());
                };
                self.supplier_select = None;
                self.input_mode = InputMode::Normal;
                match self.invoices.on_new_supplier_invoice(&supplier) {
                    Ok(route) => {
                        info!("Created supplier invoice for {}", supplier.name);
                        self.navigate(route);
                    }
                    Err(e) => self.report(e),
                }
            }
            KeyCode::Backspace => {
                select.input.delete_char();
                let options = self.invoices.supplier_options(select.filter());
                select.set_options(options);
            }
            KeyCode::Char(c) => {
                select.input.insert_char(c);
                let options = self.invoices.supplier_options(select.filter());
                select.set_options(options);
            }
            _ => {}
        }
        Ok(())
    }

    fn is_editing(&self) -> bool {
        match (&self.route, &self.invoice) {
            (Route::SupplierInvoice { .. }, Some(invoice)) => invoice.table.is_editing(),
            _ => self.invoices.table.is_editing(),
        }
    }

    fn has_selection(&self) -> bool {
        match (&self.route, &self.invoice) {
            (Route::SupplierInvoice { .. }, Some(invoice)) => !invoice.table.selection().is_empty(),
            _ => !self.invoices.table.selection().is_empty(),
        }
    }

    fn apply_search(&mut self) {
        let term = self.search_input.value.clone();
        let result = match (&self.route, &mut self.invoice) {
            (Route::SupplierInvoice { .. }, Some(invoice)) => invoice.table.on_search_change(&term),
            _ => self.invoices.table.on_search_change(&term),
        };
        if let Err(e) = result {
            self.report(e.into());
        }
    }

    fn on_delete_confirm(&mut self) {
        let result = match (&self.route, &mut self.invoice) {
            (Route::SupplierInvoice { .. }, Some(invoice)) => invoice.on_delete_confirm(),
            _ => self.invoices.on_delete_confirm(),
        };
        match result {
            Ok(count) => self.set_status(format!("Removed {} item(s)", count)),
            Err(e) => self.report(e),
        }
    }

    fn on_delete_cancel(&mut self) {
        let result = match (&self.route, &mut self.invoice) {
            (Route::SupplierInvoice { .. }, Some(invoice)) => invoice.on_delete_cancel(),
            _ => self.invoices.on_delete_cancel(),
        };
        if let Err(e) = result {
            self.report(e);
        }
    }

    /// Navigate to a specific route
    pub fn navigate(&mut self, route: Route) {
        match &route {
            Route::SupplierInvoices => self.invoice = None,
            Route::SupplierInvoice { transaction_id, .. } => {
                let page = SupplierInvoicePage::new(self.database.clone(), transaction_id.clone())
                    .and_then(|mut page| {
                        page.table.mount()?;
                        Ok(page)
                    });
                match page {
                    Ok(page) => self.invoice = Some(page),
                    Err(e) => {
                        self.report(e);
                        return;
                    }
                }
            }
        }

        info!("Navigating to {}", route.title());
        self.search_input = search_input(&route);
        self.input_mode = InputMode::Normal;
        self.route = route;
        self.clear_messages();
    }

    /// Set status message
    pub fn set_status(&mut self, message: String) {
        self.status_message = Some(message);
        self.error_message = None;
    }

    /// Set error message
    pub fn set_error(&mut self, message: String) {
        self.error_message = Some(message);
        self.status_message = None;
    }

    /// Clear status and error messages
    pub fn clear_messages(&mut self) {
        self.status_message = None;
        self.error_message = None;
    }

    fn report(&mut self, e: anyhow::Error) {
        error!("{:#}", e);
        self.set_error(format!("{:#}", e));
    }

    /// Draw the UI
    pub fn draw(&mut self, f: &mut Frame) {
        let size = f.size();
        let has_selection = self.has_selection();

        let top_height = match self.route {
            Route::SupplierInvoices => 3,
            Route::SupplierInvoice { .. } => 7,
        };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(top_height),
                Constraint::Min(0),
                Constraint::Length(if has_selection { 3 } else { 0 }),
                Constraint::Length(3),
            ])
            .split(size);

        match (&self.route, &self.invoice) {
            (Route::SupplierInvoice { title, .. }, Some(invoice)) => {
                self.draw_invoice_header(f, chunks[0], invoice);
                render_table_page(f, chunks[1], &invoice.table, title, &self.theme);
            }
            _ => {
                self.draw_list_header(f, chunks[0]);
                render_table_page(f, chunks[1], &self.invoices.table, self.route.title(), &self.theme);
            }
        }

        if has_selection {
            self.draw_confirm_bar(f, chunks[2]);
        }
        self.draw_status_bar(f, chunks[3]);

        if let Some(select) = self.supplier_select.as_mut() {
            select.render(f, size, &self.theme);
        }
        if self.show_help_popup {
            self.draw_help_popup(f, size);
        }
    }

    fn draw_list_header(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(30)])
            .split(area);

        self.search_input.render(f, chunks[0], &self.theme);
        let button = Paragraph::new(format!("[n] {}", button_strings::NEW_SUPPLIER_INVOICE))
            .style(self.theme.title())
            .block(Block::default().borders(Borders::ALL).border_style(self.theme.active_border()));
        f.render_widget(button, chunks[1]);
    }

    fn draw_invoice_header(&self, f: &mut Frame, area: Rect, invoice: &SupplierInvoicePage) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Length(3)])
            .split(area);

        let lines = match invoice.summary() {
            Some(summary) => vec![
                Line::from(format!(
                    "Supplier: {}    Status: {}{}",
                    summary.supplier,
                    summary.status,
                    if summary.is_finalised { " (read only)" } else { "" }
                )),
                Line::from(format!(
                    "Entered: {}    Lines: {}    Total quantity: {}    Comment: {}",
                    summary.entry_date.format("%d/%m/%Y"),
                    summary.item_count,
                    summary.total_quantity,
                    summary.comment
                )),
            ],
            None => vec![Line::from("Invoice no longer exists")],
        };
        let header = Paragraph::new(lines)
            .style(self.theme.page())
            .block(Block::default().borders(Borders::ALL).title(self.route.title()));
        f.render_widget(header, chunks[0]);
        self.search_input.render(f, chunks[1], &self.theme);
    }

    fn draw_confirm_bar(&self, f: &mut Frame, area: Rect) {
        let text = format!(
            "{}   [d] {}   [c] {}",
            modal_strings::REMOVE_THESE_ITEMS,
            modal_strings::REMOVE,
            modal_strings::CANCEL
        );
        let bar = Paragraph::new(text)
            .style(self.theme.title())
            .block(Block::default().borders(Borders::ALL).border_style(self.theme.active_border()));
        f.render_widget(bar, area);
    }

    /// Draw status bar with current screen info and shortcuts
    fn draw_status_bar(&self, f: &mut Frame, area: Rect) {
        let status_text = if let Some(ref msg) = self.status_message {
            format!("Status: {}", msg)
        } else if let Some(ref err) = self.error_message {
            format!("Error: {}", err)
        } else {
            format!(
                "mSupply - {} | /: Search | ESC: Back | Q: Quit | F1/?: Help",
                self.route.title()
            )
        };

        let style = if self.error_message.is_some() {
            self.theme.error()
        } else if self.status_message.is_some() {
            self.theme.success()
        } else {
            self.theme.inactive()
        };

        let status_bar = Paragraph::new(status_text)
            .style(style)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(status_bar, area);
    }

    /// Draw help popup with context-sensitive shortcuts
    fn draw_help_popup(&self, f: &mut Frame, area: Rect) {
        let popup_area = centered_rect(70, 70, area);
        f.render_widget(Clear, popup_area);

        let help_popup = Paragraph::new(self.context_help())
            .block(
                Block::default()
                    .title("Help - Context Shortcuts")
                    .borders(Borders::ALL)
                    .border_style(self.theme.active_border()),
            )
            .style(self.theme.page())
            .wrap(Wrap { trim: false });
        f.render_widget(help_popup, popup_area);
    }

    fn context_help(&self) -> String {
        let global_help = "Global Shortcuts:\n\
            / - Search\n\
            1-9 - Sort by column\n\
            ↑/↓ PgUp/PgDn Home/End - Move\n\
            Space - Tick the remove column\n\
            d / c - Remove ticked rows / cancel\n\
            Q - Quit application\n\
            F1 / ? - Toggle this help\n\n";

        let screen_help = match self.route {
            Route::SupplierInvoices => {
                "Supplier Invoices:\n\
                Enter - Open invoice\n\
                n - New supplier invoice"
            }
            Route::SupplierInvoice { .. } => {
                "Invoice:\n\
                Enter - Show batch and expiry\n\
                e - Edit quantity (Enter moves to the next line)\n\
                ESC - Back to the invoice list"
            }
        };

        format!("{}{}", global_help, screen_help)
    }
}

fn search_input(route: &Route) -> InputField {
    let placeholder = match route {
        Route::SupplierInvoices => general_strings::SEARCH_BY_INVOICE_NUMBER,
        Route::SupplierInvoice { .. } => general_strings::SEARCH_BY_ITEM,
    };
    InputField::new(general_strings::SEARCH).with_placeholder(placeholder)
}

/// Keys every table page understands
fn handle_table_key<R: TableRecord>(
    table: &mut TablePage<R>,
    key: KeyEvent,
    page_size: usize,
) -> Result<TableOutcome, TableError> {
    if table.is_editing() {
        match key.code {
            KeyCode::Enter | KeyCode::Tab => {
                table.submit_editing()?;
            }
            KeyCode::Esc => table.cancel_editing(),
            code => {
                if let Some(input) = table.edit_input() {
                    match code {
                        KeyCode::Backspace => input.delete_char(),
                        KeyCode::Delete => input.delete_char_forward(),
                        KeyCode::Left => input.move_cursor_left(),
                        KeyCode::Right => input.move_cursor_right(),
                        KeyCode::Home => input.move_cursor_to_start(),
                        KeyCode::End => input.move_cursor_to_end(),
                        KeyCode::Char(c) => {
                            if !input.insert_char(c) {
                                debug!("Rejected '{}' for this field", c);
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
        return Ok(TableOutcome::Handled);
    }

    let page_size = page_size as isize;
    match key.code {
        KeyCode::Up => table.move_cursor_up(),
        KeyCode::Down => table.move_cursor_down(),
        KeyCode::PageUp => table.move_cursor_by(-page_size),
        KeyCode::PageDown => table.move_cursor_by(page_size),
        KeyCode::Home => table.move_cursor_to_first(),
        KeyCode::End => table.move_cursor_to_last(),
        KeyCode::Enter => return Ok(TableOutcome::Action(table.press_cursor_row()?)),
        KeyCode::Char(' ') => {
            table.press_checkable_at_cursor();
        }
        KeyCode::Char('e') => {
            table.begin_editing_at_cursor();
        }
        KeyCode::Char(c) if ('1'..='9').contains(&c) => {
            let index = c as usize - '1' as usize;
            table.on_header_press(index)?;
        }
        _ => return Ok(TableOutcome::Ignored),
    }
    Ok(TableOutcome::Handled)
}
