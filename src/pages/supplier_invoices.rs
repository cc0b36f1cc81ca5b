//! Supplier invoice list

use std::collections::HashMap;

use anyhow::Result;
use tracing::{info, warn};

use super::Route;
use crate::database::{create_supplier_invoice, Database, DatabaseError};
use crate::localization::{nav_strings, table_strings};
use crate::models::{Name, RecordId, RecordType, Transaction, User};
use crate::table::{
    Alignment, Cell, CheckableCell, Column, DataQuery, PageAction, TableError, TablePage,
    TableRecord,
};
use crate::utilities::{begins_with_ci, format_status, sort_data_by, today, SortValue};

/// Record types whose changes refresh the list
pub const DATA_TYPES_SYNCHRONISED: [RecordType; 1] = [RecordType::Transaction];

/// Icon of the remove column, the same glyph in both states
pub const REMOVE_ICON: &str = "⊖";

/// A supplier invoice joined with its other party
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceRow {
    pub transaction: Transaction,
    pub other_party: Name,
}

impl TableRecord for InvoiceRow {
    fn id(&self) -> &RecordId {
        &self.transaction.id
    }
}

pub struct SupplierInvoicesPage {
    database: Database,
    current_user: User,
    pub table: TablePage<InvoiceRow>,
}

impl SupplierInvoicesPage {
    pub fn new(database: Database, current_user: User) -> Result<Self, TableError> {
        let table = TablePage::builder(database.clone())
            .columns(Self::columns())
            .watched_types(&DATA_TYPES_SYNCHRONISED)
            .default_sort("entryDate", false)
            .get_updated_data(get_updated_data)
            .render_cell(render_cell)
            .on_row_press(|_, row: &InvoiceRow| {
                Ok(PageAction::Navigate(row.transaction.id.clone()))
            })
            .build()?;

        Ok(Self {
            database,
            current_user,
            table,
        })
    }

    pub fn columns() -> Vec<Column> {
        vec![
            Column::new("serialNumber", table_strings::INVOICE_NUMBER, 1).sortable(),
            Column::new("status", table_strings::STATUS, 1).sortable(),
            Column::new("entryDate", table_strings::ENTERED_DATE, 1).sortable(),
            Column::new("comment", table_strings::COMMENT, 3),
            Column::new("remove", table_strings::REMOVE, 1).align(Alignment::Center),
        ]
    }

    pub fn current_user(&self) -> &User {
        &self.current_user
    }

    /// Remove every selected invoice in one write transaction.
    ///
    /// On failure nothing is removed and the selection stays as it was.
    pub fn on_delete_confirm(&mut self) -> Result<usize> {
        let selection = self.table.selected_ids();
        let removed = self.database.write(|tx| {
            for id in &selection {
                let transaction = tx
                    .get::<Transaction>(id)
                    .cloned()
                    .ok_or_else(|| DatabaseError::NotFound {
                        record_type: RecordType::Transaction,
                        id: id.clone(),
                    })?;
                transaction.remove_self(tx)?;
            }
            Ok(selection.len())
        })?;

        info!("Removed {} supplier invoice(s)", removed);
        self.table.clear_selection();
        self.table.refresh()?;
        Ok(removed)
    }

    pub fn on_delete_cancel(&mut self) -> Result<()> {
        self.table.clear_selection();
        self.table.refresh()?;
        Ok(())
    }

    /// External suppliers whose name starts with `filter`, sorted by name
    pub fn supplier_options(&self, filter: &str) -> Vec<Name> {
        supplier_options(&self.database, filter)
    }

    /// Route to the invoice a row press asked for, finalising it first when confirmed
    pub fn open_invoice(&self, id: &RecordId) -> Result<Route> {
        let invoice = self
            .database
            .get::<Transaction>(id)
            .ok_or_else(|| DatabaseError::NotFound {
                record_type: RecordType::Transaction,
                id: id.clone(),
            })?;
        Ok(navigate_to_invoice(&self.database, &invoice)?)
    }

    /// Create an invoice for `other_party` and open it
    pub fn on_new_supplier_invoice(&mut self, other_party: &Name) -> Result<Route> {
        let user = self.current_user.clone();
        let invoice = self
            .database
            .write(|tx| create_supplier_invoice(tx, other_party, &user))?;
        Ok(navigate_to_invoice(&self.database, &invoice)?)
    }
}

/// External suppliers whose name starts with `filter`, sorted by name
pub fn supplier_options(database: &Database, filter: &str) -> Vec<Name> {
    database
        .objects::<Name>()
        .filtered(|name| name.is_external_supplier())
        .filtered(|name| begins_with_ci(&name.name, filter))
        .sorted_by(|a, b| a.name.cmp(&b.name), true)
        .into_vec()
}

/// Supplier invoices (never stock adjustments) whose serial number starts with the
/// search term, ordered by the sort column
pub fn get_updated_data(
    database: &Database,
    query: &DataQuery,
) -> Result<Vec<InvoiceRow>, DatabaseError> {
    let names: HashMap<RecordId, Name> = database
        .objects::<Name>()
        .into_iter()
        .map(|name| (name.id.clone(), name))
        .collect();

    let rows: Vec<InvoiceRow> = database
        .objects::<Transaction>()
        .filtered(|transaction| transaction.is_supplier_invoice())
        .filtered(|transaction| begins_with_ci(&transaction.serial_number, &query.search_term))
        .into_iter()
        .filter_map(|transaction| match names.get(&transaction.other_party) {
            Some(other_party) => Some(InvoiceRow {
                other_party: other_party.clone(),
                transaction,
            }),
            None => {
                warn!(
                    "Supplier invoice {} has no other party, skipping",
                    transaction.serial_number
                );
                None
            }
        })
        .filter(|row| !row.other_party.is_inventory_adjustment())
        .collect();

    let sort_value: Option<fn(&InvoiceRow) -> SortValue> = match query.sort_by.as_deref() {
        Some("serialNumber") => Some(|row: &InvoiceRow| {
            SortValue::number_or_text(&row.transaction.serial_number)
        }),
        Some("status") => Some(|row: &InvoiceRow| {
            SortValue::Text(format_status(row.transaction.status).to_string())
        }),
        Some("entryDate") => Some(|row: &InvoiceRow| SortValue::Date(row.transaction.entry_date)),
        Some("comment") => Some(|row: &InvoiceRow| SortValue::Text(row.transaction.comment.clone())),
        _ => None,
    };

    Ok(match sort_value {
        Some(sort_value) => sort_data_by(rows, sort_value, query.is_ascending),
        None => rows,
    })
}

pub fn render_cell(key: &str, row: &InvoiceRow) -> Cell {
    let invoice = &row.transaction;
    match key {
        "status" => format_status(invoice.status).into(),
        "entryDate" => invoice.entry_date.format("%a %b %d %Y").to_string().into(),
        "comment" => invoice.comment.as_str().into(),
        "remove" => CheckableCell::new()
            .with_icon(REMOVE_ICON)
            .disabled(invoice.is_finalised() || !invoice.is_external_supplier_invoice(&row.other_party))
            .into(),
        _ => invoice.serial_number.as_str().into(),
    }
}

/// Route to the edit view of `invoice`.
///
/// Confirmed invoices are finalised first: only new or finalised supplier invoices may
/// be opened for editing.
pub fn navigate_to_invoice(database: &Database, invoice: &Transaction) -> Result<Route, DatabaseError> {
    if invoice.is_confirmed() {
        database.write(|tx| {
            let mut transaction = tx
                .get::<Transaction>(&invoice.id)
                .cloned()
                .ok_or_else(|| DatabaseError::NotFound {
                    record_type: RecordType::Transaction,
                    id: invoice.id.clone(),
                })?;
            transaction.finalise(today());
            tx.save(transaction);
            Ok(())
        })?;
        info!("Finalised confirmed supplier invoice {} on open", invoice.serial_number);
    }

    Ok(Route::SupplierInvoice {
        transaction_id: invoice.id.clone(),
        title: format!("{} {}", nav_strings::INVOICE, invoice.serial_number),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NameType, TransactionItem, TransactionStatus, TransactionType};
    use crate::table::{CellView, CheckState};
    use chrono::NaiveDate;

    struct Fixture {
        database: Database,
        supplier: Name,
        user: User,
    }

    fn fixture() -> Fixture {
        let database = Database::new();
        let supplier = Name::new("Pacific Pharma", "PPH", NameType::ExternalSupplier);
        let adjustments = Name::new("Inventory adjustments", "invad", NameType::InventoryAdjustment);
        let user = User::new("admin");
        database
            .write(|tx| {
                tx.create(supplier.clone())?;
                tx.create(adjustments.clone())?;
                tx.create(Name::new("Mercy Wholesale", "MWS", NameType::ExternalSupplier))?;
                tx.create(Name::new("District Hospital", "DH", NameType::Customer))?;
                tx.create(user.clone())?;
                tx.create(invoice("1", "1", &supplier, TransactionStatus::New, 3))?;
                tx.create(invoice("2", "2", &supplier, TransactionStatus::Confirmed, 1))?;
                tx.create(invoice("3", "10", &supplier, TransactionStatus::New, 2))?;
                tx.create(invoice("4", "4", &adjustments, TransactionStatus::Finalised, 4))?;
                tx.create(TransactionItem::new(&RecordId::from("1"), "A", "Alpha", 5))?;
                Ok(())
            })
            .unwrap();
        Fixture {
            database,
            supplier,
            user,
        }
    }

    fn invoice(id: &str, serial: &str, other_party: &Name, status: TransactionStatus, day: u32) -> Transaction {
        Transaction {
            id: RecordId::from(id),
            serial_number: serial.to_string(),
            transaction_type: TransactionType::SupplierInvoice,
            status,
            other_party: other_party.id.clone(),
            entry_date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            confirm_date: None,
            comment: String::new(),
            entered_by: None,
        }
    }

    fn visible_ids(page: &SupplierInvoicesPage) -> Vec<String> {
        page.table
            .visible_rows()
            .iter()
            .map(|row| row.transaction.id.to_string())
            .collect()
    }

    fn mounted(fixture: &Fixture) -> SupplierInvoicesPage {
        let mut page = SupplierInvoicesPage::new(fixture.database.clone(), fixture.user.clone()).unwrap();
        page.table.mount().unwrap();
        page
    }

    #[test]
    fn test_lists_supplier_invoices_newest_first() {
        let fixture = fixture();
        let page = mounted(&fixture);
        assert_eq!(visible_ids(&page), vec!["1", "3", "2"]);
        assert_eq!(page.table.sort_by(), Some("entryDate"));
        assert!(!page.table.is_ascending());
    }

    #[test]
    fn test_serial_numbers_sort_numerically() {
        let fixture = fixture();
        let mut page = mounted(&fixture);
        page.table.on_column_sort("serialNumber").unwrap();
        assert_eq!(visible_ids(&page), vec!["1", "2", "3"]);
        page.table.on_column_sort("serialNumber").unwrap();
        assert_eq!(visible_ids(&page), vec!["3", "2", "1"]);
    }

    #[test]
    fn test_search_matches_serial_prefix() {
        let fixture = fixture();
        let mut page = mounted(&fixture);
        page.table.on_search_change("1").unwrap();
        assert_eq!(visible_ids(&page), vec!["1", "3"]);
    }

    #[test]
    fn test_delete_selected_invoices() {
        let fixture = fixture();
        let mut page = mounted(&fixture);
        page.table
            .set_selection([RecordId::from("1"), RecordId::from("3")]);

        assert_eq!(page.on_delete_confirm().unwrap(), 2);

        assert_eq!(visible_ids(&page), vec!["2"]);
        assert!(page.table.selection().is_empty());
        assert!(fixture.database.objects::<TransactionItem>().is_empty());
    }

    #[test]
    fn test_failed_delete_keeps_selection_and_records() {
        let fixture = fixture();
        let mut page = mounted(&fixture);
        let mut finalised = fixture.database.get::<Transaction>(&RecordId::from("3")).unwrap();
        finalised.status = TransactionStatus::Finalised;
        fixture
            .database
            .write(|tx| {
                tx.save(finalised);
                Ok(())
            })
            .unwrap();
        page.table.process_database_events().unwrap();

        page.table
            .set_selection([RecordId::from("1"), RecordId::from("3")]);
        assert!(page.on_delete_confirm().is_err());

        assert_eq!(page.table.selection().len(), 2);
        assert_eq!(visible_ids(&page).len(), 3);
    }

    #[test]
    fn test_delete_cancel_clears_selection() {
        let fixture = fixture();
        let mut page = mounted(&fixture);
        page.table.set_selection([RecordId::from("1")]);
        page.on_delete_cancel().unwrap();
        assert!(page.table.selection().is_empty());
        assert_eq!(visible_ids(&page).len(), 3);
    }

    #[test]
    fn test_opening_confirmed_invoice_finalises_it() {
        let fixture = fixture();
        let mut page = mounted(&fixture);
        let index = page
            .table
            .visible_rows()
            .iter()
            .position(|row| row.transaction.id == RecordId::from("2"))
            .unwrap();

        let action = page.table.press_row(index).unwrap();
        assert_eq!(action, PageAction::Navigate(RecordId::from("2")));

        let route = page.open_invoice(&RecordId::from("2")).unwrap();
        assert_eq!(
            route,
            Route::SupplierInvoice {
                transaction_id: RecordId::from("2"),
                title: "Invoice 2".to_string(),
            }
        );
        let stored = fixture.database.get::<Transaction>(&RecordId::from("2")).unwrap();
        assert!(stored.is_finalised());
        assert_eq!(page.table.process_database_events().unwrap(), 1);
    }

    #[test]
    fn test_new_invoice_gets_next_serial_and_opens() {
        let fixture = fixture();
        let mut page = mounted(&fixture);
        let route = page.on_new_supplier_invoice(&fixture.supplier).unwrap();

        let created = fixture
            .database
            .objects::<Transaction>()
            .find(|t| t.serial_number == "11")
            .cloned()
            .unwrap();
        assert_eq!(created.status, TransactionStatus::New);
        assert_eq!(created.entered_by, Some(fixture.user.id.clone()));
        assert_eq!(
            route,
            Route::SupplierInvoice {
                transaction_id: created.id.clone(),
                title: "Invoice 11".to_string(),
            }
        );

        page.table.process_database_events().unwrap();
        assert_eq!(visible_ids(&page).len(), 4);
    }

    #[test]
    fn test_supplier_options_filter_by_prefix() {
        let fixture = fixture();
        let page = mounted(&fixture);
        let all: Vec<String> = page.supplier_options("").into_iter().map(|n| n.name).collect();
        assert_eq!(all, vec!["Mercy Wholesale", "Pacific Pharma"]);
        let filtered: Vec<String> = page.supplier_options("pac").into_iter().map(|n| n.name).collect();
        assert_eq!(filtered, vec!["Pacific Pharma"]);
    }

    #[test]
    fn test_remove_cell_uses_one_icon() {
        let fixture = fixture();
        let mut page = mounted(&fixture);
        page.table.on_column_sort("serialNumber").unwrap();
        page.table.set_selection([RecordId::from("1")]);

        let rows = page.table.rows();
        let remove = |index: usize| rows[index].cells[4].clone();
        assert_eq!(
            remove(0),
            CellView::Checkable {
                icon: REMOVE_ICON.to_string(),
                state: CheckState::Checked
            }
        );
        assert_eq!(
            remove(2),
            CellView::Checkable {
                icon: REMOVE_ICON.to_string(),
                state: CheckState::Unchecked
            }
        );
    }

    #[test]
    fn test_render_cells() {
        let fixture = fixture();
        let page = mounted(&fixture);
        let row = page.table.visible_rows()[0].clone();
        assert_eq!(render_cell("status", &row), Cell::text("New"));
        assert_eq!(render_cell("entryDate", &row), Cell::text("Fri May 03 2024"));
        assert_eq!(render_cell("serialNumber", &row), Cell::text("1"));
    }
}
