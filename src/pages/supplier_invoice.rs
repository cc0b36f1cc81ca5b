//! Supplier invoice edit view: the lines of one invoice

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use ratatui::text::{Line, Text};
use tracing::{debug, info, warn};

use crate::database::{Database, DatabaseError};
use crate::localization::table_strings;
use crate::models::{Name, RecordId, RecordType, Transaction, TransactionItem};
use crate::table::{
    Alignment, Cell, CheckableCell, Column, DataQuery, InputConstraints, TablePage, TableRecord,
};
use crate::utilities::{begins_with_ci, format_status, sort_data_by, SortValue};

const DATA_TYPES_SYNCHRONISED: [RecordType; 2] = [RecordType::TransactionItem, RecordType::Transaction];

impl TableRecord for TransactionItem {
    fn id(&self) -> &RecordId {
        &self.id
    }
}

/// Header facts shown above the item table
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceSummary {
    pub serial_number: String,
    pub supplier: String,
    pub status: &'static str,
    pub entry_date: NaiveDate,
    pub comment: String,
    pub item_count: usize,
    pub total_quantity: u64,
    pub is_finalised: bool,
}

pub struct SupplierInvoicePage {
    database: Database,
    transaction_id: RecordId,
    pub table: TablePage<TransactionItem>,
}

impl SupplierInvoicePage {
    pub fn new(database: Database, transaction_id: RecordId) -> Result<Self> {
        if database.get::<Transaction>(&transaction_id).is_none() {
            return Err(anyhow!("Supplier invoice '{}' not found", transaction_id));
        }

        let query_id = transaction_id.clone();
        let render_db = database.clone();
        let table = TablePage::builder(database.clone())
            .columns(Self::columns())
            .watched_types(&DATA_TYPES_SYNCHRONISED)
            .default_sort("itemName", true)
            .get_updated_data(move |db, query| get_updated_data(db, &query_id, query))
            .render_cell(move |key, item: &TransactionItem| {
                let is_finalised = render_db
                    .get::<Transaction>(&item.transaction_id)
                    .map(|transaction| transaction.is_finalised())
                    .unwrap_or(true);
                render_cell(key, item, is_finalised)
            })
            .on_end_editing(on_end_editing)
            .on_render_expansion(render_expansion)
            .build()?;

        Ok(Self {
            database,
            transaction_id,
            table,
        })
    }

    pub fn columns() -> Vec<Column> {
        vec![
            Column::new("itemCode", table_strings::ITEM_CODE, 1).sortable(),
            Column::new("itemName", table_strings::ITEM_NAME, 3).sortable(),
            Column::new("totalQuantity", table_strings::QUANTITY, 1)
                .sortable()
                .align(Alignment::Right),
            Column::new("remove", table_strings::REMOVE, 1).align(Alignment::Center),
        ]
    }

    pub fn transaction_id(&self) -> &RecordId {
        &self.transaction_id
    }

    pub fn summary(&self) -> Option<InvoiceSummary> {
        let transaction = self.database.get::<Transaction>(&self.transaction_id)?;
        let supplier = self
            .database
            .get::<Name>(&transaction.other_party)
            .map(|name| name.name)
            .unwrap_or_default();
        let items = self
            .database
            .objects::<TransactionItem>()
            .filtered(|item| item.transaction_id == self.transaction_id);

        Some(InvoiceSummary {
            serial_number: transaction.serial_number.clone(),
            supplier,
            status: format_status(transaction.status),
            entry_date: transaction.entry_date,
            comment: transaction.comment.clone(),
            item_count: items.len(),
            total_quantity: items.iter().map(|item| u64::from(item.total_quantity)).sum(),
            is_finalised: transaction.is_finalised(),
        })
    }

    /// Remove the selected lines in one write transaction
    pub fn on_delete_confirm(&mut self) -> Result<usize> {
        let selection = self.table.selected_ids();
        let transaction_id = self.transaction_id.clone();
        let removed = self.database.write(|tx| {
            if tx
                .get::<Transaction>(&transaction_id)
                .is_some_and(|transaction| transaction.is_finalised())
            {
                return Err(DatabaseError::RecordLocked {
                    record_type: RecordType::Transaction,
                    id: transaction_id.clone(),
                });
            }
            for id in &selection {
                tx.delete::<TransactionItem>(id)?;
            }
            Ok(selection.len())
        })?;

        info!("Removed {} line(s) from invoice {}", removed, self.transaction_id);
        self.table.clear_selection();
        self.table.refresh()?;
        Ok(removed)
    }

    pub fn on_delete_cancel(&mut self) -> Result<()> {
        self.table.clear_selection();
        self.table.refresh()?;
        Ok(())
    }
}

fn get_updated_data(
    database: &Database,
    transaction_id: &RecordId,
    query: &DataQuery,
) -> Result<Vec<TransactionItem>, DatabaseError> {
    let items = database
        .objects::<TransactionItem>()
        .filtered(|item| &item.transaction_id == transaction_id)
        .filtered(|item| {
            begins_with_ci(&item.item_name, &query.search_term)
                || begins_with_ci(&item.item_code, &query.search_term)
        })
        .into_vec();

    let sort_value: Option<fn(&TransactionItem) -> SortValue> = match query.sort_by.as_deref() {
        Some("itemCode") => Some(|item: &TransactionItem| SortValue::Text(item.item_code.clone())),
        Some("itemName") => Some(|item: &TransactionItem| SortValue::Text(item.item_name.clone())),
        Some("totalQuantity") => Some(|item: &TransactionItem| {
            SortValue::Number(f64::from(item.total_quantity))
        }),
        _ => None,
    };

    Ok(match sort_value {
        Some(sort_value) => sort_data_by(items, sort_value, query.is_ascending),
        None => items,
    })
}

fn render_cell(key: &str, item: &TransactionItem, is_finalised: bool) -> Cell {
    match key {
        "itemCode" => item.item_code.as_str().into(),
        "totalQuantity" if is_finalised => item.total_quantity.to_string().into(),
        "totalQuantity" => Cell::editable(
            item.total_quantity.to_string(),
            InputConstraints::numeric_chain(),
        ),
        "remove" => CheckableCell::new().disabled(is_finalised).into(),
        _ => item.item_name.as_str().into(),
    }
}

/// Store an edited quantity. Input that is not a whole number is ignored.
fn on_end_editing(database: &Database, key: &str, item: &TransactionItem, value: &str) -> Result<()> {
    if key != "totalQuantity" {
        return Ok(());
    }
    let quantity = match value.trim().parse::<u32>() {
        Ok(quantity) => quantity,
        Err(_) => {
            warn!("Ignoring invalid quantity '{}' for {}", value, item.item_code);
            return Ok(());
        }
    };
    if quantity == item.total_quantity {
        debug!("Quantity of {} unchanged", item.item_code);
        return Ok(());
    }

    database.write(|tx| {
        let mut stored = tx
            .get::<TransactionItem>(&item.id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound {
                record_type: RecordType::TransactionItem,
                id: item.id.clone(),
            })?;
        stored.total_quantity = quantity;
        tx.save(stored);
        Ok(())
    })?;
    Ok(())
}

fn render_expansion(item: &TransactionItem) -> Text<'static> {
    let batch = if item.batch.is_empty() {
        "-".to_string()
    } else {
        item.batch.clone()
    };
    let expiry = item
        .expiry_date
        .map(|date| date.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "-".to_string());
    Text::from(vec![
        Line::from(format!("Batch: {}", batch)),
        Line::from(format!("Expiry: {}", expiry)),
    ])
}
