use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::database::{DatabaseError, WriteTransaction};

/// Identity of a persisted record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Generate a fresh identifier
    pub fn generate() -> Self {
        Self(crate::utilities::generate_uuid())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Record types a page can watch for change notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    Name,
    User,
    Transaction,
    TransactionItem,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Name => "Name",
            RecordType::User => "User",
            RecordType::Transaction => "Transaction",
            RecordType::TransactionItem => "TransactionItem",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Name" => Some(RecordType::Name),
            "User" => Some(RecordType::User),
            "Transaction" => Some(RecordType::Transaction),
            "TransactionItem" => Some(RecordType::TransactionItem),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NameType {
    Customer,
    ExternalSupplier,
    InventoryAdjustment,
    Facility,
}

/// A trading partner or internal store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Name {
    pub id: RecordId,
    pub name: String,
    pub code: String,
    pub name_type: NameType,
}

impl Name {
    pub fn new(name: &str, code: &str, name_type: NameType) -> Self {
        Self {
            id: RecordId::generate(),
            name: name.to_string(),
            code: code.to_string(),
            name_type,
        }
    }

    pub fn is_external_supplier(&self) -> bool {
        self.name_type == NameType::ExternalSupplier
    }

    pub fn is_inventory_adjustment(&self) -> bool {
        self.name_type == NameType::InventoryAdjustment
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    pub username: String,
}

impl User {
    pub fn new(username: &str) -> Self {
        Self {
            id: RecordId::generate(),
            username: username.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    SupplierInvoice,
    CustomerInvoice,
}

/// Lifecycle of a transaction, stored with the short codes used by the mSupply server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    #[serde(rename = "nw")]
    New,
    #[serde(rename = "cn")]
    Confirmed,
    #[serde(rename = "fn")]
    Finalised,
}

impl TransactionStatus {
    pub fn code(&self) -> &'static str {
        match self {
            TransactionStatus::New => "nw",
            TransactionStatus::Confirmed => "cn",
            TransactionStatus::Finalised => "fn",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: RecordId,
    pub serial_number: String,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub other_party: RecordId,
    pub entry_date: NaiveDate,
    pub confirm_date: Option<NaiveDate>,
    pub comment: String,
    pub entered_by: Option<RecordId>,
}

impl Transaction {
    pub fn is_supplier_invoice(&self) -> bool {
        self.transaction_type == TransactionType::SupplierInvoice
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == TransactionStatus::Confirmed
    }

    pub fn is_finalised(&self) -> bool {
        self.status == TransactionStatus::Finalised
    }

    /// Supplier invoices raised against a real supplier, as opposed to stock adjustments
    pub fn is_external_supplier_invoice(&self, other_party: &Name) -> bool {
        self.is_supplier_invoice() && other_party.is_external_supplier()
    }

    /// Move to finalised, confirming first if the transaction is still new.
    pub fn finalise(&mut self, today: NaiveDate) {
        if self.status == TransactionStatus::New {
            self.status = TransactionStatus::Confirmed;
        }
        if self.confirm_date.is_none() {
            self.confirm_date = Some(today);
        }
        self.status = TransactionStatus::Finalised;
    }

    /// Delete this transaction and its items. Finalised transactions are locked.
    pub fn remove_self(&self, tx: &mut WriteTransaction) -> Result<(), DatabaseError> {
        if self.is_finalised() {
            return Err(DatabaseError::RecordLocked {
                record_type: RecordType::Transaction,
                id: self.id.clone(),
            });
        }

        let item_ids: Vec<RecordId> = tx
            .objects::<TransactionItem>()
            .filter(|item| item.transaction_id == self.id)
            .map(|item| item.id.clone())
            .collect();
        for item_id in item_ids {
            tx.delete::<TransactionItem>(&item_id)?;
        }

        tx.delete::<Transaction>(&self.id)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionItem {
    pub id: RecordId,
    pub transaction_id: RecordId,
    pub item_code: String,
    pub item_name: String,
    pub batch: String,
    pub expiry_date: Option<NaiveDate>,
    pub total_quantity: u32,
}

impl TransactionItem {
    pub fn new(transaction_id: &RecordId, item_code: &str, item_name: &str, total_quantity: u32) -> Self {
        Self {
            id: RecordId::generate(),
            transaction_id: transaction_id.clone(),
            item_code: item_code.to_string(),
            item_name: item_name.to_string(),
            batch: String::new(),
            expiry_date: None,
            total_quantity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoice(status: TransactionStatus) -> Transaction {
        Transaction {
            id: RecordId::from("t1"),
            serial_number: "7".to_string(),
            transaction_type: TransactionType::SupplierInvoice,
            status,
            other_party: RecordId::from("n1"),
            entry_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            confirm_date: None,
            comment: String::new(),
            entered_by: None,
        }
    }

    #[test]
    fn test_finalise_confirms_new_transaction() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let mut transaction = invoice(TransactionStatus::New);
        transaction.finalise(today);
        assert!(transaction.is_finalised());
        assert_eq!(transaction.confirm_date, Some(today));
    }

    #[test]
    fn test_finalise_keeps_existing_confirm_date() {
        let confirmed_on = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let mut transaction = invoice(TransactionStatus::Confirmed);
        transaction.confirm_date = Some(confirmed_on);
        transaction.finalise(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(transaction.confirm_date, Some(confirmed_on));
    }

    #[test]
    fn test_external_supplier_invoice() {
        let transaction = invoice(TransactionStatus::New);
        let supplier = Name::new("Pharma Co", "PC", NameType::ExternalSupplier);
        let adjustment = Name::new("Inventory adjustments", "invad", NameType::InventoryAdjustment);
        assert!(transaction.is_external_supplier_invoice(&supplier));
        assert!(!transaction.is_external_supplier_invoice(&adjustment));
    }

    #[test]
    fn test_status_serializes_as_server_code() {
        let json = serde_json::to_string(&TransactionStatus::Confirmed).unwrap();
        assert_eq!(json, "\"cn\"");
    }
}
