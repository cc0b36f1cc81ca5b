//! Record construction inside write transactions

use tracing::info;

use super::{DatabaseError, WriteTransaction};
use crate::models::{
    Name, RecordId, Transaction, TransactionStatus, TransactionType, User,
};
use crate::utilities::today;

/// Next free supplier invoice serial number
fn next_serial_number(tx: &WriteTransaction) -> String {
    let highest = tx
        .objects::<Transaction>()
        .filter(|transaction| transaction.is_supplier_invoice())
        .filter_map(|transaction| transaction.serial_number.trim().parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    (highest + 1).to_string()
}

/// Create a new supplier invoice from `other_party`, entered by `user`
pub fn create_supplier_invoice(
    tx: &mut WriteTransaction,
    other_party: &Name,
    user: &User,
) -> Result<Transaction, DatabaseError> {
    let invoice = Transaction {
        id: RecordId::generate(),
        serial_number: next_serial_number(tx),
        transaction_type: TransactionType::SupplierInvoice,
        status: TransactionStatus::New,
        other_party: other_party.id.clone(),
        entry_date: today(),
        confirm_date: None,
        comment: String::new(),
        entered_by: Some(user.id.clone()),
    };

    info!(
        "Creating supplier invoice {} for {}",
        invoice.serial_number, other_party.name
    );
    tx.create(invoice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::models::NameType;

    #[test]
    fn test_serial_numbers_increase() {
        let db = Database::new();
        let supplier = Name::new("Pharma Co", "PC", NameType::ExternalSupplier);
        let user = User::new("admin");

        let first = db
            .write(|tx| create_supplier_invoice(tx, &supplier, &user))
            .unwrap();
        let second = db
            .write(|tx| create_supplier_invoice(tx, &supplier, &user))
            .unwrap();

        assert_eq!(first.serial_number, "1");
        assert_eq!(second.serial_number, "2");
        assert_eq!(second.status, TransactionStatus::New);
        assert_eq!(second.entered_by, Some(user.id.clone()));
    }
}
