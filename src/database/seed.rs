//! Demo content for an empty store

use chrono::{Duration, NaiveDate};
use tracing::info;

use super::{Database, DatabaseError};
use crate::models::{
    Name, NameType, RecordId, Transaction, TransactionItem, TransactionStatus, TransactionType,
    User,
};
use crate::utilities::today;

struct SeedInvoice {
    serial_number: &'static str,
    supplier: usize,
    status: TransactionStatus,
    days_ago: i64,
    comment: &'static str,
    items: &'static [(&'static str, &'static str, &'static str, u32)],
}

const SUPPLIERS: [(&str, &str); 3] = [
    ("Central Medical Stores", "CMS"),
    ("Pacific Pharma", "PPH"),
    ("Mercy Wholesale", "MWS"),
];

const INVOICES: [SeedInvoice; 5] = [
    SeedInvoice {
        serial_number: "1",
        supplier: 0,
        status: TransactionStatus::Finalised,
        days_ago: 40,
        comment: "Quarterly order",
        items: &[
            ("AMX250", "Amoxicillin 250mg caps", "B1021", 500),
            ("PCM500", "Paracetamol 500mg tabs", "B0930", 1000),
        ],
    },
    SeedInvoice {
        serial_number: "2",
        supplier: 1,
        status: TransactionStatus::Confirmed,
        days_ago: 21,
        comment: "Arrived through sync",
        items: &[("ORS1L", "Oral rehydration salts 1L", "R2201", 200)],
    },
    SeedInvoice {
        serial_number: "3",
        supplier: 2,
        status: TransactionStatus::New,
        days_ago: 9,
        comment: "",
        items: &[
            ("GLV-M", "Examination gloves (M)", "G7781", 50),
            ("SYR5", "Syringe 5ml", "S1002", 300),
        ],
    },
    SeedInvoice {
        serial_number: "4",
        supplier: 0,
        status: TransactionStatus::New,
        days_ago: 3,
        comment: "Emergency top-up",
        items: &[("MTZ200", "Metronidazole 200mg tabs", "M3310", 250)],
    },
    SeedInvoice {
        serial_number: "10",
        supplier: 1,
        status: TransactionStatus::New,
        days_ago: 1,
        comment: "",
        items: &[],
    },
];

/// Populate `db` with suppliers, a user, and a handful of supplier invoices.
/// Returns the seeded user.
pub fn seed_demo_data(db: &Database, username: &str) -> Result<User, DatabaseError> {
    let today = today();

    let user = db.write(|tx| {
        let user = tx.create(User::new(username))?;

        let suppliers: Vec<Name> = SUPPLIERS
            .iter()
            .map(|(name, code)| tx.create(Name::new(name, code, NameType::ExternalSupplier)))
            .collect::<Result<_, _>>()?;
        let adjustments = tx.create(Name::new(
            "Inventory adjustments",
            "invad",
            NameType::InventoryAdjustment,
        ))?;
        tx.create(Name::new("District Hospital", "DH", NameType::Customer))?;

        for seed in &INVOICES {
            let invoice = seed_invoice(seed, &suppliers[seed.supplier], &user, today);
            let invoice = tx.create(invoice)?;
            for (code, name, batch, quantity) in seed.items {
                let mut item = TransactionItem::new(&invoice.id, code, name, *quantity);
                item.batch = batch.to_string();
                item.expiry_date = Some(today + Duration::days(365));
                tx.create(item)?;
            }
        }

        // Stock adjustments are stored as supplier invoices too, but never listed
        let adjustment = Transaction {
            id: RecordId::generate(),
            serial_number: "5".to_string(),
            transaction_type: TransactionType::SupplierInvoice,
            status: TransactionStatus::Finalised,
            other_party: adjustments.id.clone(),
            entry_date: today - Duration::days(14),
            confirm_date: Some(today - Duration::days(14)),
            comment: "Stocktake variance".to_string(),
            entered_by: Some(user.id.clone()),
        };
        tx.create(adjustment)?;

        Ok(user)
    })?;

    info!("Seeded demo data for user {}", user.username);
    Ok(user)
}

fn seed_invoice(seed: &SeedInvoice, supplier: &Name, user: &User, today: NaiveDate) -> Transaction {
    let entry_date = today - Duration::days(seed.days_ago);
    let confirm_date = match seed.status {
        TransactionStatus::New => None,
        _ => Some(entry_date),
    };
    Transaction {
        id: RecordId::generate(),
        serial_number: seed.serial_number.to_string(),
        transaction_type: TransactionType::SupplierInvoice,
        status: seed.status,
        other_party: supplier.id.clone(),
        entry_date,
        confirm_date,
        comment: seed.comment.to_string(),
        entered_by: Some(user.id.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_populates_store() {
        let db = Database::new();
        let user = seed_demo_data(&db, "demo").unwrap();
        assert_eq!(user.username, "demo");
        assert_eq!(db.objects::<User>().len(), 1);
        assert_eq!(db.objects::<Name>().len(), 5);
        assert_eq!(db.objects::<Transaction>().len(), 6);
        assert_eq!(db.objects::<TransactionItem>().len(), 6);
        assert!(db
            .objects::<Transaction>()
            .find(|t| t.status == TransactionStatus::Confirmed)
            .is_some());
    }
}
