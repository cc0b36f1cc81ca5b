//! Domain pages built on the generic table page

pub mod supplier_invoice;
pub mod supplier_invoices;

use crate::models::RecordId;

pub use supplier_invoice::SupplierInvoicePage;
pub use supplier_invoices::{navigate_to_invoice, InvoiceRow, SupplierInvoicesPage};

/// Navigation targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    SupplierInvoices,
    SupplierInvoice { transaction_id: RecordId, title: String },
}

impl Route {
    pub fn title(&self) -> &str {
        match self {
            Route::SupplierInvoices => crate::localization::nav_strings::SUPPLIER_INVOICES,
            Route::SupplierInvoice { title, .. } => title,
        }
    }
}
