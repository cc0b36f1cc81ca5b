//! User-facing strings

pub mod table_strings {
    pub const INVOICE_NUMBER: &str = "Invoice Number";
    pub const STATUS: &str = "Status";
    pub const ENTERED_DATE: &str = "Entered Date";
    pub const COMMENT: &str = "Comment";
    pub const REMOVE: &str = "Remove";
    pub const ITEM_CODE: &str = "Item Code";
    pub const ITEM_NAME: &str = "Item Name";
    pub const QUANTITY: &str = "Quantity";
}

pub mod button_strings {
    pub const NEW_SUPPLIER_INVOICE: &str = "New Supplier Invoice";
}

pub mod modal_strings {
    pub const REMOVE_THESE_ITEMS: &str = "Are you sure you want to remove these items?";
    pub const REMOVE: &str = "Remove";
    pub const CANCEL: &str = "Cancel";
    pub const START_TYPING_TO_SELECT_SUPPLIER: &str = "Start typing to select supplier";
    pub const SEARCH_FOR_THE_SUPPLIER: &str = "Search for the supplier";
}

pub mod nav_strings {
    pub const SUPPLIER_INVOICES: &str = "Supplier Invoices";
    pub const INVOICE: &str = "Invoice";
}

pub mod general_strings {
    pub const SEARCH: &str = "Search";
    pub const SEARCH_BY_INVOICE_NUMBER: &str = "Search by invoice number";
    pub const SEARCH_BY_ITEM: &str = "Search by item name or code";
}
