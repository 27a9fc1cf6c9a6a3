pub mod coerce;
pub mod document;
pub mod errors;
pub mod format;
pub mod layout;
pub mod line_item;
pub mod ports;
pub mod pricing;
