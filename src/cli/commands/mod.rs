pub mod database;
pub mod sap;
pub mod token;
