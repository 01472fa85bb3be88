// Endpoints behind the session token middleware. Role and assignment checks
// happen per handler against the current database state.
pub mod auth;
pub mod catalogs;
pub mod files;
pub mod requests;
pub mod sap;
pub mod tickets;
pub mod workflows;
