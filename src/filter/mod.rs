pub mod audit_filter;
pub mod error;
pub mod filter;
pub mod filter_order;
pub mod filter_where;
pub mod request_filter;
pub mod ticket_filter;
pub mod workflow_filter;
pub mod types;

pub use audit_filter::AuditFilter;
pub use filter::{Filter, ListQuery};
pub use filter_where::FilterWhere;
pub use request_filter::RequestFilter;
pub use ticket_filter::TicketFilter;
pub use workflow_filter::WorkflowFilter;
pub use types::*;
