pub mod audit;
pub mod case;
pub mod catalog;
pub mod note;
pub mod request;
pub mod user;
pub mod workflow;

pub use audit::{AuditEntry, AUDIT_SELECT};
pub use case::{CaseView, CASE_SELECT};
pub use catalog::{Activity, Category, Department, Place, Status, Subcategory, STATUS_OPEN};
pub use note::Note;
pub use request::{GeneralRequestView, REQUEST_SELECT};
pub use user::{Company, Role, SubprocessGrant, User};
pub use workflow::{ProcessCategory, Task, WorkflowAssignee, PROCESS_CATEGORY_SELECT, TASK_SELECT};
