pub mod contract;
pub mod envelope;
pub mod extract;
pub mod project;
pub mod state;

pub use contract::{CheckKind, ContractValidator, Outcome};
pub use envelope::{HookEvent, HookResponse, ToolPayload};
pub use state::{RestartPolicy, WorkflowState};
