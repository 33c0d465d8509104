pub mod engine;
pub mod route;
pub mod state;

pub use engine::{WorkflowEngine, WorkflowOutcome};
pub use route::{Command, ReviewTemplate, RoutingPolicy};
pub use state::{Category, Classification, IssueState};
