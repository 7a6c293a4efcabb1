pub mod registry;
pub mod state;

pub use registry::SessionRegistry;
pub use state::{SessionSnapshot, SessionState, SessionStatus, SessionSummary};
