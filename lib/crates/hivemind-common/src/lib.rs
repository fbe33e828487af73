pub mod error;
pub mod program;
pub mod types;

pub use error::{LifecycleError, StoreError, SupervisorError, TemplateError};
pub use program::{derive_program_name, is_valid_agent_name, parse_program_name};
pub use types::*;
