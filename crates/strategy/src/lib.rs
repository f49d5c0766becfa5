pub mod config_var;
pub mod registry;
pub mod required;
pub mod session;
pub mod validators;
pub mod xemm;

pub use config_var::{ConfigVar, EntryState, Prompt};
pub use registry::ConfigRegistry;
pub use required::RequiredExchanges;
pub use session::{ConfigSession, InputSource, Outcome, ResolveMode, ScriptedInput, SessionReport};
pub use xemm::{XemmDeps, XemmParams};
