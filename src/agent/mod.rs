//! OS automation: command classification, dispatch, and the platform layer.

pub mod classifier;
pub mod insights;
pub mod macros;
pub mod os;
pub mod personalizer;
pub mod router;
pub mod system;

pub use classifier::{classify, is_command, CommandKind};
pub use os::{OsActions, ProcessUsage, SystemStatus, VolumeDirection};
pub use personalizer::Personalizer;
pub use router::{CommandResult, CommandRouter};
pub use system::SystemActions;
