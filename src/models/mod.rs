pub mod action;
pub mod client_state;
pub mod loaders;
pub mod page;
pub mod registration;

pub use action::{Action, RandomStudent};
pub use client_state::ClientState;
pub use loaders::{load_all_toml_files, load_toml_to_client_state};
pub use page::{BusyIndicator, LogEntry, LogLevel, PageModel, REGISTRATION_FIELD};
pub use registration::RegistrationNumber;
