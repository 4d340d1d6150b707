pub mod constants;
pub mod error;
pub mod event;
pub mod record;
pub mod types;

pub use constants::*;
pub use error::RegistryError;
pub use event::Event;
pub use record::NameRecord;
pub use types::*;
