pub mod error;
pub mod event;
pub mod types;

pub use error::RequestError;
pub use event::{ChangeEvent, ChangeType};
pub use types::Item;
