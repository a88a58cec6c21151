pub mod config;
pub mod error;
pub mod types;
pub mod window;

pub use error::{Error, Result};
pub use types::*;
pub use window::DateWindow;
