//! Core types and traits for the MutualCloud provider/job gateway.

mod dto;
mod registration;
mod traits;

pub use dto::*;
pub use registration::*;
pub use traits::*;
