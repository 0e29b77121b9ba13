//! Core types, session reconstruction, and validation for the LMS analytics engine.

pub mod error;
pub mod offering;
pub mod records;
pub mod session;

pub use error::{Error, Result};
pub use offering::*;
pub use records::*;
pub use session::*;
