//! HTTP controllers for handling requests

pub mod documents;
pub mod health;
pub mod scan;

pub use documents::*;
pub use health::*;
pub use scan::*;
