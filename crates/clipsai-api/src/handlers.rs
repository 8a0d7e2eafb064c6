//! Request handlers.

pub mod clips;
pub mod files;
pub mod health;
pub mod preloaded;

pub use clips::*;
pub use files::*;
pub use health::*;
pub use preloaded::*;
