pub mod core;
pub mod utils;

// Re-export everything from core for ergonomic library use
// Users can write `deskforge::config` instead of `deskforge::core::config`
pub use core::*;
pub use utils::*;
