// Thin re-export module: implementation lives in `blockchain/core.rs` and its
// submodules (chain management, validation).

pub mod core;
pub use self::core::*;
