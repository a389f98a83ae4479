//! Pure logic: directive scanning, target extraction, mode parsing.
//!
//! Nothing here touches the filesystem or spawns processes.

pub mod extract;
pub mod instructions;
pub mod mode;
