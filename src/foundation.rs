/// Integer pixel geometry.
pub mod core;
/// Error type shared by every stage.
pub mod error;
