//! Output helpers shared by the `mood-music` binary.
pub mod render;
