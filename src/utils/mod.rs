//! Utility modules shared by the engine, the server and the commands.

pub mod exec;
pub mod mime;
pub mod path;
