//! Delivery sinks for finished documents.

pub mod clipboard;
pub mod file;

pub use clipboard::{Osc52Clipboard, SystemClipboard};
pub use file::DirectoryFileSink;
