//! Platform client adapters

mod console;

pub use console::ConsolePlatformClient;
