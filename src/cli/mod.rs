//! Terminal output for runs

mod console;

pub use console::Console;
