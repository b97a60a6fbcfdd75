mod output;

pub use output::{ConsoleView, Output};
