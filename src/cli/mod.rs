pub mod commands;
pub mod ui;
pub mod util;

pub use util::{CommandContext, OutputFormat, load_image, read_json, read_json_or_default};
