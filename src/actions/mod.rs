pub(crate) mod copy_to_clipboard;
pub(crate) mod create_temp_file;
pub mod open_input;
pub(crate) mod print_file;
pub(crate) mod run_converter;

use std::process::Output;

/// Stdout followed by stderr, as the user would see it in a terminal.
fn combined_output(output: &Output) -> String {
    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    combined.trim().to_string()
}
