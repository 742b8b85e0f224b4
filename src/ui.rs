// UI layer: everything the operator sees. Progress goes to stderr through
// an `indicatif` spinner, the final server response goes to stdout.

use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::time::Duration;

/// Marker printed in front of the server's final response body.
pub const RESPONSE_MARKER: &str = "RESPONSE>>>>> ";

/// Start a spinner on stderr. indicatif hides it when stderr is not a
/// terminal, so piped and scripted runs stay clean.
pub fn spinner(msg: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(msg);
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

/// The exact text block written on success.
pub fn render_response(body: &str) -> String {
    format!("\n{RESPONSE_MARKER}{body}\n")
}

/// Write the response block to `out`.
pub fn print_response<W: Write>(out: &mut W, body: &str) -> io::Result<()> {
    out.write_all(render_response(body).as_bytes())?;
    out.flush()
}
