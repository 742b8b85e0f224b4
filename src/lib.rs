// Library root
// -----------
// This crate exposes the uploader as a library; the binary (`main.rs`)
// only parses flags, sets up logging and prints the result.
//
// Module responsibilities:
// - `cli`: flag definitions and conversion into an `UploadConfig`.
// - `config`: the per-run configuration and Basic credentials.
// - `api`: the two HTTP calls of the data queue handshake.
// - `upload`: opens the file and drives it through the handshake.
// - `ui`: spinner on stderr and the final response block on stdout.
// - `error`: the error type shared by all of the above.
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod ui;
pub mod upload;

pub use config::{Credentials, UploadConfig};
pub use error::{Stage, UploadError};
pub use upload::Uploader;
