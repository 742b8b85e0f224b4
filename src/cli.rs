// CLI glue: flag definitions and their conversion into an `UploadConfig`.
// Every flag can also be supplied through an `UPLOADER_*` environment
// variable (a `.env` file is loaded by the binary before parsing).

use crate::config::{Credentials, UploadConfig};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use reqwest::Url;
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

/// Upload a file to a server's data queue.
#[derive(Parser, Debug)]
#[command(name = "uploader", version)]
pub struct Cli {
    /// File to upload
    #[arg(short = 'f', long = "file", env = "UPLOADER_FILE")]
    pub file: PathBuf,

    /// Server api url
    #[arg(short = 's', long = "server", env = "UPLOADER_SERVER")]
    pub server: Url,

    /// Login username
    #[arg(short = 'u', long = "user", env = "UPLOADER_USER")]
    pub user: String,

    /// Login pass
    #[arg(short = 'p', long = "pass", env = "UPLOADER_PASS", hide_env_values = true)]
    pub pass: String,

    /// Xml file type
    #[arg(short = 't', long = "type", env = "UPLOADER_TYPE")]
    pub xml_type: String,

    /// Conservation area to upload the file to
    #[arg(short = 'c', long = "carea", env = "UPLOADER_CAREA")]
    pub carea: String,

    /// Accept any server certificate
    #[arg(short = 'k', long = "insecure", env = "UPLOADER_INSECURE")]
    pub insecure: bool,

    /// Per-request timeout in seconds (no timeout when omitted)
    #[arg(long = "timeout", env = "UPLOADER_TIMEOUT", value_name = "SECONDS")]
    pub timeout: Option<u64>,
}

impl Cli {
    /// Parse the process arguments, exiting with usage on any error
    /// (status 2), including a `--file` that is not an existing file.
    pub fn parse_checked() -> Self {
        Self::try_parse_checked_from(std::env::args_os()).unwrap_or_else(|e| e.exit())
    }

    pub fn try_parse_checked_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cli = Self::try_parse_from(args)?;
        cli.check_file()?;
        Ok(cli)
    }

    // Open/stat failures past this point (permissions, races) surface at
    // run time as `UploadError::FileAccess`.
    fn check_file(&self) -> Result<(), clap::Error> {
        if self.file.is_file() {
            return Ok(());
        }
        let msg = format!(
            "invalid value '{}' for '--file <FILE>': path does not exist or is not a file",
            self.file.display()
        );
        Err(Self::command().error(ErrorKind::ValueValidation, msg))
    }

    pub fn into_config(self) -> UploadConfig {
        UploadConfig {
            path: self.file,
            server: self.server,
            credentials: Credentials::new(self.user, self.pass),
            xml_type: self.xml_type,
            conservation_area: self.carea,
            verify_tls: !self.insecure,
            timeout: self.timeout.map(Duration::from_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [&str; 13] = [
        "uploader", "-f", "data/patrol.xml", "-s", "https://smart.example.org", "-u", "ranger",
        "-p", "secret", "-t", "patrol", "-c", "north",
    ];

    #[test]
    fn short_flags_map_into_config() {
        let config = Cli::try_parse_from(REQUIRED).unwrap().into_config();
        assert_eq!(config.path, PathBuf::from("data/patrol.xml"));
        assert_eq!(config.server.as_str(), "https://smart.example.org/");
        assert_eq!(config.credentials.username, "ranger");
        assert_eq!(config.xml_type, "patrol");
        assert_eq!(config.conservation_area, "north");
        assert!(config.verify_tls);
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn long_flags_and_hardening_options() {
        let cli = Cli::try_parse_from([
            "uploader", "--file", "a.xml", "--server", "https://x", "--user", "u", "--pass", "p",
            "--type", "t", "--carea", "c", "--insecure", "--timeout", "30",
        ])
        .unwrap();
        let config = cli.into_config();
        assert!(!config.verify_tls);
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn missing_required_flag_is_an_error() {
        let args = REQUIRED[..REQUIRED.len() - 2].iter().copied();
        let err = Cli::try_parse_from(args).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn nonexistent_file_is_an_argument_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.xml");
        let mut args: Vec<OsString> = REQUIRED.iter().map(OsString::from).collect();
        args[2] = missing.clone().into();

        let err = Cli::try_parse_checked_from(&args).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("absent.xml"));

        args[2] = dir.path().as_os_str().to_owned();
        let err = Cli::try_parse_checked_from(&args).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn existing_file_passes_checked_parse() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut args: Vec<OsString> = REQUIRED.iter().map(OsString::from).collect();
        args[2] = file.path().as_os_str().to_owned();
        let cli = Cli::try_parse_checked_from(&args).unwrap();
        assert_eq!(cli.file, file.path());
    }

    #[test]
    fn server_must_be_a_url() {
        let mut args = REQUIRED;
        args[4] = "not a url";
        let err = Cli::try_parse_from(args).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }
}
