// The uploader: drives a single file through the two-phase handshake.
//
//   Start -> FileOpened -> Registered(location) -> Uploaded(body) -> Done
//
// Any step returning an error ends the run; nothing is retried.

use crate::api::{DataQueueClient, UploadRequest};
use crate::config::UploadConfig;
use crate::error::UploadError;
use crate::ui;
use reqwest::Url;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A local file opened for upload, together with what the handshake needs
/// to know about it. Dropping it closes the file.
#[derive(Debug)]
pub struct OpenedFile {
    file: File,
    path: PathBuf,
    name: String,
    size: u64,
}

impl OpenedFile {
    /// Open and stat `path`. The base name is computed here so a path
    /// without one fails before any request is made.
    pub fn open(path: &Path) -> Result<Self, UploadError> {
        let access = |source: std::io::Error| UploadError::FileAccess {
            path: path.to_path_buf(),
            source,
        };
        let name = base_name(path).ok_or_else(|| {
            access(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "path has no usable file name",
            ))
        })?;
        let file = File::open(path).map_err(access)?;
        let size = file.metadata().map_err(access)?.len();
        Ok(OpenedFile {
            file,
            path: path.to_path_buf(),
            name,
            size,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Exact size in bytes, as reported by the filesystem.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Read the whole file into memory, consuming (and closing) it.
    fn into_bytes(mut self) -> Result<(String, Vec<u8>), UploadError> {
        let mut buffer = Vec::with_capacity(usize::try_from(self.size).unwrap_or(0));
        self.file
            .read_to_end(&mut buffer)
            .map_err(|source| UploadError::FileAccess {
                path: self.path.clone(),
                source,
            })?;
        Ok((self.name, buffer))
    }
}

/// Last path component as UTF-8, the value sent as `name` and used as
/// the multipart filename.
pub fn base_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(str::to_string)
}

/// Runs one upload described by an [`UploadConfig`].
pub struct Uploader {
    config: UploadConfig,
    client: DataQueueClient,
}

impl Uploader {
    pub fn new(config: UploadConfig) -> Result<Self, UploadError> {
        if !config.verify_tls {
            tracing::warn!("server certificate verification is disabled");
        }
        let client = DataQueueClient::new(&config)?;
        Ok(Uploader { config, client })
    }

    /// Perform the whole handshake and return the body of the final 202
    /// response.
    pub fn run(&self) -> Result<String, UploadError> {
        let file = OpenedFile::open(&self.config.path)?;
        info!(path = %self.config.path.display(), size = file.size(), "file opened");

        let location = self.register(&file)?;
        info!(%location, "upload registered");

        let body = self.upload(file, location)?;
        info!(bytes = body.len(), "upload accepted");
        Ok(body)
    }

    fn register(&self, file: &OpenedFile) -> Result<Url, UploadError> {
        let req = UploadRequest {
            conservation_area: self.config.conservation_area.clone(),
            xml_type: self.config.xml_type.clone(),
            name: file.name().to_string(),
        };
        debug!(?req, "registration body");
        let spinner = ui::spinner("Registering upload...");
        let result = self.client.register(&req, file.size());
        spinner.finish_and_clear();
        result
    }

    fn upload(&self, file: OpenedFile, location: Url) -> Result<String, UploadError> {
        let (name, bytes) = file.into_bytes()?;
        let spinner = ui::spinner("Uploading file...");
        let result = self.client.upload(location, &name, bytes);
        spinner.finish_and_clear();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn base_name_strips_directories() {
        assert_eq!(base_name(Path::new("/tmp/data/patrol.xml")).as_deref(), Some("patrol.xml"));
        assert_eq!(base_name(Path::new("patrol.xml")).as_deref(), Some("patrol.xml"));
        assert_eq!(base_name(Path::new("/")), None);
        assert_eq!(base_name(Path::new("..")), None);
    }

    #[test]
    fn opened_file_reports_exact_size() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"<patrol/>").unwrap();
        let opened = OpenedFile::open(tmp.path()).unwrap();
        assert_eq!(opened.size(), 9);
        let (_, bytes) = opened.into_bytes().unwrap();
        assert_eq!(bytes, b"<patrol/>");
    }

    #[test]
    fn missing_file_is_a_file_access_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = OpenedFile::open(&dir.path().join("absent.xml")).unwrap_err();
        assert!(matches!(err, UploadError::FileAccess { .. }));
    }
}
