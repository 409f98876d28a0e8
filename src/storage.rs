//! Retrieval of rendered recipe files from the results bucket.

use std::fs;
use std::path::PathBuf;

use s3::creds::Credentials;
use s3::{Bucket, Region};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage credentials unavailable: {0}")]
    Credentials(String),
    #[error("invalid storage region: {0}")]
    Region(String),
    #[error("object fetch failed with status code: {0}")]
    Status(u16),
    #[error(transparent)]
    S3(#[from] s3::error::S3Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Object-storage seam: fetch `key` from the configured bucket and save it
/// under `local_name` in the working directory.
pub trait ObjectStore {
    fn fetch(&self, key: &str, local_name: &str) -> Result<PathBuf, StorageError>;
}

/// S3-backed store. Credentials come from the default provider chain and
/// are resolved per call, so a misconfigured environment surfaces as a
/// per-command error instead of a startup failure.
pub struct S3Store {
    bucket: String,
    region: String,
}

impl S3Store {
    pub fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
        }
    }
}

impl ObjectStore for S3Store {
    fn fetch(&self, key: &str, local_name: &str) -> Result<PathBuf, StorageError> {
        let region = self
            .region
            .parse::<Region>()
            .map_err(|err| StorageError::Region(err.to_string()))?;
        let credentials =
            Credentials::default().map_err(|err| StorageError::Credentials(err.to_string()))?;
        let bucket = Bucket::new(&self.bucket, region, credentials)?;

        let object = bucket.get_object(key)?;
        if object.status_code() != 200 {
            return Err(StorageError::Status(object.status_code()));
        }

        let path = PathBuf::from(local_name);
        fs::write(&path, object.bytes())?;
        Ok(path)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FakeStore;
    use super::*;

    #[test]
    fn fetch_saves_the_object_under_the_given_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = FakeStore::new(dir.path(), b"1. Preheat the oven.");

        let saved = store.fetch("results/52772.txt", "teriyaki.txt").unwrap();

        assert_eq!(saved.file_name().unwrap(), "teriyaki.txt");
        assert_eq!(fs::read(&saved).unwrap(), b"1. Preheat the oven.");
        assert_eq!(store.requested_keys(), vec!["results/52772.txt"]);
    }

    #[test]
    fn status_error_reports_the_code() {
        let err = StorageError::Status(403);
        assert!(err.to_string().contains("403"));
    }
}
