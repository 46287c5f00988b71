use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use tracing::debug;

use crate::config::ObjectStorageConfig;
use crate::error::{Result, StoreError};

/// Remote object storage for uploaded images.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` under `name` and return the object's public URL.
    async fn upload(&self, name: &str, data: &[u8], content_type: &str) -> Result<String>;

    /// Download an object by the URL [`ObjectStore::upload`] returned.
    ///
    /// Fails on transport errors and on any non-success status.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// [`ObjectStore`] backed by an S3-compatible bucket.
///
/// Uploads are signed S3 `PUT`s; downloads are plain HTTP `GET`s against the
/// public URL, so any previously returned URL stays readable.
pub struct S3ObjectStore {
    bucket: Box<Bucket>,
    http: reqwest::Client,
    prefix: String,
}

impl S3ObjectStore {
    pub fn new(config: &ObjectStorageConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("https://s3.{}.amazonaws.com", config.region));
        let region = Region::Custom {
            region: config.region.clone(),
            endpoint,
        };

        let credentials = match (&config.access_key, &config.secret_key) {
            (Some(access), Some(secret)) => {
                Credentials::new(Some(access.as_str()), Some(secret.as_str()), None, None, None)?
            }
            _ => Credentials::anonymous()?,
        };

        let mut bucket = Bucket::new(&config.bucket, region, credentials)?;
        if config.path_style {
            bucket = bucket.with_path_style();
        }

        Ok(Self {
            bucket,
            http: reqwest::Client::new(),
            prefix: config.prefix.trim_matches('/').to_string(),
        })
    }

    fn object_key(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.prefix, name)
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn upload(&self, name: &str, data: &[u8], content_type: &str) -> Result<String> {
        let key = self.object_key(name);
        let response = self
            .bucket
            .put_object_with_content_type(&key, data, content_type)
            .await?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(StoreError::ObjectStore(format!(
                "upload of {key} rejected with status {status}"
            )));
        }

        let url = format!("{}/{}", self.bucket.url(), key);
        debug!(%url, size = data.len(), "Uploaded image");
        Ok(url)
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}
