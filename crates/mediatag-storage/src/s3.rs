use crate::keys::generate_object_name;
use crate::traits::{Storage, StorageError, StorageResult, StoredObject};
use crate::StorageBackend;
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::retry::RetryConfig;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use aws_sdk_s3::Client;
use bytes::Bytes;
use mediatag_core::S3StorageConfig;

/// Region that must not be sent as a location constraint.
const DEFAULT_REGION: &str = "us-east-1";

/// S3 storage implementation (AWS S3 or an S3-compatible host such as MinIO)
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    config: S3StorageConfig,
}

impl S3Storage {
    /// Create a new S3Storage instance from a fully-built config.
    ///
    /// Credentials come from `access_key_id`/`secret_access_key` when both are
    /// set, otherwise from the default AWS provider chain.
    pub async fn new(config: S3StorageConfig) -> StorageResult<Self> {
        if config.bucket.trim().is_empty() {
            return Err(StorageError::ConfigError(
                "bucket name must not be empty".to_string(),
            ));
        }

        let region_provider =
            RegionProviderChain::first_try(aws_config::Region::new(config.region.clone()));

        // single attempt, callers own the retry policy
        let retry_config = RetryConfig::standard().with_max_attempts(1);

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .retry_config(retry_config);

        if let (Some(key_id), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            loader = loader.credentials_provider(Credentials::new(
                key_id.clone(),
                secret.clone(),
                None,
                None,
                "mediatag-static",
            ));
        }

        let sdk_config = loader.load().await;

        let client = if let Some(ref endpoint) = config.endpoint {
            // Path-style addressing is required for MinIO and most S3-compatible hosts
            let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
                .endpoint_url(endpoint)
                .force_path_style(true)
                .build();
            Client::from_conf(s3_config)
        } else {
            Client::new(&sdk_config)
        };

        Ok(S3Storage { client, config })
    }

    /// Generate public URL for an object
    ///
    /// With a custom endpoint: `{endpoint}/{bucket}/{key}`. Otherwise the
    /// virtual-hosted AWS form.
    fn generate_url(&self, key: &str) -> String {
        if let Some(ref endpoint) = self.config.endpoint {
            format!(
                "{}/{}/{}",
                endpoint.trim_end_matches('/'),
                self.config.bucket,
                key
            )
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.config.bucket, self.config.region, key
            )
        }
    }

    async fn create_bucket_if_missing(&self) -> StorageResult<()> {
        let mut request = self.client.create_bucket().bucket(&self.config.bucket);
        if self.config.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(
                        self.config.region.as_str(),
                    ))
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => {
                tracing::info!(bucket = %self.config.bucket, "Bucket created");
                Ok(())
            }
            Err(SdkError::ServiceError(service_err))
                if service_err.err().is_bucket_already_owned_by_you()
                    || service_err.err().is_bucket_already_exists() =>
            {
                tracing::debug!(bucket = %self.config.bucket, "Bucket already exists");
                Ok(())
            }
            Err(create_err) => {
                // Some providers answer CreateBucket on an existing bucket with a
                // generic error; the bucket counts as ready if HeadBucket succeeds.
                match self
                    .client
                    .head_bucket()
                    .bucket(&self.config.bucket)
                    .send()
                    .await
                {
                    Ok(_) => {
                        tracing::debug!(
                            bucket = %self.config.bucket,
                            error = %create_err,
                            "CreateBucket failed but bucket exists"
                        );
                        Ok(())
                    }
                    Err(head_err) => {
                        tracing::error!(
                            bucket = %self.config.bucket,
                            create_error = %create_err,
                            head_error = %head_err,
                            "Bucket setup failed"
                        );
                        Err(StorageError::BucketSetup(create_err.to_string()))
                    }
                }
            }
        }
    }

    async fn apply_public_read_policy(&self) -> StorageResult<()> {
        let policy = serde_json::json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Effect": "Allow",
                "Principal": { "AWS": ["*"] },
                "Action": ["s3:GetObject"],
                "Resource": [format!("arn:aws:s3:::{}/*", self.config.bucket)],
            }]
        });

        self.client
            .put_bucket_policy()
            .bucket(&self.config.bucket)
            .policy(policy.to_string())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.config.bucket,
                    "Setting public read policy failed"
                );
                StorageError::BucketSetup(e.to_string())
            })?;

        tracing::info!(bucket = %self.config.bucket, "Public read policy applied");
        Ok(())
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn ensure_bucket(&self) -> StorageResult<()> {
        self.create_bucket_if_missing().await?;
        if self.config.public_read {
            self.apply_public_read_policy().await?;
        }
        Ok(())
    }

    async fn upload(
        &self,
        data: Bytes,
        original_filename: &str,
        content_type: &str,
    ) -> StorageResult<StoredObject> {
        let key = generate_object_name(original_filename);
        let size = data.len() as u64;

        let body = ByteStream::from(data);

        let start = std::time::Instant::now();

        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(&key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.config.bucket,
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload failed"
                );
                StorageError::UploadFailed(e.to_string())
            })?;

        let url = self.generate_url(&key);

        tracing::info!(
            bucket = %self.config.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(StoredObject {
            key,
            url,
            size_bytes: size,
        })
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let start = std::time::Instant::now();

        self.client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(storage_key)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.config.bucket,
                    key = %storage_key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete failed"
                );
                StorageError::DeleteFailed(e.to_string())
            })?;

        tracing::info!(
            bucket = %self.config.bucket,
            key = %storage_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.config.bucket)
            .key(storage_key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => match &e {
                SdkError::ServiceError(service_err) => match service_err.err() {
                    HeadObjectError::NotFound(_) => Ok(false),
                    _ => Err(StorageError::BackendError(e.to_string())),
                },
                _ => Err(StorageError::BackendError(e.to_string())),
            },
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
