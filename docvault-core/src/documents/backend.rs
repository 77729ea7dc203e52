use docvault_config::{ObjectBackend, ObjectStoreConfig};
use object_store::{ObjectStore, aws::AmazonS3Builder, memory::InMemory};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{DocVaultError, Result};

/// Build the object backend selected by `config`.
pub fn build_object_store(config: &ObjectStoreConfig) -> Result<Arc<dyn ObjectStore>> {
    match config.backend {
        ObjectBackend::Memory => {
            warn!("using in-memory object store; documents are lost on exit");
            Ok(Arc::new(InMemory::new()))
        }
        ObjectBackend::S3 => {
            let endpoint = config
                .endpoint_url()
                .map_err(|e| DocVaultError::Internal(e.to_string()))?;
            let bucket = config.bucket.as_deref().ok_or_else(|| {
                DocVaultError::Internal("MINIO_BUCKET is not configured".to_string())
            })?;

            let mut builder = AmazonS3Builder::new()
                .with_endpoint(endpoint.as_str().trim_end_matches('/'))
                .with_bucket_name(bucket)
                .with_region(&config.region)
                .with_allow_http(!config.use_ssl)
                .with_virtual_hosted_style_request(false);
            if let Some(key) = &config.access_key {
                builder = builder.with_access_key_id(key.expose());
            }
            if let Some(secret) = &config.secret_key {
                builder = builder.with_secret_access_key(secret.expose());
            }

            let store = builder.build().map_err(|e| {
                DocVaultError::Internal(format!("invalid object store configuration: {e}"))
            })?;
            info!(endpoint = %endpoint, bucket, "object store configured");
            Ok(Arc::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docvault_config::Secret;

    #[test]
    fn memory_backend_needs_no_credentials() {
        let config = ObjectStoreConfig {
            backend: ObjectBackend::Memory,
            ..ObjectStoreConfig::default()
        };
        assert!(build_object_store(&config).is_ok());
    }

    #[test]
    fn s3_backend_builds_from_minio_settings() {
        let config = ObjectStoreConfig {
            bucket: Some("documents".into()),
            access_key: Some(Secret::new("minio")),
            secret_key: Some(Secret::new("minio-secret")),
            ..ObjectStoreConfig::default()
        };
        let store = build_object_store(&config).unwrap();
        assert!(store.to_string().contains("documents"));
    }

    #[test]
    fn s3_backend_without_bucket_is_rejected() {
        let config = ObjectStoreConfig::default();
        assert!(matches!(
            build_object_store(&config),
            Err(DocVaultError::Internal(_))
        ));
    }
}
