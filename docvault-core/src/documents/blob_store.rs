use bytes::Bytes;
use object_store::{
    Attribute, AttributeValue, Attributes, ObjectStore, PutOptions, PutPayload, path::Path,
};
use serde::Serialize;
use std::{fmt, sync::Arc};
use tracing::{debug, info};

use super::id::{DocumentId, DocumentIdGenerator, RandomIds};
use crate::error::{DocVaultError, Result};

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A stored document as read back from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    #[serde(skip_serializing)]
    pub bytes: Bytes,
    pub content_type: String,
}

/// Opaque byte payloads keyed by generated ids in an object backend.
#[derive(Clone)]
pub struct BlobStore {
    backend: Arc<dyn ObjectStore>,
    ids: Arc<dyn DocumentIdGenerator>,
}

impl fmt::Debug for BlobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobStore")
            .field("backend", &self.backend.to_string())
            .field("ids", &self.ids)
            .finish()
    }
}

impl BlobStore {
    pub fn new(backend: Arc<dyn ObjectStore>) -> Self {
        Self::with_id_generator(backend, Arc::new(RandomIds))
    }

    pub fn with_id_generator(
        backend: Arc<dyn ObjectStore>,
        ids: Arc<dyn DocumentIdGenerator>,
    ) -> Self {
        Self { backend, ids }
    }

    fn location(id: &DocumentId) -> Path {
        Path::from(id.to_string())
    }

    /// Store `bytes` under a fresh id, recording `content_type` alongside.
    pub async fn put(&self, bytes: Bytes, content_type: &str) -> Result<DocumentId> {
        let id = self.ids.next_id();
        let size = bytes.len();

        let mut attributes = Attributes::new();
        attributes.insert(
            Attribute::ContentType,
            AttributeValue::from(content_type.to_string()),
        );
        let opts = PutOptions {
            attributes,
            ..Default::default()
        };

        self.backend
            .put_opts(&Self::location(&id), PutPayload::from(bytes), opts)
            .await
            .map_err(|err| {
                DocVaultError::Unavailable(format!("failed to store document {id}: {err}"))
            })?;

        info!(document_id = %id, size, content_type, "document stored");
        Ok(id)
    }

    /// Fetch the exact stored bytes and content type.
    pub async fn get(&self, id: &DocumentId) -> Result<Document> {
        let result = self.backend.get(&Self::location(id)).await?;

        let content_type = result
            .attributes
            .get(&Attribute::ContentType)
            .map(|value| {
                let value: &str = value.as_ref();
                value.to_string()
            })
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
        let bytes = result.bytes().await?;

        debug!(document_id = %id, size = bytes.len(), "document read");
        Ok(Document {
            id: *id,
            bytes,
            content_type,
        })
    }

    /// Remove a document. Unknown ids are not an error.
    pub async fn delete(&self, id: &DocumentId) -> Result<()> {
        match self.backend.delete(&Self::location(id)).await {
            Ok(()) => {
                info!(document_id = %id, "document deleted");
                Ok(())
            }
            Err(object_store::Error::NotFound { .. }) => {
                debug!(document_id = %id, "delete of absent document ignored");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::id::SequentialIds;
    use object_store::memory::InMemory;

    fn store() -> (Arc<InMemory>, BlobStore) {
        let backend = Arc::new(InMemory::new());
        let blobs = BlobStore::with_id_generator(backend.clone(), Arc::new(SequentialIds::new()));
        (backend, blobs)
    }

    #[tokio::test]
    async fn put_then_get_returns_bytes_and_type() {
        let (_, blobs) = store();
        let payload = Bytes::from_static(b"%PDF-1.7 fake");

        let id = blobs.put(payload.clone(), "application/pdf").await.unwrap();
        let doc = blobs.get(&id).await.unwrap();

        assert_eq!(doc.id, id);
        assert_eq!(doc.bytes, payload);
        assert_eq!(doc.content_type, "application/pdf");
    }

    #[tokio::test]
    async fn missing_content_type_reads_as_octet_stream() {
        let (backend, blobs) = store();
        let id = DocumentId::from_uuid(uuid::Uuid::new_v4());
        backend
            .put(&Path::from(id.to_string()), PutPayload::from_static(b"raw"))
            .await
            .unwrap();

        let doc = blobs.get(&id).await.unwrap();
        assert_eq!(doc.content_type, DEFAULT_CONTENT_TYPE);
        assert_eq!(&doc.bytes[..], b"raw");
    }

    #[tokio::test]
    async fn get_after_delete_is_not_found() {
        let (_, blobs) = store();
        let id = blobs.put(Bytes::from_static(b"x"), "text/plain").await.unwrap();

        blobs.delete(&id).await.unwrap();
        let err = blobs.get(&id).await.unwrap_err();

        assert_eq!(err.to_string(), DocVaultError::NotFound(format!("document {id}")).to_string());
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn deleting_an_unknown_id_succeeds() {
        let (_, blobs) = store();
        let id = DocumentId::from_uuid(uuid::Uuid::new_v4());
        blobs.delete(&id).await.unwrap();
        blobs.delete(&id).await.unwrap();
    }

    #[tokio::test]
    async fn empty_payloads_are_stored() {
        let (_, blobs) = store();
        let id = blobs.put(Bytes::new(), "text/plain").await.unwrap();
        assert!(blobs.get(&id).await.unwrap().bytes.is_empty());
    }
}
