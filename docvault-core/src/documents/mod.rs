//! Opaque document storage on top of an [`object_store::ObjectStore`].

pub mod backend;
pub mod blob_store;
pub mod id;

pub use backend::build_object_store;
pub use blob_store::{BlobStore, DEFAULT_CONTENT_TYPE, Document};
pub use id::{DocumentId, DocumentIdGenerator, RandomIds, SequentialIds};
