use serde::{Deserialize, Serialize};
use std::{
    fmt,
    str::FromStr,
    sync::atomic::{AtomicU64, Ordering},
};
use uuid::Uuid;

/// Opaque identifier of a stored document, never derived from its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Source of fresh document ids.
pub trait DocumentIdGenerator: Send + Sync + fmt::Debug {
    fn next_id(&self) -> DocumentId;
}

/// Random v4 UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl DocumentIdGenerator for RandomIds {
    fn next_id(&self) -> DocumentId {
        DocumentId(Uuid::new_v4())
    }
}

/// Monotonic ids (`00000000-0000-0000-0000-000000000001`, ...) for tests
/// that need predictable keys.
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentIdGenerator for SequentialIds {
    fn next_id(&self) -> DocumentId {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        DocumentId(Uuid::from_u128(u128::from(n)))
    }
}
