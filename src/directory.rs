pub mod client;
pub mod memory;
pub mod models;

use async_trait::async_trait;

use crate::directory::models::{ClassRecord, Role, StudentDocument};
use crate::error::BoardResult;

/// Read access to the document store holding students and classes.
///
/// A missing class is `Ok(None)`, which callers must keep apart from `Err`:
/// the former is a hard "not found", the latter a transient failure.
#[async_trait]
pub trait StudentDirectory: Send + Sync {
    async fn list_students(&self, role: Role) -> BoardResult<Vec<StudentDocument>>;

    async fn get_class(&self, class_id: &str) -> BoardResult<Option<ClassRecord>>;
}
