//! Rich document provider trait.

use crate::types::document::{Handle, Request, Structure};
use crate::Error;
use async_trait::async_trait;

/// Abstraction for a remote rich document addressed by character offsets.
///
/// Inserting text at offset `k` shifts every later offset by the inserted
/// length. Requests inside one `batch_update` call apply in order, each seeing
/// the effects of the ones before it.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Create an empty document and return its id and browsable URL.
    async fn create_document(&self, title: &str) -> std::result::Result<Handle, Error>;

    /// Apply an ordered batch of mutation requests.
    async fn batch_update(
        &self,
        document_id: &str,
        requests: Vec<Request>,
    ) -> std::result::Result<(), Error>;

    /// Read the document's current structure, including every offset.
    async fn get_structure(&self, document_id: &str) -> std::result::Result<Structure, Error>;

    /// Largest number of requests accepted by one `batch_update` call.
    fn max_batch_size(&self) -> usize {
        100
    }
}
