//! OAuth credential management with storage and refresh capabilities.

pub mod encryption;
mod file_storage;
mod manager;
mod storage;
mod tokens;

pub use file_storage::FileStorage;
pub use manager::{AccessToken, AccessTokenSource, AccountTokens, Manager, TokenSource};
pub use storage::Storage;
pub use tokens::{Credential, StoredCredential, REFRESH_LOOKAHEAD_MINUTES};
