//! Shared value types for tokens, profiles, and storage keys.

pub mod profile;
pub mod storage_key;
pub mod token;

pub use profile::UserProfile;
pub use storage_key::StorageKey;
pub use token::{LoginResponse, RefreshResponse, TokenPair};
