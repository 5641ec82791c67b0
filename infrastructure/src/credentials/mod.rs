//! File-backed credential store
//!
//! Keys live in a small JSON document under the user's data directory.
//! Environment variables named per participant (`api_key_env`) fill in
//! any participant the file does not mention.

mod file_store;

pub use file_store::{FileCredentialStore, STORAGE_KEY};
