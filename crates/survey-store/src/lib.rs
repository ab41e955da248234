//! Storage primitives for tracer study respondents: hashing and encryption,
//! the PIN directory that gates survey access, and encrypted draft records.

pub mod crypto;
pub mod drafts;
pub mod error;
pub mod kv;
pub mod pin;

pub use drafts::{DEFAULT_KEY_PREFIX, UserDraftStore, timestamp_segments};
pub use error::StoreError;
#[cfg(feature = "fs")]
pub use kv::FileStore;
pub use kv::{KeyValueStore, MemoryStore};
pub use pin::{
    InMemoryPinRepository, PinDirectory, PinLogin, PinRecord, PinRepository, PinSeed,
    RespondentIdentity, SurveyType,
};
