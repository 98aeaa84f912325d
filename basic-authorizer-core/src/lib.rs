//! Credential verification core for HTTP Basic authorizers.

pub mod cache;
pub mod clock;
pub mod credential;
pub mod decision;
pub mod digest;
pub mod engine;
pub mod errors;
pub mod identity;
pub mod resolver;
pub mod store;

pub use cache::DigestCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use credential::{Credential, decode};
pub use decision::{Decision, DecisionObserver, Effect, TracingObserver, decide};
pub use digest::{digests_match, secret_digest};
pub use engine::{AuthorizationEngine, AuthorizationRequest, scope_resource};
pub use errors::{Error, Result, StoreError, StoreResult};
pub use identity::KeyScheme;
pub use resolver::{ResolverConfig, SecretResolver};
pub use store::{FileStore, MemoryStore, RecordMeta, SecretStore, StoredDigest};
