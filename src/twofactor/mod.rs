//! Second-factor engine: sub-modules.

pub mod core;
pub mod gate;
pub mod secret;
pub mod service;
pub mod stores;
pub mod types;
pub mod uri;

// Re-export top-level items for convenience.
pub use gate::SessionGate;
pub use service::{Enrollment, TwoFactorService};
pub use stores::{
    Clock, FixedClock, MemorySecretStore, MemorySessionStore, SecretStore, SessionStore,
    SystemClock,
};
pub use types::*;
