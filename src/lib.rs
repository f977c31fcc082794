//! # totp-gate – Second-factor TOTP engine
//!
//! Standalone secret-management and verification core for time-based
//! one-time passwords:
//!
//! - **RFC 4226 / 6238** – HOTP & TOTP code computation with SHA-1, SHA-256, SHA-512
//! - **Secret generation** – OS-CSPRNG secrets, base32 (RFC 4648) encoded
//! - **otpauth:// URIs** – Provisioning payloads for authenticator apps (no image rendering)
//! - **Session gate** – Per-session second-factor state over an injected store
//! - **Injected collaborators** – `SecretStore`, `SessionStore`, `Clock` capability traits
//!
//! Everything outside the injected stores is a pure computation, safe to
//! call concurrently without locking.

pub mod twofactor;
