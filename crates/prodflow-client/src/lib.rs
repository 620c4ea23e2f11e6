//! Client library for the ProdFlow admin API.
//!
//! - [`ApiClient`] talks to the REST endpoints (`/v1/users`, `/v1/roles`, `/v1/devices`,
//!   `/v1/auth/`, `/logs`).
//! - [`ResourceCache`] keeps the last fetched collection per [`ResourceKind`] and
//!   invalidates it after every successful mutation.
//! - [`logs`] extracts the tail of a downloaded log file.

pub mod cache;
pub mod client;
pub mod error;
pub mod events;
pub mod logs;
pub mod model;

pub use cache::{CacheConfig, CachedResource, KindCache, ResourceCache, DEFAULT_STALE_TIME};
pub use client::{ApiClient, ClientConfig};
pub use error::{ClientError, Result};
pub use events::{CacheChange, CacheEvent};
pub use logs::{LogView, last_entries, tail};
pub use model::{
    Device, DevicePatch, NewDevice, NewRole, NewUser, Resource, ResourceKind, Role, RolePatch,
    TokenResponse, User, UserPatch, Validate,
};
