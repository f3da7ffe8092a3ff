//! Client core for the bus-rider sync API.
//!
//! # Overview
//! Riders and buses live in a spreadsheet behind a single HTTP POST
//! endpoint. Every request is a JSON envelope carrying an action name, the
//! API key and the operator's email; every response is an `{ok, data, error}`
//! envelope. This crate owns that protocol.
//!
//! # Design
//! - `alias` maps retired action names and nested legacy payloads onto the
//!   canonical flat form before anything is sent.
//! - `Dispatcher` builds requests and parses responses as plain data
//!   (host-does-IO) and joins them with a `Transport` in `call`.
//! - The sync config and session live in named slots of a `KeyValueStore`;
//!   reading them never fails, malformed state reads as unset.
//! - Identity policy is an `AuthorizationTable` owned by `SessionProvider`;
//!   the dispatcher only sees resolved sessions through `SessionSource`.
//! - `normalize_rut` formats national IDs before callers send them.

pub mod alias;
pub mod config;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod http;
pub mod normalize;
pub mod session;
pub mod store;
pub mod transport;
pub mod types;

pub use alias::{resolve, ActionAlias, RequestShape, ResolvedCall, ACTION_ALIASES, ALIAS_TABLE_VERSION};
pub use config::{get_config, set_config};
pub use dispatch::Dispatcher;
pub use envelope::{RequestEnvelope, ResponseEnvelope};
pub use error::{AccessError, AuthError, DispatchError, StoreError, TableError};
pub use http::{HttpRequest, HttpResponse, CONTENT_TYPE};
pub use normalize::normalize_rut;
pub use session::{AuthorizationTable, NoSession, SessionProvider, SessionSource, TrustedIdentity};
pub use store::{FileStore, KeyValueStore, MemoryStore, SESSION_SLOT, SYNC_SLOT};
pub use transport::{Transport, UreqTransport};
pub use types::{Role, Session, SyncConfig};
