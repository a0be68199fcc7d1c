//! Backend client for the ragdesk chat client.
//!
//! [`HttpBackend`] implements [`ragdesk_core::session::QaBackend`] over the
//! backend's three REST endpoints; the `wire` module normalises the
//! response shapes different backends return.

mod http_backend;
mod wire;

pub use http_backend::HttpBackend;
