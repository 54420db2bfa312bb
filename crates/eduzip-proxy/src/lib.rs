//! Credential proxy for the Upstage APIs.
//!
//! Browser-side or shared deployments post a [`ProxyEnvelope`] here instead
//! of calling Upstage directly; the proxy attaches the bearer key it holds,
//! forwards the request and mirrors the upstream status and body back.
//!
//! [`ProxyEnvelope`]: eduzip_core::wire::ProxyEnvelope

mod error;
mod forward;
mod server;

pub use error::ProxyError;
pub use forward::{ProxyState, router};
pub use server::serve;
