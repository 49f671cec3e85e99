//! Response hardening for the back office

mod headers;

pub use headers::security_headers_middleware;
