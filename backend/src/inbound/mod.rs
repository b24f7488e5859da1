//! Inbound adapters that translate external requests into domain service
//! calls while keeping framework details at the edge.
//!
//! Collars and companion apps talk to the gateway over HTTP; the handlers live
//! under [`http`].

pub mod http;
