// Library root: event decoding, session state, build projection and the
// outbound/inbound plumbing shared with the local companion service.

pub mod assets;
pub mod codec;
pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod model;
pub mod projector;
pub mod service;
pub mod session;
pub mod tier_list;
