pub mod atc;
pub mod auth;
pub mod cache;
pub mod chunk;
pub mod config;
pub mod handshake;
pub mod messages;
pub mod netconnection;
pub mod netstream;
pub mod protocol_control_messages;
#[allow(clippy::module_inception)]
pub mod rtmp;
pub mod session;
pub mod user_control_messages;
pub mod utils;
