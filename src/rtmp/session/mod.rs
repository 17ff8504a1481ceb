pub mod client_session;
pub mod common;
pub mod errors;
pub mod server_session;

pub use client_session::ClientSession;
pub use common::{chunk_stream_id, Common, SessionType};
pub use errors::{SessionError, SessionErrorValue};
pub use server_session::ServerSession;
