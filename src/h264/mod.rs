pub mod avc;
pub mod errors;
pub mod sps;

pub use avc::Mpeg4AvcProcessor;
