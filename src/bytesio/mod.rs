pub mod bits_errors;
pub mod bytes_errors;
pub mod bytes_reader;
pub mod bytes_writer;
pub mod bytesio;
pub mod bytesio_errors;
pub mod bit_reader;
