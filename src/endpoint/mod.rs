//! Endpoint topology discovery over any [`UmpTransport`](crate::transport::UmpTransport).

mod chunked;
mod discovery;
mod function_block;

pub use chunked::ChunkedField;
pub use discovery::Endpoint;
pub use function_block::FunctionBlock;
