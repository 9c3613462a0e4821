/// Errors that can occur in router operations.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] gattwire_transport::TransportError),

    /// Encoding error, including strict-mode refusal of a lossy packet.
    #[error("codec error: {0}")]
    Codec(#[from] gattwire_codec::CodecError),

    /// Registry configuration error.
    #[error("registry error: {0}")]
    Registry(#[from] gattwire_registry::RegistryError),

    /// The endpoint has no bound access level.
    #[error("endpoint {0} is not registered")]
    NotRegistered(String),

    /// Neither write level is bound for the endpoint.
    #[error("endpoint {0} has no write level bound")]
    NotWritable(String),
}

pub type Result<T> = std::result::Result<T, RouterError>;
