use std::fmt;
use std::io;

use gattwire_codec::CodecError;
use gattwire_registry::RegistryError;
use gattwire_router::RouterError;
use gattwire_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound => USAGE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    CliError::new(
        TRANSPORT_ERROR,
        format!("{context}: [{}] {err}", err.tag()),
    )
}

pub fn codec_error(context: &str, err: CodecError) -> CliError {
    match err {
        CodecError::InvalidHex(_) => CliError::new(USAGE, format!("{context}: {err}")),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn registry_error(context: &str, err: RegistryError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

pub fn router_error(context: &str, err: RouterError) -> CliError {
    match err {
        RouterError::Transport(err) => transport_error(context, err),
        RouterError::Codec(err) => codec_error(context, err),
        RouterError::Registry(err) => registry_error(context, err),
        RouterError::NotRegistered(_) | RouterError::NotWritable(_) => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
    }
}

pub fn json_error(context: &str, err: serde_json::Error) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_errors_map_through_inner_layers() {
        let err = router_error(
            "write",
            RouterError::Transport(TransportError::DeviceNotFound("AA".to_string())),
        );
        assert_eq!(err.code, TRANSPORT_ERROR);
        assert!(err.message.contains("connectToDevice"));

        let err = router_error("write", RouterError::NotWritable("180D.2A37".to_string()));
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn bad_hex_is_a_usage_error() {
        let err = codec_error("decode", CodecError::InvalidHex("zz".to_string()));
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn missing_file_is_a_usage_error() {
        let err = io_error("read", io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(err.code, USAGE);
    }
}
