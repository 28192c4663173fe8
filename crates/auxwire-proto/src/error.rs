/// Errors that can occur while converting messages to and from bytes.
#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    /// The value could not be serialized.
    #[error("failed to serialize {kind}: {source}")]
    Encode {
        kind: &'static str,
        #[source]
        source: postcard::Error,
    },

    /// The bytes do not describe a valid message.
    #[error("failed to parse {kind} from {len} bytes: {source}")]
    Decode {
        kind: &'static str,
        len: usize,
        #[source]
        source: postcard::Error,
    },

    /// The bytes describe a valid message followed by unread data.
    #[error("{kind} parsed with {trailing} of {len} bytes left over")]
    TrailingBytes {
        kind: &'static str,
        len: usize,
        trailing: usize,
    },
}

impl ProtoError {
    /// Length of the offending payload, when parsing failed.
    pub fn payload_len(&self) -> Option<usize> {
        match self {
            Self::Encode { .. } => None,
            Self::Decode { len, .. } | Self::TrailingBytes { len, .. } => Some(*len),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProtoError>;
