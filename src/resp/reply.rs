use std::fmt::Display;

use bytes::{BufMut, Bytes, BytesMut};

/**
 * Replies sent back to clients
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Simple(String),     // "+<STRING>\r\n"
    Error(String),      // "-<STRING>\r\n"
    Bulk(Bytes),        // "$<SIZE>\r\n<BYTES>\r\n"
    Null,               // "$-1\r\n"
}

impl Reply {
    pub fn ok() -> Self {
        Reply::Simple("OK".to_owned())
    }

    /**
     * Generic error reply, prefixed the way Redis prefixes its own.
     * Line breaks become spaces so the reply stays on one line.
     */
    pub fn error(message: impl Display) -> Self {
        let message = format!("ERR {}", message).replace(['\r', '\n'], " ");
        Reply::Error(message)
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        match self {
            Reply::Simple(s) => Self::encode_line(buf, b'+', s.as_bytes()),
            Reply::Error(s) => Self::encode_line(buf, b'-', s.as_bytes()),
            Reply::Bulk(payload) => {
                Self::encode_line(buf, b'$', payload.len().to_string().as_bytes());
                buf.put_slice(payload);
                buf.put_slice(b"\r\n");
            },
            Reply::Null => buf.put_slice(b"$-1\r\n"),
        }
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::new();
        self.encode(&mut buf);
        buf.freeze()
    }

    fn encode_line(buf: &mut BytesMut, prefix: u8, line: &[u8]) {
        buf.reserve(line.len() + 3);
        buf.put_u8(prefix);
        buf.put_slice(line);
        buf.put_slice(b"\r\n");
    }
}
