/// Identifier assigned to a function at registration; travels as a u16.
/// Zero is reserved for "not found".
pub type FunctionId = u16;

/// Size of the fixed request header: kind (u16) plus argument (u16).
pub const HEADER_SIZE: usize = 4;

const KIND_CLOSE: u16 = 0;
const KIND_FIND: u16 = 1;
const KIND_CALL: u16 = 2;

/// What a request asks the server to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Orderly shutdown of this connection.
    Close,
    /// Resolve a name; the header argument is the name length.
    Find,
    /// Invoke a function; the header argument is the function id.
    Call,
    /// Any kind value the protocol does not define. Servers treat it as close.
    Unknown(u16),
}

impl RequestKind {
    pub fn from_wire(value: u16) -> Self {
        match value {
            KIND_CLOSE => RequestKind::Close,
            KIND_FIND => RequestKind::Find,
            KIND_CALL => RequestKind::Call,
            other => RequestKind::Unknown(other),
        }
    }

    pub fn to_wire(self) -> u16 {
        match self {
            RequestKind::Close => KIND_CLOSE,
            RequestKind::Find => KIND_FIND,
            RequestKind::Call => KIND_CALL,
            RequestKind::Unknown(other) => other,
        }
    }
}

/// The 4-byte header that starts every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHeader {
    pub kind: RequestKind,
    pub arg: u16,
}

impl RequestHeader {
    pub fn close() -> Self {
        RequestHeader { kind: RequestKind::Close, arg: 0 }
    }

    pub fn find(name_len: u16) -> Self {
        RequestHeader { kind: RequestKind::Find, arg: name_len }
    }

    pub fn call(fid: FunctionId) -> Self {
        RequestHeader { kind: RequestKind::Call, arg: fid }
    }

    pub fn to_bytes(self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[..2].copy_from_slice(&self.kind.to_wire().to_be_bytes());
        buf[2..].copy_from_slice(&self.arg.to_be_bytes());
        buf
    }

    pub fn from_bytes(buf: [u8; HEADER_SIZE]) -> Self {
        RequestHeader {
            kind: RequestKind::from_wire(u16::from_be_bytes([buf[0], buf[1]])),
            arg: u16::from_be_bytes([buf[2], buf[3]]),
        }
    }
}
