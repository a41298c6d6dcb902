//! Request definitions
//!
//! Represents requests from clients.

/// Request opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    UrgentFile = 0,
    BackgroundFile = 1,
    LoggedIn = 2,
    LoggedOut = 3,
    Reset = 6,
    Handshake = 15,
}

impl Opcode {
    /// Map a wire byte to an opcode, `None` for unknown values
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Opcode::UrgentFile),
            1 => Some(Opcode::BackgroundFile),
            2 => Some(Opcode::LoggedIn),
            3 => Some(Opcode::LoggedOut),
            6 => Some(Opcode::Reset),
            15 => Some(Opcode::Handshake),
            _ => None,
        }
    }

    /// Bytes that follow the opcode on the wire
    pub fn payload_len(self) -> usize {
        match self {
            Opcode::Handshake => 4,
            _ => 3,
        }
    }
}

/// Client-declared fetch priority
///
/// Carried through to the response path as a hint; it does not change the
/// order in which requests are answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// On-demand fetch (opcode 0)
    Urgent,
    /// Prefetch (opcode 1)
    Background,
}

impl Priority {
    pub fn opcode(self) -> Opcode {
        match self {
            Priority::Urgent => Opcode::UrgentFile,
            Priority::Background => Opcode::BackgroundFile,
        }
    }
}

/// A file fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileRequest {
    pub index: u8,
    pub entry: u16,
    pub priority: Priority,
}

impl FileRequest {
    /// Index/entry pair answered with the global descriptor
    pub const DESCRIPTOR: (u8, u16) = (255, 255);

    pub fn new(index: u8, entry: u16, priority: Priority) -> Self {
        Self {
            index,
            entry,
            priority,
        }
    }

    /// Whether this is the reserved descriptor request
    pub fn is_descriptor(&self) -> bool {
        (self.index, self.entry) == Self::DESCRIPTOR
    }
}

/// A parsed request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Version check
    Handshake { revision: u32 },

    /// Connection control (opcodes 2, 3, 6); payload is discarded
    Control { opcode: Opcode },

    /// Fetch an entry
    File(FileRequest),
}

impl Request {
    /// Get the request opcode
    pub fn opcode(&self) -> Opcode {
        match self {
            Request::Handshake { .. } => Opcode::Handshake,
            Request::Control { opcode } => *opcode,
            Request::File(file) => file.priority.opcode(),
        }
    }
}
