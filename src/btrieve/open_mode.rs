//! The mode a store is opened under.

/// How a store is opened. Only [`OpenMode::Normal`] and the rest are
/// accepted and recorded on the handle for `Stat` reporting; the driver
/// does not gate mutating operations behind `ReadOnly` or
/// `ExclusiveAccess` (see the design notes for why this is in scope but
/// unenforced).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Normal = 0,
    Accelerated = -1,
    ReadOnly = -2,
    VerifyWriteOperations = -3,
    ExclusiveAccess = -4,
}

impl OpenMode {
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => OpenMode::Normal,
            -1 => OpenMode::Accelerated,
            -2 => OpenMode::ReadOnly,
            -3 => OpenMode::VerifyWriteOperations,
            -4 => OpenMode::ExclusiveAccess,
            _ => return None,
        })
    }
}
