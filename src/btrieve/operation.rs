//! Operation codes the driver facade accepts, matching the legacy record
//! manager's call semantics.
//!
//! Every "acquire"/"step"/"query" family has four lock-modified siblings
//! (`base+100/200/300/400`, single/multiple wait/no-wait). This crate has no
//! record locking (see the design notes' concurrency model), so all five
//! members of a family normalize to the same [`OperationCode`] via
//! [`OperationCode::from_code`].

use crate::error::{BtrieveError, Result};

/// A normalized operation code: lock-modifier synonyms have already been
/// folded into their base operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationCode {
    Open,
    Close,
    Insert,
    Update,
    Delete,
    AcquireEqual,
    AcquireNext,
    AcquirePrevious,
    AcquireGreater,
    AcquireGreaterOrEqual,
    AcquireLess,
    AcquireLessOrEqual,
    AcquireFirst,
    AcquireLast,
    Create,
    Stat,
    Extend,
    GetPosition,
    GetDirectChunkOrRecord,
    SetOwner,
    StepFirst,
    StepLast,
    StepNext,
    StepNextExtended,
    StepPrevious,
    StepPreviousExtended,
    QueryEqual,
    QueryNext,
    QueryPrevious,
    QueryGreater,
    QueryGreaterOrEqual,
    QueryLess,
    QueryLessOrEqual,
    QueryFirst,
    QueryLast,
    Stop,
}

/// (base code, operation) pairs; the four lock-modified variants of each
/// base are `base+100`, `base+200`, `base+300`, `base+400`.
const FAMILIES: &[(u16, OperationCode)] = &[
    (0x0, OperationCode::Open),
    (0x1, OperationCode::Close),
    (0x2, OperationCode::Insert),
    (0x3, OperationCode::Update),
    (0x4, OperationCode::Delete),
    (0x5, OperationCode::AcquireEqual),
    (0x6, OperationCode::AcquireNext),
    (0x7, OperationCode::AcquirePrevious),
    (0x8, OperationCode::AcquireGreater),
    (0x9, OperationCode::AcquireGreaterOrEqual),
    (0xA, OperationCode::AcquireLess),
    (0xB, OperationCode::AcquireLessOrEqual),
    (0xC, OperationCode::AcquireFirst),
    (0xD, OperationCode::AcquireLast),
    (0xE, OperationCode::Create),
    (0xF, OperationCode::Stat),
    (0x10, OperationCode::Extend),
    (0x16, OperationCode::GetPosition),
    (0x17, OperationCode::GetDirectChunkOrRecord),
    (0x1D, OperationCode::SetOwner),
    (0x21, OperationCode::StepFirst),
    (0x22, OperationCode::StepLast),
    (0x18, OperationCode::StepNext),
    (0x26, OperationCode::StepNextExtended),
    (0x23, OperationCode::StepPrevious),
    (0x27, OperationCode::StepPreviousExtended),
    (0x37, OperationCode::QueryEqual),
    (0x38, OperationCode::QueryNext),
    (0x39, OperationCode::QueryPrevious),
    (0x3A, OperationCode::QueryGreater),
    (0x3B, OperationCode::QueryGreaterOrEqual),
    (0x3C, OperationCode::QueryLess),
    (0x3D, OperationCode::QueryLessOrEqual),
    (0x3E, OperationCode::QueryFirst),
    (0x3F, OperationCode::QueryLast),
    (0x19, OperationCode::Stop),
];

impl OperationCode {
    /// Decode a raw 16-bit operation code, folding any of the four lock
    /// modifiers (`+100`, `+200`, `+300`, `+400`) back to its base.
    pub fn from_code(code: u16) -> Result<Self> {
        if code == 0xFFFF {
            return Err(BtrieveError::InvalidOperation);
        }
        for &modifier in &[0u16, 100, 200, 300, 400] {
            if code < modifier {
                continue;
            }
            let base = code - modifier;
            if let Some((_, op)) = FAMILIES.iter().find(|(b, _)| *b == base) {
                return Ok(*op);
            }
        }
        Err(BtrieveError::InvalidOperation)
    }

    /// True for operations that acquire/return record data rather than
    /// merely locating a key.
    pub fn acquires_data(self) -> bool {
        !matches!(
            self,
            OperationCode::QueryEqual
                | OperationCode::QueryNext
                | OperationCode::QueryPrevious
                | OperationCode::QueryGreater
                | OperationCode::QueryGreaterOrEqual
                | OperationCode::QueryLess
                | OperationCode::QueryLessOrEqual
                | OperationCode::QueryFirst
                | OperationCode::QueryLast
                | OperationCode::Stat
                | OperationCode::Extend
                | OperationCode::SetOwner
                | OperationCode::Open
                | OperationCode::Close
                | OperationCode::Create
                | OperationCode::Stop
        )
    }

    /// True for operations that require an explicit key number/value
    /// (as opposed to continuing a previously positioned query).
    pub fn requires_key(self) -> bool {
        matches!(
            self,
            OperationCode::AcquireEqual
                | OperationCode::AcquireGreater
                | OperationCode::AcquireGreaterOrEqual
                | OperationCode::AcquireLess
                | OperationCode::AcquireLessOrEqual
                | OperationCode::QueryEqual
                | OperationCode::QueryGreater
                | OperationCode::QueryGreaterOrEqual
                | OperationCode::QueryLess
                | OperationCode::QueryLessOrEqual
        )
    }

    /// True for operations that continue the previously established query
    /// (keyed Next/Previous family, and physical StepNext/StepPrevious).
    pub fn uses_previous_query(self) -> bool {
        matches!(
            self,
            OperationCode::AcquireNext
                | OperationCode::AcquirePrevious
                | OperationCode::QueryNext
                | OperationCode::QueryPrevious
                | OperationCode::StepNext
                | OperationCode::StepNextExtended
                | OperationCode::StepPrevious
                | OperationCode::StepPreviousExtended
        )
    }
}
