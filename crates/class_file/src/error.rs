use thiserror::Error;

use crate::constant_pool;

#[derive(Error, Debug)]
pub enum ClassFileError {
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    #[error("Truncated input at offset {offset}: {needed} bytes needed, {available} available")]
    TruncatedInput {
        offset: u64,
        needed: usize,
        available: usize,
    },
    #[error("Malformed {structure} tag {tag} at offset {offset}")]
    MalformedTag {
        structure: &'static str,
        tag: u8,
        offset: u64,
    },
    #[error(
        "Length mismatch in {name} attribute at offset {offset}: declared {declared} bytes, consumed {consumed}"
    )]
    LengthMismatch {
        name: String,
        offset: u64,
        declared: u32,
        consumed: u64,
    },
    #[error("Nesting deeper than {limit} levels in {structure} at offset {offset}")]
    NestingTooDeep {
        structure: &'static str,
        limit: usize,
        offset: u64,
    },
    #[error("Invalid {name} attribute at offset {offset}: {source}")]
    InAttribute {
        name: String,
        offset: u64,
        #[source]
        source: Box<ClassFileError>,
    },
    #[error("Expected {0}, found {1:?}")]
    UnexpectedConstantPoolEntry(&'static str, constant_pool::CpInfo),
    #[error("Invalid constant pool index: {0}")]
    InvalidConstantPoolIndex(u16),
    #[error("Invalid cp info tag: {0}")]
    InvalidCpInfoTag(u8),
    #[error("Invalid magic identifier: 0x{0:X}")]
    InvalidMagicIdentifier(u32),
}

impl ClassFileError {
    /// Byte offset the error is attributed to, if it has one.
    pub fn offset(&self) -> Option<u64> {
        match self {
            ClassFileError::TruncatedInput { offset, .. }
            | ClassFileError::MalformedTag { offset, .. }
            | ClassFileError::LengthMismatch { offset, .. }
            | ClassFileError::NestingTooDeep { offset, .. }
            | ClassFileError::InAttribute { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    /// Follows `InAttribute` wrappers down to the error that started it.
    pub fn root_cause(&self) -> &ClassFileError {
        let mut e = self;
        while let ClassFileError::InAttribute { source, .. } = e {
            e = source;
        }
        e
    }
}
