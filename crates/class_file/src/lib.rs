// https://docs.oracle.com/javase/specs/jvms/se21/html/jvms-4.html

#[macro_use]
pub mod constant_pool;
mod access_flags;
pub mod attributes;
mod class_file;
mod error;
mod options;
mod parser;
mod symbols;

pub use self::class_file::{ClassFile, FieldInfo, MethodInfo};
pub use access_flags::{AccessFlags, ModuleFlags};
pub use attributes::{Attribute, AttributeBody, Attributes, Registry};
pub use constant_pool::{ConstantPool, CpInfo};
pub use error::ClassFileError;
pub use options::DecoderOptions;
pub use parser::Parser;
pub use symbols::SymbolLookup;

pub type Result<T, E = ClassFileError> = std::result::Result<T, E>;
