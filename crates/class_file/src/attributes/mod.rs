//! Attribute tables and the name-driven dispatcher that decodes them.
//!
//! Every attribute slot is `name_index: u16`, `length: u32`, then `length`
//! bytes of body. The name is resolved through the symbol table, the
//! [`Registry`] picks a decoder for it, and the bytes the decoder consumed are
//! checked against `length` afterwards.

mod annotations;
mod class_attributes;
mod code;
mod module;
mod registry;
mod stack_map;
mod type_annotations;

use std::ops::Range;

use crate::{parser::Parser, ClassFileError, Result};

pub use self::{
    annotations::{Annotation, ConstKind, ElementValue, ElementValuePair},
    class_attributes::{BootstrapMethod, InnerClass, MethodParameter, RecordComponent},
    code::{CodeAttribute, ExceptionTableEntry, LineNumber, LocalVariable, LocalVariableType},
    module::{Exports, Module, ModuleHash, ModuleHashes, Opens, Provides, Requires},
    registry::{
        AttributeDecoder, DecodeContext, DecodeFn, Registry, Shape, STANDARD_ATTRIBUTES,
        VENDOR_ATTRIBUTES,
    },
    stack_map::{FrameKind, FramePayload, StackMapFrame, VerificationTypeInfo},
    type_annotations::{
        LocalVarTargetEntry, SupertypeIndex, TargetInfo, TargetKind, TypeAnnotation,
        TypePathEntry, TypePathKind,
    },
};

/// Size of the `name_index` + `length` header in front of every body.
pub const ATTRIBUTE_HEADER_LENGTH: u64 = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub name_index: u16,
    /// Offset of the first body byte.
    pub offset: u64,
    pub length: u32,
    pub body: AttributeBody,
}
impl Attribute {
    /// Byte range covered by the body, `[offset, offset + length)`.
    pub fn range(&self) -> Range<u64> {
        self.offset..self.offset + self.length as u64
    }

    /// Offset of the `name_index` in front of the body. Clamped at zero for
    /// attributes built by hand with a body offset inside the header.
    pub fn header_offset(&self) -> u64 {
        self.offset.saturating_sub(ATTRIBUTE_HEADER_LENGTH)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Attributes(pub Vec<Attribute>);
impl Attributes {
    pub fn find_by_name(&self, name: &str) -> Option<&Attribute> {
        self.0.iter().find(|a| a.name == name)
    }

    pub fn code(&self) -> Option<&CodeAttribute> {
        self.0.iter().find_map(|a| match &a.body {
            AttributeBody::Code(code) => Some(code),
            _ => None,
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
impl<'a> IntoIterator for &'a Attributes {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeBody {
    ConstantValue { constantvalue_index: u16 },
    Code(CodeAttribute),
    StackMapTable(Vec<StackMapFrame>),
    Exceptions(Vec<u16>),
    InnerClasses(Vec<InnerClass>),
    EnclosingMethod { class_index: u16, method_index: u16 },
    Synthetic,
    Signature { signature_index: u16 },
    SourceFile { sourcefile_index: u16 },
    SourceDebugExtension(Vec<u8>),
    LineNumberTable(Vec<LineNumber>),
    LocalVariableTable(Vec<LocalVariable>),
    LocalVariableTypeTable(Vec<LocalVariableType>),
    Deprecated,
    RuntimeVisibleAnnotations(Vec<Annotation>),
    RuntimeInvisibleAnnotations(Vec<Annotation>),
    RuntimeVisibleParameterAnnotations(Vec<Vec<Annotation>>),
    RuntimeInvisibleParameterAnnotations(Vec<Vec<Annotation>>),
    RuntimeVisibleTypeAnnotations(Vec<TypeAnnotation>),
    RuntimeInvisibleTypeAnnotations(Vec<TypeAnnotation>),
    AnnotationDefault(ElementValue),
    BootstrapMethods(Vec<BootstrapMethod>),
    MethodParameters(Vec<MethodParameter>),
    Module(Module),
    ModulePackages(Vec<u16>),
    ModuleMainClass { main_class_index: u16 },
    NestHost { host_class_index: u16 },
    NestMembers(Vec<u16>),
    Record(Vec<RecordComponent>),
    PermittedSubclasses(Vec<u16>),

    // javac
    SourceId { sourceid_index: u16 },
    CompilationId { compilationid_index: u16 },

    // jlink
    ModuleTarget { target_platform_index: u16 },
    ModuleResolution { resolution_flags: u16 },
    ModuleHashes(ModuleHashes),

    Unrecognized(Vec<u8>),
}
impl AttributeBody {
    /// Name of the variant, independent of the attribute name that selected it.
    pub fn kind(&self) -> &'static str {
        match self {
            AttributeBody::ConstantValue { .. } => "ConstantValue",
            AttributeBody::Code(_) => "Code",
            AttributeBody::StackMapTable(_) => "StackMapTable",
            AttributeBody::Exceptions(_) => "Exceptions",
            AttributeBody::InnerClasses(_) => "InnerClasses",
            AttributeBody::EnclosingMethod { .. } => "EnclosingMethod",
            AttributeBody::Synthetic => "Synthetic",
            AttributeBody::Signature { .. } => "Signature",
            AttributeBody::SourceFile { .. } => "SourceFile",
            AttributeBody::SourceDebugExtension(_) => "SourceDebugExtension",
            AttributeBody::LineNumberTable(_) => "LineNumberTable",
            AttributeBody::LocalVariableTable(_) => "LocalVariableTable",
            AttributeBody::LocalVariableTypeTable(_) => "LocalVariableTypeTable",
            AttributeBody::Deprecated => "Deprecated",
            AttributeBody::RuntimeVisibleAnnotations(_) => "RuntimeVisibleAnnotations",
            AttributeBody::RuntimeInvisibleAnnotations(_) => "RuntimeInvisibleAnnotations",
            AttributeBody::RuntimeVisibleParameterAnnotations(_) => {
                "RuntimeVisibleParameterAnnotations"
            }
            AttributeBody::RuntimeInvisibleParameterAnnotations(_) => {
                "RuntimeInvisibleParameterAnnotations"
            }
            AttributeBody::RuntimeVisibleTypeAnnotations(_) => "RuntimeVisibleTypeAnnotations",
            AttributeBody::RuntimeInvisibleTypeAnnotations(_) => {
                "RuntimeInvisibleTypeAnnotations"
            }
            AttributeBody::AnnotationDefault(_) => "AnnotationDefault",
            AttributeBody::BootstrapMethods(_) => "BootstrapMethods",
            AttributeBody::MethodParameters(_) => "MethodParameters",
            AttributeBody::Module(_) => "Module",
            AttributeBody::ModulePackages(_) => "ModulePackages",
            AttributeBody::ModuleMainClass { .. } => "ModuleMainClass",
            AttributeBody::NestHost { .. } => "NestHost",
            AttributeBody::NestMembers(_) => "NestMembers",
            AttributeBody::Record(_) => "Record",
            AttributeBody::PermittedSubclasses(_) => "PermittedSubclasses",
            AttributeBody::SourceId { .. } => "SourceID",
            AttributeBody::CompilationId { .. } => "CompilationID",
            AttributeBody::ModuleTarget { .. } => "ModuleTarget",
            AttributeBody::ModuleResolution { .. } => "ModuleResolution",
            AttributeBody::ModuleHashes(_) => "ModuleHashes",
            AttributeBody::Unrecognized(_) => "Unrecognized",
        }
    }
}

impl<'a> Parser<'a> {
    /// Reads a u16 count followed by that many attributes.
    pub fn parse_attributes(&mut self, cx: &DecodeContext<'_>) -> Result<Attributes> {
        let attributes_count = self.read_u16()?;
        self.parse_vec(attributes_count, |p| p.parse_attribute(cx))
            .map(Attributes)
    }

    /// Reads one attribute, header included.
    pub fn parse_attribute(&mut self, cx: &DecodeContext<'_>) -> Result<Attribute> {
        let header_offset = self.position();
        let name_index = self.read_u16()?;
        let length = self.read_u32()?;
        let name = cx
            .symbols
            .resolve_name(name_index)
            .map_err(|source| ClassFileError::InAttribute {
                name: format!("#{}", name_index),
                offset: header_offset,
                source: Box::new(source),
            })?
            .to_owned();

        let offset = self.position();
        let body = self.parse_attribute_body(&name, length, cx)?;

        log::trace!(
            "{} attribute ({}) at {}, {} bytes",
            name,
            cx.symbols.describe(name_index),
            offset,
            length
        );

        Ok(Attribute {
            name,
            name_index,
            offset,
            length,
            body,
        })
    }

    /// Decodes the body of an attribute called `name`. The parser has to be
    /// positioned right after the attribute header.
    ///
    /// Names missing from the registry are captured as raw bytes. Everything
    /// else must consume exactly `length` bytes.
    pub fn parse_attribute_body(
        &mut self,
        name: &str,
        length: u32,
        cx: &DecodeContext<'_>,
    ) -> Result<AttributeBody> {
        let offset = self.position();
        let available = self.remaining();
        if length as usize > available {
            return Err(ClassFileError::TruncatedInput {
                offset,
                needed: length as usize,
                available,
            });
        }

        let Some(decoder) = cx.registry.lookup(name) else {
            log::debug!(
                "Unrecognized attribute {} at {}, keeping {} raw bytes",
                name,
                offset,
                length
            );
            return Ok(AttributeBody::Unrecognized(self.read_bytes(length as usize)?));
        };

        if let Shape::Fixed(expected) = decoder.shape {
            if expected != length {
                return Err(ClassFileError::LengthMismatch {
                    name: name.to_owned(),
                    offset,
                    declared: length,
                    consumed: expected as u64,
                });
            }
        }

        let body = (decoder.decode)(self, cx, length).map_err(|source| {
            ClassFileError::InAttribute {
                name: name.to_owned(),
                offset,
                source: Box::new(source),
            }
        })?;

        let consumed = self.position() - offset;
        if consumed != length as u64 {
            return Err(ClassFileError::LengthMismatch {
                name: name.to_owned(),
                offset,
                declared: length,
                consumed,
            });
        }

        Ok(body)
    }
}
