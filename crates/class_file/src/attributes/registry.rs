use std::{collections::HashMap, fmt, sync::OnceLock};

use crate::{parser::Parser, ClassFileError, DecoderOptions, Result, SymbolLookup};

use super::AttributeBody;

/// Everything a decoder may need besides the bytes themselves.
#[derive(Clone, Copy)]
pub struct DecodeContext<'c> {
    pub symbols: &'c dyn SymbolLookup,
    pub registry: &'c Registry,
    pub options: &'c DecoderOptions,
    /// Number of attribute tables enclosing the one being decoded.
    depth: usize,
}
impl<'c> DecodeContext<'c> {
    pub fn new(
        symbols: &'c dyn SymbolLookup,
        registry: &'c Registry,
        options: &'c DecoderOptions,
    ) -> Self {
        Self {
            symbols,
            registry,
            options,
            depth: 0,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Context for an attribute table nested in the current attribute, such
    /// as the one inside `Code`. `offset` is where that table starts.
    pub fn nested(&self, offset: u64) -> Result<Self> {
        let limit = self.options.max_nesting_depth;
        if self.depth >= limit {
            return Err(ClassFileError::NestingTooDeep {
                structure: "attribute",
                limit,
                offset,
            });
        }

        Ok(Self {
            depth: self.depth + 1,
            ..*self
        })
    }
}

/// Decodes an attribute body. Gets the parser positioned at the first body
/// byte and the declared body length.
pub type DecodeFn = fn(&mut Parser<'_>, &DecodeContext<'_>, u32) -> Result<AttributeBody>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// The body is always exactly this many bytes.
    Fixed(u32),
    /// The body length depends on its contents.
    Variable,
}

#[derive(Clone, Copy)]
pub struct AttributeDecoder {
    pub name: &'static str,
    pub shape: Shape,
    pub decode: DecodeFn,
}
impl AttributeDecoder {
    pub const fn new(name: &'static str, shape: Shape, decode: DecodeFn) -> Self {
        Self {
            name,
            shape,
            decode,
        }
    }
}
impl fmt::Debug for AttributeDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeDecoder")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .finish()
    }
}

use Shape::{Fixed, Variable};

// https://docs.oracle.com/javase/specs/jvms/se21/html/jvms-4.html#jvms-4.7
pub const STANDARD_ATTRIBUTES: &[AttributeDecoder] = &[
    AttributeDecoder::new("ConstantValue", Fixed(2), decode_constant_value),
    AttributeDecoder::new("Code", Variable, decode_code),
    AttributeDecoder::new("StackMapTable", Variable, decode_stack_map_table),
    AttributeDecoder::new("Exceptions", Variable, decode_exceptions),
    AttributeDecoder::new("InnerClasses", Variable, decode_inner_classes),
    AttributeDecoder::new("EnclosingMethod", Fixed(4), decode_enclosing_method),
    AttributeDecoder::new("Synthetic", Fixed(0), decode_synthetic),
    AttributeDecoder::new("Signature", Fixed(2), decode_signature),
    AttributeDecoder::new("SourceFile", Fixed(2), decode_source_file),
    AttributeDecoder::new("SourceDebugExtension", Variable, decode_source_debug_extension),
    AttributeDecoder::new("LineNumberTable", Variable, decode_line_number_table),
    AttributeDecoder::new("LocalVariableTable", Variable, decode_local_variable_table),
    AttributeDecoder::new(
        "LocalVariableTypeTable",
        Variable,
        decode_local_variable_type_table,
    ),
    AttributeDecoder::new("Deprecated", Fixed(0), decode_deprecated),
    AttributeDecoder::new(
        "RuntimeVisibleAnnotations",
        Variable,
        decode_runtime_visible_annotations,
    ),
    AttributeDecoder::new(
        "RuntimeInvisibleAnnotations",
        Variable,
        decode_runtime_invisible_annotations,
    ),
    AttributeDecoder::new(
        "RuntimeVisibleParameterAnnotations",
        Variable,
        decode_runtime_visible_parameter_annotations,
    ),
    AttributeDecoder::new(
        "RuntimeInvisibleParameterAnnotations",
        Variable,
        decode_runtime_invisible_parameter_annotations,
    ),
    AttributeDecoder::new(
        "RuntimeVisibleTypeAnnotations",
        Variable,
        decode_runtime_visible_type_annotations,
    ),
    AttributeDecoder::new(
        "RuntimeInvisibleTypeAnnotations",
        Variable,
        decode_runtime_invisible_type_annotations,
    ),
    AttributeDecoder::new("AnnotationDefault", Variable, decode_annotation_default),
    AttributeDecoder::new("BootstrapMethods", Variable, decode_bootstrap_methods),
    AttributeDecoder::new("MethodParameters", Variable, decode_method_parameters),
    AttributeDecoder::new("Module", Variable, decode_module),
    AttributeDecoder::new("ModulePackages", Variable, decode_module_packages),
    AttributeDecoder::new("ModuleMainClass", Fixed(2), decode_module_main_class),
    AttributeDecoder::new("NestHost", Fixed(2), decode_nest_host),
    AttributeDecoder::new("NestMembers", Variable, decode_nest_members),
    AttributeDecoder::new("Record", Variable, decode_record),
    AttributeDecoder::new("PermittedSubclasses", Variable, decode_permitted_subclasses),
];

/// Attributes emitted by javac and jlink that are not part of the class file format proper.
pub const VENDOR_ATTRIBUTES: &[AttributeDecoder] = &[
    AttributeDecoder::new("SourceID", Fixed(2), decode_source_id),
    AttributeDecoder::new("CompilationID", Fixed(2), decode_compilation_id),
    AttributeDecoder::new("ModuleTarget", Fixed(2), decode_module_target),
    AttributeDecoder::new("ModuleResolution", Fixed(2), decode_module_resolution),
    AttributeDecoder::new("ModuleHashes", Variable, decode_module_hashes),
];

/// Maps attribute names to their decoders.
///
/// Built once and never mutated afterwards. Adding an attribute kind is adding
/// a row, see [`Registry::with_row`].
#[derive(Debug, Clone, Default)]
pub struct Registry {
    decoders: HashMap<&'static str, AttributeDecoder>,
}
impl Registry {
    /// The standard and vendor rows, built on first use.
    pub fn standard() -> &'static Registry {
        static STANDARD: OnceLock<Registry> = OnceLock::new();
        STANDARD.get_or_init(|| {
            Registry::from_rows(STANDARD_ATTRIBUTES.iter().chain(VENDOR_ATTRIBUTES).copied())
        })
    }

    pub fn from_rows(rows: impl IntoIterator<Item = AttributeDecoder>) -> Self {
        Self {
            decoders: rows.into_iter().map(|row| (row.name, row)).collect(),
        }
    }

    /// Adds `row`, replacing any row with the same name.
    pub fn with_row(mut self, row: AttributeDecoder) -> Self {
        self.decoders.insert(row.name, row);
        self
    }

    pub fn lookup(&self, name: &str) -> Option<&AttributeDecoder> {
        self.decoders.get(name)
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}

fn decode_constant_value(
    p: &mut Parser<'_>,
    _: &DecodeContext<'_>,
    _: u32,
) -> Result<AttributeBody> {
    Ok(AttributeBody::ConstantValue {
        constantvalue_index: p.read_u16()?,
    })
}

fn decode_code(p: &mut Parser<'_>, cx: &DecodeContext<'_>, _: u32) -> Result<AttributeBody> {
    p.parse_code_attribute(cx).map(AttributeBody::Code)
}

fn decode_stack_map_table(
    p: &mut Parser<'_>,
    _: &DecodeContext<'_>,
    _: u32,
) -> Result<AttributeBody> {
    p.parse_stack_map_table().map(AttributeBody::StackMapTable)
}

fn decode_exceptions(p: &mut Parser<'_>, _: &DecodeContext<'_>, _: u32) -> Result<AttributeBody> {
    p.parse_u16_table().map(AttributeBody::Exceptions)
}

fn decode_inner_classes(
    p: &mut Parser<'_>,
    _: &DecodeContext<'_>,
    _: u32,
) -> Result<AttributeBody> {
    p.parse_inner_classes().map(AttributeBody::InnerClasses)
}

fn decode_enclosing_method(
    p: &mut Parser<'_>,
    _: &DecodeContext<'_>,
    _: u32,
) -> Result<AttributeBody> {
    Ok(AttributeBody::EnclosingMethod {
        class_index: p.read_u16()?,
        method_index: p.read_u16()?,
    })
}

fn decode_synthetic(_: &mut Parser<'_>, _: &DecodeContext<'_>, _: u32) -> Result<AttributeBody> {
    Ok(AttributeBody::Synthetic)
}

fn decode_signature(p: &mut Parser<'_>, _: &DecodeContext<'_>, _: u32) -> Result<AttributeBody> {
    Ok(AttributeBody::Signature {
        signature_index: p.read_u16()?,
    })
}

fn decode_source_file(p: &mut Parser<'_>, _: &DecodeContext<'_>, _: u32) -> Result<AttributeBody> {
    Ok(AttributeBody::SourceFile {
        sourcefile_index: p.read_u16()?,
    })
}

fn decode_source_debug_extension(
    p: &mut Parser<'_>,
    _: &DecodeContext<'_>,
    length: u32,
) -> Result<AttributeBody> {
    p.read_bytes(length as usize)
        .map(AttributeBody::SourceDebugExtension)
}

fn decode_line_number_table(
    p: &mut Parser<'_>,
    _: &DecodeContext<'_>,
    _: u32,
) -> Result<AttributeBody> {
    p.parse_line_number_table().map(AttributeBody::LineNumberTable)
}

fn decode_local_variable_table(
    p: &mut Parser<'_>,
    _: &DecodeContext<'_>,
    _: u32,
) -> Result<AttributeBody> {
    p.parse_local_variable_table()
        .map(AttributeBody::LocalVariableTable)
}

fn decode_local_variable_type_table(
    p: &mut Parser<'_>,
    _: &DecodeContext<'_>,
    _: u32,
) -> Result<AttributeBody> {
    p.parse_local_variable_type_table()
        .map(AttributeBody::LocalVariableTypeTable)
}

fn decode_deprecated(_: &mut Parser<'_>, _: &DecodeContext<'_>, _: u32) -> Result<AttributeBody> {
    Ok(AttributeBody::Deprecated)
}

fn decode_runtime_visible_annotations(
    p: &mut Parser<'_>,
    cx: &DecodeContext<'_>,
    _: u32,
) -> Result<AttributeBody> {
    p.parse_annotations(cx)
        .map(AttributeBody::RuntimeVisibleAnnotations)
}

fn decode_runtime_invisible_annotations(
    p: &mut Parser<'_>,
    cx: &DecodeContext<'_>,
    _: u32,
) -> Result<AttributeBody> {
    p.parse_annotations(cx)
        .map(AttributeBody::RuntimeInvisibleAnnotations)
}

fn decode_runtime_visible_parameter_annotations(
    p: &mut Parser<'_>,
    cx: &DecodeContext<'_>,
    _: u32,
) -> Result<AttributeBody> {
    p.parse_parameter_annotations(cx)
        .map(AttributeBody::RuntimeVisibleParameterAnnotations)
}

fn decode_runtime_invisible_parameter_annotations(
    p: &mut Parser<'_>,
    cx: &DecodeContext<'_>,
    _: u32,
) -> Result<AttributeBody> {
    p.parse_parameter_annotations(cx)
        .map(AttributeBody::RuntimeInvisibleParameterAnnotations)
}

fn decode_runtime_visible_type_annotations(
    p: &mut Parser<'_>,
    cx: &DecodeContext<'_>,
    _: u32,
) -> Result<AttributeBody> {
    p.parse_type_annotations(cx)
        .map(AttributeBody::RuntimeVisibleTypeAnnotations)
}

fn decode_runtime_invisible_type_annotations(
    p: &mut Parser<'_>,
    cx: &DecodeContext<'_>,
    _: u32,
) -> Result<AttributeBody> {
    p.parse_type_annotations(cx)
        .map(AttributeBody::RuntimeInvisibleTypeAnnotations)
}

fn decode_annotation_default(
    p: &mut Parser<'_>,
    cx: &DecodeContext<'_>,
    _: u32,
) -> Result<AttributeBody> {
    p.parse_element_value(cx)
        .map(AttributeBody::AnnotationDefault)
}

fn decode_bootstrap_methods(
    p: &mut Parser<'_>,
    _: &DecodeContext<'_>,
    _: u32,
) -> Result<AttributeBody> {
    p.parse_bootstrap_methods().map(AttributeBody::BootstrapMethods)
}

fn decode_method_parameters(
    p: &mut Parser<'_>,
    _: &DecodeContext<'_>,
    _: u32,
) -> Result<AttributeBody> {
    p.parse_method_parameters().map(AttributeBody::MethodParameters)
}

fn decode_module(p: &mut Parser<'_>, _: &DecodeContext<'_>, _: u32) -> Result<AttributeBody> {
    p.parse_module().map(AttributeBody::Module)
}

fn decode_module_packages(
    p: &mut Parser<'_>,
    _: &DecodeContext<'_>,
    _: u32,
) -> Result<AttributeBody> {
    p.parse_u16_table().map(AttributeBody::ModulePackages)
}

fn decode_module_main_class(
    p: &mut Parser<'_>,
    _: &DecodeContext<'_>,
    _: u32,
) -> Result<AttributeBody> {
    Ok(AttributeBody::ModuleMainClass {
        main_class_index: p.read_u16()?,
    })
}

fn decode_nest_host(p: &mut Parser<'_>, _: &DecodeContext<'_>, _: u32) -> Result<AttributeBody> {
    Ok(AttributeBody::NestHost {
        host_class_index: p.read_u16()?,
    })
}

fn decode_nest_members(p: &mut Parser<'_>, _: &DecodeContext<'_>, _: u32) -> Result<AttributeBody> {
    p.parse_u16_table().map(AttributeBody::NestMembers)
}

fn decode_record(p: &mut Parser<'_>, cx: &DecodeContext<'_>, _: u32) -> Result<AttributeBody> {
    p.parse_record_components(cx).map(AttributeBody::Record)
}

fn decode_permitted_subclasses(
    p: &mut Parser<'_>,
    _: &DecodeContext<'_>,
    _: u32,
) -> Result<AttributeBody> {
    p.parse_u16_table().map(AttributeBody::PermittedSubclasses)
}

fn decode_source_id(p: &mut Parser<'_>, _: &DecodeContext<'_>, _: u32) -> Result<AttributeBody> {
    Ok(AttributeBody::SourceId {
        sourceid_index: p.read_u16()?,
    })
}

fn decode_compilation_id(
    p: &mut Parser<'_>,
    _: &DecodeContext<'_>,
    _: u32,
) -> Result<AttributeBody> {
    Ok(AttributeBody::CompilationId {
        compilationid_index: p.read_u16()?,
    })
}

fn decode_module_target(
    p: &mut Parser<'_>,
    _: &DecodeContext<'_>,
    _: u32,
) -> Result<AttributeBody> {
    Ok(AttributeBody::ModuleTarget {
        target_platform_index: p.read_u16()?,
    })
}

fn decode_module_resolution(
    p: &mut Parser<'_>,
    _: &DecodeContext<'_>,
    _: u32,
) -> Result<AttributeBody> {
    Ok(AttributeBody::ModuleResolution {
        resolution_flags: p.read_u16()?,
    })
}

fn decode_module_hashes(
    p: &mut Parser<'_>,
    _: &DecodeContext<'_>,
    _: u32,
) -> Result<AttributeBody> {
    p.parse_module_hashes().map(AttributeBody::ModuleHashes)
}
