use crate::{parser::Parser, ClassFileError, Result};

use super::DecodeContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub type_index: u16,
    pub element_value_pairs: Vec<ElementValuePair>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementValuePair {
    pub name_index: u16,
    pub value: ElementValue,
}

/// The primitive and string tags, which all carry a single `const_value_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstKind {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
    String,
}
impl ConstKind {
    pub fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            b'B' => ConstKind::Byte,
            b'C' => ConstKind::Char,
            b'D' => ConstKind::Double,
            b'F' => ConstKind::Float,
            b'I' => ConstKind::Int,
            b'J' => ConstKind::Long,
            b'S' => ConstKind::Short,
            b'Z' => ConstKind::Boolean,
            b's' => ConstKind::String,
            _ => return None,
        })
    }

    pub fn tag(self) -> u8 {
        match self {
            ConstKind::Byte => b'B',
            ConstKind::Char => b'C',
            ConstKind::Double => b'D',
            ConstKind::Float => b'F',
            ConstKind::Int => b'I',
            ConstKind::Long => b'J',
            ConstKind::Short => b'S',
            ConstKind::Boolean => b'Z',
            ConstKind::String => b's',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementValue {
    Const {
        kind: ConstKind,
        const_value_index: u16,
    },
    Enum {
        type_name_index: u16,
        const_name_index: u16,
    },
    Class {
        class_info_index: u16,
    },
    Annotation(Annotation),
    Array(Vec<ElementValue>),
}
impl ElementValue {
    pub fn tag(&self) -> u8 {
        match self {
            ElementValue::Const { kind, .. } => kind.tag(),
            ElementValue::Enum { .. } => b'e',
            ElementValue::Class { .. } => b'c',
            ElementValue::Annotation(_) => b'@',
            ElementValue::Array(_) => b'[',
        }
    }
}

impl<'a> Parser<'a> {
    /// `num_annotations: u16` followed by that many annotations.
    pub fn parse_annotations(&mut self, cx: &DecodeContext<'_>) -> Result<Vec<Annotation>> {
        let num_annotations = self.read_u16()?;
        self.parse_vec(num_annotations, |p| p.parse_annotation(cx))
    }

    /// `num_parameters: u8`, then an annotation table per parameter.
    pub fn parse_parameter_annotations(
        &mut self,
        cx: &DecodeContext<'_>,
    ) -> Result<Vec<Vec<Annotation>>> {
        let num_parameters = self.read_u8()?;
        self.parse_vec(num_parameters, |p| p.parse_annotations(cx))
    }

    pub fn parse_annotation(&mut self, cx: &DecodeContext<'_>) -> Result<Annotation> {
        self.parse_annotation_nested(cx.options.max_nesting_depth, 0)
    }

    pub fn parse_element_value(&mut self, cx: &DecodeContext<'_>) -> Result<ElementValue> {
        self.parse_element_value_nested(cx.options.max_nesting_depth, 0)
    }

    fn parse_annotation_nested(&mut self, limit: usize, depth: usize) -> Result<Annotation> {
        let type_index = self.read_u16()?;
        let num_element_value_pairs = self.read_u16()?;
        let element_value_pairs = self.parse_vec(num_element_value_pairs, |p| {
            let name_index = p.read_u16()?;
            let value = p.parse_element_value_nested(limit, depth)?;
            Ok(ElementValuePair { name_index, value })
        })?;

        Ok(Annotation {
            type_index,
            element_value_pairs,
        })
    }

    fn parse_element_value_nested(&mut self, limit: usize, depth: usize) -> Result<ElementValue> {
        let offset = self.position();
        let tag = self.read_u8()?;

        if let Some(kind) = ConstKind::from_tag(tag) {
            return Ok(ElementValue::Const {
                kind,
                const_value_index: self.read_u16()?,
            });
        }

        match tag {
            b'e' => Ok(ElementValue::Enum {
                type_name_index: self.read_u16()?,
                const_name_index: self.read_u16()?,
            }),
            b'c' => Ok(ElementValue::Class {
                class_info_index: self.read_u16()?,
            }),
            b'@' | b'[' if depth >= limit => Err(ClassFileError::NestingTooDeep {
                structure: "element_value",
                limit,
                offset,
            }),
            b'@' => self
                .parse_annotation_nested(limit, depth + 1)
                .map(ElementValue::Annotation),
            b'[' => {
                let num_values = self.read_u16()?;
                self.parse_vec(num_values, |p| p.parse_element_value_nested(limit, depth + 1))
                    .map(ElementValue::Array)
            }
            // Nothing tells how long the payload of an unknown tag is.
            _ => Err(ClassFileError::MalformedTag {
                structure: "element_value",
                tag,
                offset,
            }),
        }
    }
}
