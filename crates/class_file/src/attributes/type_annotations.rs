//! `Runtime(In)VisibleTypeAnnotations` entries.
//!
//! A type annotation is `target_type: u8`, a `target_info` whose shape is
//! picked by the range `target_type` falls in, a `type_path`, and finally an
//! ordinary annotation.

use std::ops::RangeInclusive;

use crate::{parser::Parser, ClassFileError, Result};

use super::{Annotation, DecodeContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    TypeParameter,
    Supertype,
    TypeParameterBound,
    Empty,
    FormalParameter,
    Throws,
    LocalVar,
    Catch,
    Offset,
    TypeArgument,
}

// https://docs.oracle.com/javase/specs/jvms/se21/html/jvms-4.html#jvms-4.7.20-400
const TARGET_KINDS: &[(RangeInclusive<u8>, TargetKind)] = &[
    (0x00..=0x01, TargetKind::TypeParameter),
    (0x10..=0x10, TargetKind::Supertype),
    (0x11..=0x12, TargetKind::TypeParameterBound),
    (0x13..=0x15, TargetKind::Empty),
    (0x16..=0x16, TargetKind::FormalParameter),
    (0x17..=0x17, TargetKind::Throws),
    (0x40..=0x41, TargetKind::LocalVar),
    (0x42..=0x42, TargetKind::Catch),
    (0x43..=0x46, TargetKind::Offset),
    (0x47..=0x4B, TargetKind::TypeArgument),
];

impl TargetKind {
    pub fn of(target_type: u8) -> Option<TargetKind> {
        TARGET_KINDS
            .iter()
            .find(|(range, _)| range.contains(&target_type))
            .map(|(_, kind)| *kind)
    }
}

/// Index into the `interfaces` table, or the superclass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupertypeIndex {
    Superclass,
    Interface(u16),
}
impl SupertypeIndex {
    const SUPERCLASS: u16 = 65535;

    pub fn from_raw(raw: u16) -> Self {
        match raw {
            Self::SUPERCLASS => SupertypeIndex::Superclass,
            index => SupertypeIndex::Interface(index),
        }
    }

    pub fn raw(self) -> u16 {
        match self {
            SupertypeIndex::Superclass => Self::SUPERCLASS,
            SupertypeIndex::Interface(index) => index,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalVarTargetEntry {
    pub start_pc: u16,
    pub length: u16,
    pub index: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetInfo {
    TypeParameter {
        type_parameter_index: u8,
    },
    Supertype {
        supertype_index: SupertypeIndex,
    },
    TypeParameterBound {
        type_parameter_index: u8,
        bound_index: u8,
    },
    Empty,
    FormalParameter {
        formal_parameter_index: u8,
    },
    Throws {
        throws_type_index: u16,
    },
    LocalVar {
        table: Vec<LocalVarTargetEntry>,
    },
    Catch {
        exception_table_index: u16,
    },
    Offset {
        offset: u16,
    },
    TypeArgument {
        offset: u16,
        type_argument_index: u8,
    },
}
impl TargetInfo {
    pub fn kind(&self) -> TargetKind {
        match self {
            TargetInfo::TypeParameter { .. } => TargetKind::TypeParameter,
            TargetInfo::Supertype { .. } => TargetKind::Supertype,
            TargetInfo::TypeParameterBound { .. } => TargetKind::TypeParameterBound,
            TargetInfo::Empty => TargetKind::Empty,
            TargetInfo::FormalParameter { .. } => TargetKind::FormalParameter,
            TargetInfo::Throws { .. } => TargetKind::Throws,
            TargetInfo::LocalVar { .. } => TargetKind::LocalVar,
            TargetInfo::Catch { .. } => TargetKind::Catch,
            TargetInfo::Offset { .. } => TargetKind::Offset,
            TargetInfo::TypeArgument { .. } => TargetKind::TypeArgument,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypePathKind {
    /// Deeper in an array type.
    ArrayElement,
    /// Deeper in a nested type.
    NestedType,
    /// On the bound of a wildcard type argument.
    WildcardBound,
    /// On a type argument of a parameterized type.
    TypeArgument,
}
impl TypePathKind {
    pub fn from_u8(kind: u8) -> Option<Self> {
        Some(match kind {
            0 => TypePathKind::ArrayElement,
            1 => TypePathKind::NestedType,
            2 => TypePathKind::WildcardBound,
            3 => TypePathKind::TypeArgument,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypePathEntry {
    pub kind: TypePathKind,
    /// Only meaningful for [`TypePathKind::TypeArgument`]; zero otherwise.
    pub argument_index: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAnnotation {
    pub target_type: u8,
    /// `None` when `target_type` is outside every known range.
    pub target_info: Option<TargetInfo>,
    pub type_path: Vec<TypePathEntry>,
    pub annotation: Annotation,
}
impl TypeAnnotation {
    pub fn target_kind(&self) -> Option<TargetKind> {
        TargetKind::of(self.target_type)
    }
}

impl<'a> Parser<'a> {
    pub fn parse_type_annotations(
        &mut self,
        cx: &DecodeContext<'_>,
    ) -> Result<Vec<TypeAnnotation>> {
        let num_annotations = self.read_u16()?;
        self.parse_vec(num_annotations, |p| p.parse_type_annotation(cx))
    }

    pub fn parse_type_annotation(&mut self, cx: &DecodeContext<'_>) -> Result<TypeAnnotation> {
        let offset = self.position();
        let target_type = self.read_u8()?;
        let target_info = match TargetKind::of(target_type) {
            Some(kind) => Some(self.parse_target_info(kind)?),
            None => {
                // Left to the attribute length check to catch.
                log::warn!(
                    "Unknown type annotation target_type 0x{:02X} at {}, reading no target_info",
                    target_type,
                    offset
                );
                None
            }
        };
        let type_path = self.parse_type_path()?;
        let annotation = self.parse_annotation(cx)?;

        Ok(TypeAnnotation {
            target_type,
            target_info,
            type_path,
            annotation,
        })
    }

    fn parse_target_info(&mut self, kind: TargetKind) -> Result<TargetInfo> {
        Ok(match kind {
            TargetKind::TypeParameter => TargetInfo::TypeParameter {
                type_parameter_index: self.read_u8()?,
            },
            TargetKind::Supertype => TargetInfo::Supertype {
                supertype_index: SupertypeIndex::from_raw(self.read_u16()?),
            },
            TargetKind::TypeParameterBound => TargetInfo::TypeParameterBound {
                type_parameter_index: self.read_u8()?,
                bound_index: self.read_u8()?,
            },
            TargetKind::Empty => TargetInfo::Empty,
            TargetKind::FormalParameter => TargetInfo::FormalParameter {
                formal_parameter_index: self.read_u8()?,
            },
            TargetKind::Throws => TargetInfo::Throws {
                throws_type_index: self.read_u16()?,
            },
            TargetKind::LocalVar => {
                let table_length = self.read_u16()?;
                let table = self.parse_vec(table_length, |p| {
                    Ok(LocalVarTargetEntry {
                        start_pc: p.read_u16()?,
                        length: p.read_u16()?,
                        index: p.read_u16()?,
                    })
                })?;
                TargetInfo::LocalVar { table }
            }
            TargetKind::Catch => TargetInfo::Catch {
                exception_table_index: self.read_u16()?,
            },
            TargetKind::Offset => TargetInfo::Offset {
                offset: self.read_u16()?,
            },
            TargetKind::TypeArgument => TargetInfo::TypeArgument {
                offset: self.read_u16()?,
                type_argument_index: self.read_u8()?,
            },
        })
    }

    fn parse_type_path(&mut self) -> Result<Vec<TypePathEntry>> {
        let path_length = self.read_u8()?;
        self.parse_vec(path_length, |p| {
            let offset = p.position();
            let type_path_kind = p.read_u8()?;
            let kind = TypePathKind::from_u8(type_path_kind).ok_or(
                ClassFileError::MalformedTag {
                    structure: "type_path_kind",
                    tag: type_path_kind,
                    offset,
                },
            )?;
            let argument_index = p.read_u8()?;
            Ok(TypePathEntry {
                kind,
                argument_index,
            })
        })
    }
}

#[cfg(test)]
mod parse_type_annotation_tests {
    use super::*;
    use crate::{
        attributes::{test_support::*, AttributeBody},
        DecoderOptions,
    };

    /// Empty type path and an annotation of type #9 without pairs.
    const TAIL: [u8; 5] = [0x00, 0x00, 0x09, 0x00, 0x00];

    fn type_annotation(head: &[u8]) -> Result<(TypeAnnotation, u64)> {
        let bytes = [head, &TAIL].concat();
        with_context(&Symbols::default(), &DecoderOptions::default(), |cx| {
            let mut p = Parser::new(&bytes);
            let annotation = p.parse_type_annotation(cx)?;
            Ok((annotation, p.position() - TAIL.len() as u64))
        })
    }

    fn target_info(head: &[u8]) -> (Option<TargetInfo>, u64) {
        let (annotation, consumed) = type_annotation(head).unwrap();
        assert!(annotation.type_path.is_empty());
        assert_eq!(annotation.annotation.type_index, 9);
        (annotation.target_info, consumed)
    }

    #[test]
    fn it_should_pick_the_target_kind_by_range() {
        let expected = [
            (0x00, TargetKind::TypeParameter),
            (0x01, TargetKind::TypeParameter),
            (0x10, TargetKind::Supertype),
            (0x11, TargetKind::TypeParameterBound),
            (0x12, TargetKind::TypeParameterBound),
            (0x13, TargetKind::Empty),
            (0x14, TargetKind::Empty),
            (0x15, TargetKind::Empty),
            (0x16, TargetKind::FormalParameter),
            (0x17, TargetKind::Throws),
            (0x40, TargetKind::LocalVar),
            (0x41, TargetKind::LocalVar),
            (0x42, TargetKind::Catch),
            (0x43, TargetKind::Offset),
            (0x46, TargetKind::Offset),
            (0x47, TargetKind::TypeArgument),
            (0x4B, TargetKind::TypeArgument),
        ];
        for (target_type, kind) in expected {
            assert_eq!(TargetKind::of(target_type), Some(kind), "{:#x}", target_type);
        }
        for target_type in [0x02, 0x0f, 0x18, 0x3f, 0x4c, 0xff] {
            assert_eq!(TargetKind::of(target_type), None, "{:#x}", target_type);
        }
    }

    #[test]
    fn it_should_consume_exactly_the_bytes_of_each_target_shape() {
        assert_eq!(
            target_info(&[0x01, 0x02]),
            (Some(TargetInfo::TypeParameter { type_parameter_index: 2 }), 2)
        );
        assert_eq!(
            target_info(&[0x12, 0x01, 0x03]),
            (
                Some(TargetInfo::TypeParameterBound {
                    type_parameter_index: 1,
                    bound_index: 3
                }),
                3
            )
        );
        assert_eq!(target_info(&[0x14]), (Some(TargetInfo::Empty), 1));
        assert_eq!(
            target_info(&[0x16, 0x04]),
            (Some(TargetInfo::FormalParameter { formal_parameter_index: 4 }), 2)
        );
        assert_eq!(
            target_info(&[0x17, 0x00, 0x05]),
            (Some(TargetInfo::Throws { throws_type_index: 5 }), 3)
        );
        assert_eq!(
            target_info(&[0x42, 0x00, 0x06]),
            (Some(TargetInfo::Catch { exception_table_index: 6 }), 3)
        );
        assert_eq!(
            target_info(&[0x45, 0x01, 0x00]),
            (Some(TargetInfo::Offset { offset: 256 }), 3)
        );
        assert_eq!(
            target_info(&[0x49, 0x00, 0x10, 0x02]),
            (
                Some(TargetInfo::TypeArgument {
                    offset: 16,
                    type_argument_index: 2
                }),
                4
            )
        );
    }

    #[test]
    fn it_should_decode_a_variable_length_localvar_table() {
        #[rustfmt::skip]
        let head = [
            0x40, 0x00, 0x02,
            0x00, 0x00, 0x00, 0x0a, 0x00, 0x01,
            0x00, 0x04, 0x00, 0x06, 0x00, 0x02,
        ];
        assert_eq!(
            target_info(&head),
            (
                Some(TargetInfo::LocalVar {
                    table: vec![
                        LocalVarTargetEntry {
                            start_pc: 0,
                            length: 10,
                            index: 1
                        },
                        LocalVarTargetEntry {
                            start_pc: 4,
                            length: 6,
                            index: 2
                        },
                    ]
                }),
                15
            )
        );
    }

    #[test]
    fn it_should_tell_the_superclass_sentinel_apart_from_an_interface_index() {
        assert_eq!(
            target_info(&[0x10, 0xff, 0xff]),
            (
                Some(TargetInfo::Supertype {
                    supertype_index: SupertypeIndex::Superclass
                }),
                3
            )
        );
        assert_eq!(
            target_info(&[0x10, 0xff, 0xfe]),
            (
                Some(TargetInfo::Supertype {
                    supertype_index: SupertypeIndex::Interface(65534)
                }),
                3
            )
        );
        assert_eq!(SupertypeIndex::Superclass.raw(), 65535);
    }

    #[test]
    fn it_should_tolerate_an_unknown_target_type() {
        let (annotation, consumed) = type_annotation(&[0x30]).unwrap();
        assert_eq!(annotation.target_info, None);
        assert_eq!(annotation.target_kind(), None);
        assert_eq!(consumed, 1);
    }

    #[test]
    fn it_should_decode_a_type_path() {
        #[rustfmt::skip]
        let bytes = [
            0x13,
            0x02, 0x00, 0x00, 0x03, 0x01,
            0x00, 0x09, 0x00, 0x00,
        ];
        let annotation = with_context(&Symbols::default(), &DecoderOptions::default(), |cx| {
            Parser::new(&bytes).parse_type_annotation(cx)
        })
        .unwrap();

        assert_eq!(
            annotation.type_path,
            vec![
                TypePathEntry {
                    kind: TypePathKind::ArrayElement,
                    argument_index: 0
                },
                TypePathEntry {
                    kind: TypePathKind::TypeArgument,
                    argument_index: 1
                },
            ]
        );
    }

    #[test]
    fn it_should_reject_an_unknown_type_path_kind() {
        let bytes = [0x13, 0x01, 0x04, 0x00, 0x00, 0x09, 0x00, 0x00];
        let result = with_context(&Symbols::default(), &DecoderOptions::default(), |cx| {
            Parser::new(&bytes).parse_type_annotation(cx)
        });
        assert!(matches!(
            result,
            Err(ClassFileError::MalformedTag {
                structure: "type_path_kind",
                tag: 4,
                offset: 2,
            })
        ));
    }

    #[test]
    fn it_should_let_the_length_fence_catch_a_misread_unknown_target() {
        let symbols = Symbols::with(&[(1, "RuntimeVisibleTypeAnnotations")]);
        // 0x20 is unknown and followed by two bytes of target_info the decoder
        // cannot know about, so everything after it is read shifted by two.
        #[rustfmt::skip]
        let bytes = [
            0x00, 0x01, 0x00, 0x00, 0x00, 0x0a,
            0x00, 0x01,
            0x20, 0x00, 0x00,
            0x00,
            0x00, 0x00, 0x00, 0x00,
        ];
        let err = parse_one(&symbols, &bytes).unwrap_err();
        assert!(matches!(
            err,
            ClassFileError::LengthMismatch {
                declared: 10,
                consumed: 8,
                ..
            }
        ));
    }

    #[test]
    fn it_should_decode_a_type_annotations_attribute() {
        let symbols = Symbols::with(&[(1, "RuntimeInvisibleTypeAnnotations")]);
        #[rustfmt::skip]
        let bytes = [
            0x00, 0x01, 0x00, 0x00, 0x00, 0x0d,
            0x00, 0x01,
            0x47, 0x00, 0x03, 0x00,
            0x00,
            0x00, 0x09, 0x00, 0x01, 0x00, 0x02, b's', 0x00, 0x05,
        ];
        let attribute = parse_one(&symbols, &bytes);
        // Declared three bytes short of the body.
        assert!(attribute.is_err());

        #[rustfmt::skip]
        let bytes = [
            0x00, 0x01, 0x00, 0x00, 0x00, 0x10,
            0x00, 0x01,
            0x47, 0x00, 0x03, 0x00,
            0x00,
            0x00, 0x09, 0x00, 0x01, 0x00, 0x02, b's', 0x00, 0x05,
        ];
        let attribute = parse_one(&symbols, &bytes).unwrap();
        let AttributeBody::RuntimeInvisibleTypeAnnotations(annotations) = attribute.body else {
            panic!("unexpected {:?}", attribute.body);
        };
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].target_kind(), Some(TargetKind::TypeArgument));
        assert_eq!(annotations[0].annotation.element_value_pairs.len(), 1);
    }
}
