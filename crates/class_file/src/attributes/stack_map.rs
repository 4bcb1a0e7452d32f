use std::ops::RangeInclusive;

use crate::{parser::Parser, ClassFileError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationTypeInfo {
    Top,
    Integer,
    Float,
    Double,
    Long,
    Null,
    UninitializedThis,
    Object { cpool_index: u16 },
    /// Offset of the `new` instruction that created the object.
    Uninitialized { offset: u16 },
}
impl VerificationTypeInfo {
    pub fn tag(&self) -> u8 {
        match self {
            VerificationTypeInfo::Top => 0,
            VerificationTypeInfo::Integer => 1,
            VerificationTypeInfo::Float => 2,
            VerificationTypeInfo::Double => 3,
            VerificationTypeInfo::Long => 4,
            VerificationTypeInfo::Null => 5,
            VerificationTypeInfo::UninitializedThis => 6,
            VerificationTypeInfo::Object { .. } => 7,
            VerificationTypeInfo::Uninitialized { .. } => 8,
        }
    }

    /// Encoded size, tag included.
    pub fn encoded_len(&self) -> usize {
        match self {
            VerificationTypeInfo::Object { .. } | VerificationTypeInfo::Uninitialized { .. } => 3,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Same,
    SameLocals1StackItem,
    SameLocals1StackItemExtended,
    Chop,
    SameExtended,
    Append,
    Full,
}

// https://docs.oracle.com/javase/specs/jvms/se21/html/jvms-4.html#jvms-4.7.4
const FRAME_KINDS: &[(RangeInclusive<u8>, Option<FrameKind>)] = &[
    (0..=63, Some(FrameKind::Same)),
    (64..=127, Some(FrameKind::SameLocals1StackItem)),
    (128..=246, None),
    (247..=247, Some(FrameKind::SameLocals1StackItemExtended)),
    (248..=250, Some(FrameKind::Chop)),
    (251..=251, Some(FrameKind::SameExtended)),
    (252..=254, Some(FrameKind::Append)),
    (255..=255, Some(FrameKind::Full)),
];

impl FrameKind {
    /// `None` for the reserved frame types 128 to 246.
    pub fn of(frame_type: u8) -> Option<FrameKind> {
        FRAME_KINDS
            .iter()
            .find(|(range, _)| range.contains(&frame_type))
            .and_then(|(_, kind)| *kind)
    }
}

/// What follows the frame type byte. Offsets implied by the frame type are
/// not stored, see [`StackMapFrame::offset_delta`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramePayload {
    Same,
    SameLocals1StackItem {
        stack: VerificationTypeInfo,
    },
    SameLocals1StackItemExtended {
        offset_delta: u16,
        stack: VerificationTypeInfo,
    },
    Chop {
        offset_delta: u16,
    },
    SameExtended {
        offset_delta: u16,
    },
    Append {
        offset_delta: u16,
        locals: Vec<VerificationTypeInfo>,
    },
    Full {
        offset_delta: u16,
        locals: Vec<VerificationTypeInfo>,
        stack: Vec<VerificationTypeInfo>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackMapFrame {
    frame_type: u8,
    payload: FramePayload,
}
impl StackMapFrame {
    pub fn frame_type(&self) -> u8 {
        self.frame_type
    }

    pub fn payload(&self) -> &FramePayload {
        &self.payload
    }

    pub fn kind(&self) -> FrameKind {
        match self.payload {
            FramePayload::Same => FrameKind::Same,
            FramePayload::SameLocals1StackItem { .. } => FrameKind::SameLocals1StackItem,
            FramePayload::SameLocals1StackItemExtended { .. } => {
                FrameKind::SameLocals1StackItemExtended
            }
            FramePayload::Chop { .. } => FrameKind::Chop,
            FramePayload::SameExtended { .. } => FrameKind::SameExtended,
            FramePayload::Append { .. } => FrameKind::Append,
            FramePayload::Full { .. } => FrameKind::Full,
        }
    }

    /// Delta over the previous frame's bytecode offset.
    pub fn offset_delta(&self) -> u16 {
        match self.payload {
            FramePayload::Same => self.frame_type as u16,
            FramePayload::SameLocals1StackItem { .. } => self.frame_type as u16 - 64,
            FramePayload::SameLocals1StackItemExtended { offset_delta, .. }
            | FramePayload::Chop { offset_delta }
            | FramePayload::SameExtended { offset_delta }
            | FramePayload::Append { offset_delta, .. }
            | FramePayload::Full { offset_delta, .. } => offset_delta,
        }
    }

    /// Number of locals a chop frame removes.
    pub fn chopped_locals(&self) -> Option<u8> {
        match self.payload {
            FramePayload::Chop { .. } => Some(251 - self.frame_type),
            _ => None,
        }
    }
}

impl<'a> Parser<'a> {
    /// `number_of_entries: u16`, then the frames in bytecode order.
    pub fn parse_stack_map_table(&mut self) -> Result<Vec<StackMapFrame>> {
        let number_of_entries = self.read_u16()?;
        self.parse_vec(number_of_entries, Self::parse_stack_map_frame)
    }

    pub fn parse_stack_map_frame(&mut self) -> Result<StackMapFrame> {
        let offset = self.position();
        let frame_type = self.read_u8()?;
        let kind = FrameKind::of(frame_type).ok_or(ClassFileError::MalformedTag {
            structure: "stack_map_frame",
            tag: frame_type,
            offset,
        })?;

        let payload = match kind {
            FrameKind::Same => FramePayload::Same,
            FrameKind::SameLocals1StackItem => FramePayload::SameLocals1StackItem {
                stack: self.parse_verification_type_info()?,
            },
            FrameKind::SameLocals1StackItemExtended => {
                FramePayload::SameLocals1StackItemExtended {
                    offset_delta: self.read_u16()?,
                    stack: self.parse_verification_type_info()?,
                }
            }
            FrameKind::Chop => FramePayload::Chop {
                offset_delta: self.read_u16()?,
            },
            FrameKind::SameExtended => FramePayload::SameExtended {
                offset_delta: self.read_u16()?,
            },
            FrameKind::Append => {
                let offset_delta = self.read_u16()?;
                let locals = self.parse_vec(frame_type - 251, Self::parse_verification_type_info)?;
                FramePayload::Append {
                    offset_delta,
                    locals,
                }
            }
            FrameKind::Full => {
                let offset_delta = self.read_u16()?;
                let number_of_locals = self.read_u16()?;
                let locals = self.parse_vec(number_of_locals, Self::parse_verification_type_info)?;
                let number_of_stack_items = self.read_u16()?;
                let stack =
                    self.parse_vec(number_of_stack_items, Self::parse_verification_type_info)?;
                FramePayload::Full {
                    offset_delta,
                    locals,
                    stack,
                }
            }
        };

        Ok(StackMapFrame {
            frame_type,
            payload,
        })
    }

    pub fn parse_verification_type_info(&mut self) -> Result<VerificationTypeInfo> {
        let offset = self.position();
        Ok(match self.read_u8()? {
            0 => VerificationTypeInfo::Top,
            1 => VerificationTypeInfo::Integer,
            2 => VerificationTypeInfo::Float,
            3 => VerificationTypeInfo::Double,
            4 => VerificationTypeInfo::Long,
            5 => VerificationTypeInfo::Null,
            6 => VerificationTypeInfo::UninitializedThis,
            7 => VerificationTypeInfo::Object {
                cpool_index: self.read_u16()?,
            },
            8 => VerificationTypeInfo::Uninitialized {
                offset: self.read_u16()?,
            },
            tag => {
                return Err(ClassFileError::MalformedTag {
                    structure: "verification_type_info",
                    tag,
                    offset,
                })
            }
        })
    }
}

#[cfg(test)]
mod parse_stack_map_frame_tests {
    use super::*;
    use crate::attributes::{test_support::*, AttributeBody};

    fn frame(bytes: &[u8]) -> (StackMapFrame, u64) {
        let mut p = Parser::new(bytes);
        let frame = p.parse_stack_map_frame().unwrap();
        (frame, p.position())
    }

    #[test]
    fn it_should_derive_the_offset_of_same_frames_from_the_frame_type() {
        let (f, consumed) = frame(&[0]);
        assert_eq!((f.kind(), f.offset_delta(), consumed), (FrameKind::Same, 0, 1));

        let (f, consumed) = frame(&[63]);
        assert_eq!((f.kind(), f.offset_delta(), consumed), (FrameKind::Same, 63, 1));
    }

    #[test]
    fn it_should_derive_the_offset_of_same_locals_1_stack_item_frames() {
        let (f, consumed) = frame(&[64, 1]);
        assert_eq!(f.kind(), FrameKind::SameLocals1StackItem);
        assert_eq!(f.offset_delta(), 0);
        assert_eq!(
            f.payload(),
            &FramePayload::SameLocals1StackItem {
                stack: VerificationTypeInfo::Integer
            }
        );
        assert_eq!(consumed, 2);

        let (f, _) = frame(&[127, 0]);
        assert_eq!(f.offset_delta(), 63);
    }

    #[test]
    fn it_should_reject_every_reserved_frame_type() {
        for frame_type in 128..=246u8 {
            match Parser::new(&[frame_type, 0, 0, 0]).parse_stack_map_frame() {
                Err(ClassFileError::MalformedTag {
                    structure: "stack_map_frame",
                    tag,
                    offset: 0,
                }) => assert_eq!(tag, frame_type),
                other => panic!("unexpected {:?} for {}", other, frame_type),
            }
        }
    }

    #[test]
    fn it_should_read_an_extended_same_locals_1_stack_item_frame() {
        let (f, consumed) = frame(&[247, 0x01, 0x00, 7, 0x00, 0x0c]);
        assert_eq!(f.offset_delta(), 256);
        assert_eq!(
            f.payload(),
            &FramePayload::SameLocals1StackItemExtended {
                offset_delta: 256,
                stack: VerificationTypeInfo::Object { cpool_index: 12 }
            }
        );
        // type byte, offset_delta, then one three byte verification type.
        assert_eq!(consumed, 1 + 2 + 3);
    }

    #[test]
    fn it_should_count_chopped_locals_from_the_frame_type() {
        for (frame_type, k) in [(248, 3), (249, 2), (250, 1)] {
            let (f, consumed) = frame(&[frame_type, 0x00, 0x05]);
            assert_eq!(f.kind(), FrameKind::Chop);
            assert_eq!(f.chopped_locals(), Some(k));
            assert_eq!(f.offset_delta(), 5);
            assert_eq!(consumed, 3);
        }
    }

    #[test]
    fn it_should_read_only_the_offset_of_a_same_frame_extended() {
        let (f, consumed) = frame(&[251, 0x00, 0x40, 0xff]);
        assert_eq!(f.kind(), FrameKind::SameExtended);
        assert_eq!(f.offset_delta(), 64);
        assert_eq!(f.chopped_locals(), None);
        assert_eq!(consumed, 3);
    }

    #[test]
    fn it_should_read_as_many_appended_locals_as_the_frame_type_says() {
        let (f, consumed) = frame(&[252, 0x00, 0x02, 8, 0x00, 0x03, 1]);
        assert_eq!(
            f.payload(),
            &FramePayload::Append {
                offset_delta: 2,
                locals: vec![VerificationTypeInfo::Uninitialized { offset: 3 }],
            }
        );
        assert_eq!(consumed, 6);

        let (f, consumed) = frame(&[254, 0x00, 0x00, 1, 2, 4]);
        let FramePayload::Append { locals, .. } = f.payload() else {
            panic!("unexpected {:?}", f);
        };
        assert_eq!(
            locals,
            &vec![
                VerificationTypeInfo::Integer,
                VerificationTypeInfo::Float,
                VerificationTypeInfo::Long,
            ]
        );
        assert_eq!(consumed, 6);
    }

    #[test]
    fn it_should_size_full_frame_locals_and_stack_independently() {
        #[rustfmt::skip]
        let bytes = [
            255, 0x00, 0x09,
            0x00, 0x03, 6, 7, 0x00, 0x02, 3,
            0x00, 0x01, 5,
        ];
        let (f, consumed) = frame(&bytes);
        assert_eq!(
            f.payload(),
            &FramePayload::Full {
                offset_delta: 9,
                locals: vec![
                    VerificationTypeInfo::UninitializedThis,
                    VerificationTypeInfo::Object { cpool_index: 2 },
                    VerificationTypeInfo::Double,
                ],
                stack: vec![VerificationTypeInfo::Null],
            }
        );
        assert_eq!(consumed, bytes.len() as u64);
    }

    #[test]
    fn it_should_reject_an_unknown_verification_type_tag() {
        assert!(matches!(
            Parser::new(&[64, 9]).parse_stack_map_frame(),
            Err(ClassFileError::MalformedTag {
                structure: "verification_type_info",
                tag: 9,
                offset: 1,
            })
        ));
    }

    #[test]
    fn it_should_fail_on_a_truncated_full_frame() {
        assert!(matches!(
            Parser::new(&[255, 0x00, 0x00, 0x00, 0x02, 0]).parse_stack_map_frame(),
            Err(ClassFileError::TruncatedInput { offset: 6, .. })
        ));
    }

    #[test]
    fn it_should_keep_frames_in_table_order() {
        let symbols = Symbols::with(&[(1, "StackMapTable")]);
        #[rustfmt::skip]
        let bytes = [
            0x00, 0x01, 0x00, 0x00, 0x00, 0x07,
            0x00, 0x03,
            10,
            65, 0,
            249, 0x00, 0x04,
        ];
        let attribute = parse_one(&symbols, &bytes);
        // 8 body bytes against a declared 7.
        assert!(matches!(
            attribute,
            Err(ClassFileError::LengthMismatch {
                declared: 7,
                consumed: 8,
                ..
            })
        ));

        let mut bytes = bytes;
        bytes[5] = 0x08;
        let attribute = parse_one(&symbols, &bytes).unwrap();
        let AttributeBody::StackMapTable(frames) = attribute.body else {
            panic!("unexpected {:?}", attribute.body);
        };
        let deltas: Vec<_> = frames.iter().map(|f| f.offset_delta()).collect();
        assert_eq!(deltas, vec![10, 1, 4]);
    }
}
