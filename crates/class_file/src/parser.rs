use std::io::{Cursor, Read};

use byteorder::{BigEndian, ReadBytesExt};

use crate::{
    attributes::{DecodeContext, Registry},
    class_file::{FieldInfo, MethodInfo},
    constant_pool::{self, CpInfo},
    AccessFlags, ClassFile, ClassFileError, ConstantPool, DecoderOptions,
};

type Result<T, E = ClassFileError> = std::result::Result<T, E>;
type Endian = BigEndian;

/// Position-tracked big-endian reader over an immutable buffer.
///
/// Every read checks that enough bytes remain before touching the cursor, so a
/// failed read leaves the position where it was.
pub struct Parser<'a> {
    r: Cursor<&'a [u8]>,
}
impl<'a> Parser<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { r: Cursor::new(buf) }
    }

    pub fn position(&self) -> u64 {
        self.r.position()
    }

    pub fn remaining(&self) -> usize {
        let len = self.r.get_ref().len() as u64;
        len.saturating_sub(self.r.position()) as usize
    }

    pub fn parse_class_file(
        &mut self,
        registry: &Registry,
        options: &DecoderOptions,
    ) -> Result<ClassFile> {
        let _ = self.parse_magic_identifier()?;
        let version = self.parse_version()?;

        let constant_pool = self.parse_constant_pool()?;
        let cx = DecodeContext::new(&constant_pool, registry, options);

        let access_flags = AccessFlags::from_bits_truncate(self.read_u16()?);
        let this_class = self.read_u16()?;
        let super_class = self.read_u16()?;
        let interfaces_count = self.read_u16()?;
        let interfaces = self.parse_vec(interfaces_count, Self::read_u16)?;

        let fields_count = self.read_u16()?;
        let fields = self.parse_vec(fields_count, |p| p.parse_field_info(&cx))?;

        let methods_count = self.read_u16()?;
        let methods = self.parse_vec(methods_count, |p| p.parse_method_info(&cx))?;

        let attributes = self.parse_attributes(&cx)?;

        Ok(ClassFile {
            version,
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    fn parse_field_info(&mut self, cx: &DecodeContext<'_>) -> Result<FieldInfo> {
        let access_flags = AccessFlags::from_bits_truncate(self.read_u16()?);
        let name_index = self.read_u16()?;
        let descriptor_index = self.read_u16()?;
        let attributes = self.parse_attributes(cx)?;

        Ok(FieldInfo {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        })
    }

    fn parse_method_info(&mut self, cx: &DecodeContext<'_>) -> Result<MethodInfo> {
        let access_flags = AccessFlags::from_bits_truncate(self.read_u16()?);
        let name_index = self.read_u16()?;
        let descriptor_index = self.read_u16()?;
        let attributes = self.parse_attributes(cx)?;

        Ok(MethodInfo {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        })
    }

    fn parse_magic_identifier(&mut self) -> Result<()> {
        match self.read_u32()? {
            0xCAFEBABE => Ok(()),
            magic_identifier => Err(ClassFileError::InvalidMagicIdentifier(magic_identifier)),
        }
    }

    fn parse_version(&mut self) -> Result<(u16, u16)> {
        let minor = self.read_u16()?;
        let major = self.read_u16()?;
        Ok((major, minor))
    }

    fn parse_constant_pool(&mut self) -> Result<ConstantPool> {
        let constant_pool_count = self.read_u16()?;

        // Slot 0 is never stored, so a count of n means n - 1 usable slots.
        let mut count = (constant_pool_count as usize).saturating_sub(1);
        let mut res = Vec::with_capacity(count);
        while count > 0 {
            let (cp_info, slot_size) = self.parse_cp_info()?;
            res.push(cp_info);
            (1..slot_size).for_each(|_| res.push(CpInfo::Unusable));

            count = count.saturating_sub(slot_size);
        }
        Ok(ConstantPool::new(res))
    }

    fn parse_cp_info(&mut self) -> Result<(CpInfo, usize)> {
        let tag = self.read_u8()?;
        let (cp_info, slot_size) = match tag {
            1 => (self.parse_utf8()?, 1),
            3 => (CpInfo::Integer(self.read_i32()?), 1),
            4 => (CpInfo::Float(f32::from_bits(self.read_u32()?)), 1),
            5 => (CpInfo::Long(self.read_u64()? as i64), 2),
            6 => (CpInfo::Double(f64::from_bits(self.read_u64()?)), 2),
            7 => (self.parse_class_info()?, 1),
            8 => (self.parse_string()?, 1),
            9 => (CpInfo::FieldRef(self.parse_ref_info()?), 1),
            10 => (CpInfo::MethodRef(self.parse_ref_info()?), 1),
            11 => (CpInfo::InterfaceMethodRef(self.parse_ref_info()?), 1),
            12 => (self.parse_name_and_type_info()?, 1),
            15 => (self.parse_method_handle()?, 1),
            16 => (self.parse_method_type_info()?, 1),
            17 => (CpInfo::Dynamic(self.parse_dynamic_info()?), 1),
            18 => (CpInfo::InvokeDynamic(self.parse_dynamic_info()?), 1),
            19 => (CpInfo::Module { name_index: self.read_u16()? }, 1),
            20 => (CpInfo::Package { name_index: self.read_u16()? }, 1),
            _ => return Err(ClassFileError::InvalidCpInfoTag(tag)),
        };

        Ok((cp_info, slot_size))
    }

    fn parse_utf8(&mut self) -> Result<CpInfo> {
        let length = self.read_u16()?;
        let bytes = self.read_bytes(length as usize)?;

        Ok(CpInfo::Utf8(String::from_utf8_lossy(&bytes).into()))
    }

    fn parse_class_info(&mut self) -> Result<CpInfo> {
        let name_index = self.read_u16()?;

        Ok(CpInfo::Class(constant_pool::ClassInfo { name_index }))
    }

    fn parse_string(&mut self) -> Result<CpInfo> {
        let string_index = self.read_u16()?;

        Ok(CpInfo::String { string_index })
    }

    fn parse_name_and_type_info(&mut self) -> Result<CpInfo> {
        let name_index = self.read_u16()?;
        let descriptor_index = self.read_u16()?;

        Ok(CpInfo::NameAndType(constant_pool::NameAndTypeInfo {
            name_index,
            descriptor_index,
        }))
    }

    fn parse_method_handle(&mut self) -> Result<CpInfo> {
        let reference_kind = self.read_u8()?;
        let reference_index = self.read_u16()?;

        Ok(CpInfo::MethodHandle(constant_pool::MethodHandleInfo {
            reference_kind,
            reference_index,
        }))
    }

    fn parse_method_type_info(&mut self) -> Result<CpInfo> {
        let descriptor_index = self.read_u16()?;

        Ok(CpInfo::MethodType(constant_pool::MethodTypeInfo {
            descriptor_index,
        }))
    }

    fn parse_dynamic_info(&mut self) -> Result<constant_pool::DynamicInfo> {
        let bootstrap_method_attr_index = self.read_u16()?;
        let name_and_type_index = self.read_u16()?;

        Ok(constant_pool::DynamicInfo {
            bootstrap_method_attr_index,
            name_and_type_index,
        })
    }

    fn parse_ref_info(&mut self) -> Result<constant_pool::RefInfo> {
        let class_index = self.read_u16()?;
        let name_and_type_index = self.read_u16()?;

        Ok(constant_pool::RefInfo {
            class_index,
            name_and_type_index,
        })
    }

    /// Reads `count` entries with `f`, in order, failing on the first error.
    pub fn parse_vec<T>(
        &mut self,
        count: impl Into<usize>,
        mut f: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        let count = count.into();
        let mut res = Vec::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            res.push(f(self)?);
        }
        Ok(res)
    }

    /// Reads a u16 count followed by that many u16 values.
    pub fn parse_u16_table(&mut self) -> Result<Vec<u16>> {
        let count = self.read_u16()?;
        self.parse_vec(count, Self::read_u16)
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        let available = self.remaining();
        if available < needed {
            return Err(ClassFileError::TruncatedInput {
                offset: self.position(),
                needed,
                available,
            });
        }
        Ok(())
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        self.ensure(len)?;
        let mut bytes = vec![0u8; len];
        self.r.read_exact(&mut bytes)?;
        Ok(bytes)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.ensure(8)?;
        Ok(self.r.read_u64::<Endian>()?)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.r.read_u32::<Endian>()?)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.ensure(2)?;
        Ok(self.r.read_u16::<Endian>()?)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.r.read_u8()?)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.ensure(4)?;
        Ok(self.r.read_i32::<Endian>()?)
    }
}


#[cfg(test)]
mod parse_magic_identifier_tests {
    use super::*;

    #[test]
    fn it_should_be_able_to_parse_the_correct_identifier() {
        assert!(Parser::new(&[0xca, 0xfe, 0xba, 0xbe])
            .parse_magic_identifier()
            .is_ok());
    }

    #[test]
    fn it_should_fail_if_the_magic_identifier_is_incorrect() {
        assert!(matches!(
            Parser::new(&[0xca, 0xfe, 0xda, 0xda]).parse_magic_identifier(),
            Err(ClassFileError::InvalidMagicIdentifier(0xCAFEDADA))
        ));
    }
}

#[cfg(test)]
mod parse_constant_pool_tests {
    use super::*;

    #[test]
    fn it_should_reserve_a_second_slot_for_longs_and_doubles() {
        #[rustfmt::skip]
        let bytes = [
            0x00, 0x05,
            0x05, 0, 0, 0, 0, 0, 0, 0, 0x2a,
            0x06, 0x3f, 0xf0, 0, 0, 0, 0, 0, 0,
        ];
        let pool = Parser::new(&bytes).parse_constant_pool().unwrap();

        assert_eq!(pool.get(1).unwrap(), &CpInfo::Long(42));
        assert_eq!(pool.get(2).unwrap(), &CpInfo::Unusable);
        assert_eq!(pool.get(3).unwrap(), &CpInfo::Double(1.0));
        assert_eq!(pool.get(4).unwrap(), &CpInfo::Unusable);
    }

    #[test]
    fn it_should_accept_an_empty_pool_count() {
        let pool = Parser::new(&[0x00, 0x00]).parse_constant_pool().unwrap();
        assert!(pool.get(1).is_err());
    }

    #[test]
    fn it_should_reject_unknown_tags() {
        assert!(matches!(
            Parser::new(&[0x00, 0x02, 0x02]).parse_constant_pool(),
            Err(ClassFileError::InvalidCpInfoTag(2))
        ));
    }
}
