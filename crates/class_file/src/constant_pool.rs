use crate::{ClassFileError, Result, SymbolLookup};

#[macro_export]
macro_rules! matches_cp_info {
    ($cp:expr, $index:expr, $i:ident) => {
        match $cp.get($index)? {
            $crate::constant_pool::CpInfo::$i(ref n) => Ok(n),
            c => Err($crate::ClassFileError::UnexpectedConstantPoolEntry(
                stringify!($i),
                c.clone(),
            )),
        }
    };
}

#[derive(Debug, Default)]
pub struct ConstantPool {
    cp_infos: Vec<CpInfo>,
}
impl ConstantPool {
    pub fn new(cp_infos: Vec<CpInfo>) -> Self {
        Self { cp_infos }
    }

    /// Looks up a one-based constant pool index.
    pub fn get(&self, index: u16) -> Result<&CpInfo> {
        (index as usize)
            .checked_sub(1)
            .and_then(|i| self.cp_infos.get(i))
            .ok_or(ClassFileError::InvalidConstantPoolIndex(index))
    }

    pub fn len(&self) -> usize {
        self.cp_infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cp_infos.is_empty()
    }
}
impl<'a> IntoIterator for &'a ConstantPool {
    type Item = &'a CpInfo;
    type IntoIter = std::slice::Iter<'a, CpInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.cp_infos.iter()
    }
}

impl SymbolLookup for ConstantPool {
    fn resolve_name(&self, index: u16) -> Result<&str> {
        matches_cp_info!(self, index, Utf8).map(String::as_str)
    }

    fn describe(&self, index: u16) -> String {
        match self.get(index) {
            Ok(CpInfo::Utf8(s)) => format!("#{} = Utf8 {}", index, s),
            Ok(CpInfo::Class(ClassInfo { name_index })) => match self.resolve_name(*name_index) {
                Ok(name) => format!("#{} = Class {}", index, name),
                Err(_) => format!("#{} = Class #{}", index, name_index),
            },
            Ok(cp_info) => format!("#{} = {:?}", index, cp_info),
            Err(_) => format!("#{} = <invalid>", index),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum CpInfo {
    MethodRef(RefInfo),
    FieldRef(RefInfo),
    Float(f32),
    Double(f64),
    InterfaceMethodRef(RefInfo),
    Class(ClassInfo),
    NameAndType(NameAndTypeInfo),
    Utf8(String),
    String { string_index: u16 },
    Dynamic(DynamicInfo),
    InvokeDynamic(DynamicInfo),
    Integer(i32),
    MethodHandle(MethodHandleInfo),
    MethodType(MethodTypeInfo),
    Long(i64),
    Module { name_index: u16 },
    Package { name_index: u16 },
    Unusable,
}

#[derive(Debug, PartialEq, Clone)]
pub struct RefInfo {
    pub class_index: u16,
    pub name_and_type_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ClassInfo {
    // Must point at a CONSTANT_Utf8_info holding a binary name in internal form.
    pub name_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct NameAndTypeInfo {
    pub name_index: u16,
    pub descriptor_index: u16,
}

/// Shared by CONSTANT_Dynamic and CONSTANT_InvokeDynamic.
#[derive(Debug, PartialEq, Clone)]
pub struct DynamicInfo {
    pub bootstrap_method_attr_index: u16,
    pub name_and_type_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct MethodHandleInfo {
    pub reference_kind: u8,
    pub reference_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct MethodTypeInfo {
    pub descriptor_index: u16,
}
