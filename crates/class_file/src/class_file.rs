use crate::{
    attributes::{Attributes, Registry},
    constant_pool::ClassInfo,
    parser::Parser,
    AccessFlags, ConstantPool, DecoderOptions, Result,
};

#[derive(Debug)]
pub struct ClassFile {
    /// `(major, minor)`
    pub version: (u16, u16),
    pub constant_pool: ConstantPool,
    pub access_flags: AccessFlags,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub attributes: Attributes,
}
impl ClassFile {
    /// Decodes `bytes` with the standard attribute registry and default options.
    pub fn parse(bytes: &[u8]) -> Result<ClassFile> {
        Self::parse_with(bytes, Registry::standard(), &DecoderOptions::default())
    }

    pub fn parse_with(
        bytes: &[u8],
        registry: &Registry,
        options: &DecoderOptions,
    ) -> Result<ClassFile> {
        Parser::new(bytes).parse_class_file(registry, options)
    }

    /// `None` for `java/lang/Object`, the only class without a superclass.
    pub fn super_class(&self) -> Result<Option<&str>> {
        if self.super_class == 0 {
            return Ok(None);
        }

        let ClassInfo { name_index } =
            matches_cp_info!(self.constant_pool, self.super_class, Class)?;

        matches_cp_info!(self.constant_pool, *name_index, Utf8).map(|n| Some(n.as_str()))
    }

    pub fn class_name(&self) -> Result<&str> {
        let ClassInfo { name_index } =
            matches_cp_info!(self.constant_pool, self.this_class, Class)?;

        matches_cp_info!(self.constant_pool, *name_index, Utf8).map(String::as_str)
    }

    pub fn field_name(&self, field: &FieldInfo) -> Result<&str> {
        matches_cp_info!(self.constant_pool, field.name_index, Utf8).map(String::as_str)
    }

    pub fn field_descriptor(&self, field: &FieldInfo) -> Result<&str> {
        matches_cp_info!(self.constant_pool, field.descriptor_index, Utf8).map(String::as_str)
    }

    pub fn method_name(&self, method: &MethodInfo) -> Result<&str> {
        matches_cp_info!(self.constant_pool, method.name_index, Utf8).map(String::as_str)
    }

    pub fn method_descriptor(&self, method: &MethodInfo) -> Result<&str> {
        matches_cp_info!(self.constant_pool, method.descriptor_index, Utf8).map(String::as_str)
    }

    pub fn find_method(&self, name: &str) -> Option<&MethodInfo> {
        self.methods
            .iter()
            .find(|m| self.method_name(m).map_or(false, |n| n == name))
    }
}

#[derive(Debug)]
pub struct FieldInfo {
    pub access_flags: AccessFlags,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Attributes,
}

#[derive(Debug)]
pub struct MethodInfo {
    pub access_flags: AccessFlags,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Attributes,
}
