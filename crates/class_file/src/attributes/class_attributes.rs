use crate::{parser::Parser, AccessFlags, Result};

use super::{Attributes, DecodeContext};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerClass {
    pub inner_class_info_index: u16,
    /// Zero for top-level, local and anonymous classes.
    pub outer_class_info_index: u16,
    /// Zero for anonymous classes.
    pub inner_name_index: u16,
    pub inner_class_access_flags: AccessFlags,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapMethod {
    pub bootstrap_method_ref: u16,
    pub bootstrap_arguments: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodParameter {
    pub name_index: u16,
    pub access_flags: AccessFlags,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordComponent {
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Attributes,
}

impl<'a> Parser<'a> {
    pub fn parse_inner_classes(&mut self) -> Result<Vec<InnerClass>> {
        let number_of_classes = self.read_u16()?;
        self.parse_vec(number_of_classes, |p| {
            Ok(InnerClass {
                inner_class_info_index: p.read_u16()?,
                outer_class_info_index: p.read_u16()?,
                inner_name_index: p.read_u16()?,
                inner_class_access_flags: AccessFlags::from_bits_truncate(p.read_u16()?),
            })
        })
    }

    pub fn parse_bootstrap_methods(&mut self) -> Result<Vec<BootstrapMethod>> {
        let num_bootstrap_methods = self.read_u16()?;
        self.parse_vec(num_bootstrap_methods, |p| {
            Ok(BootstrapMethod {
                bootstrap_method_ref: p.read_u16()?,
                bootstrap_arguments: p.parse_u16_table()?,
            })
        })
    }

    pub fn parse_method_parameters(&mut self) -> Result<Vec<MethodParameter>> {
        let parameters_count = self.read_u8()?;
        self.parse_vec(parameters_count, |p| {
            Ok(MethodParameter {
                name_index: p.read_u16()?,
                access_flags: AccessFlags::from_bits_truncate(p.read_u16()?),
            })
        })
    }

    pub fn parse_record_components(
        &mut self,
        cx: &DecodeContext<'_>,
    ) -> Result<Vec<RecordComponent>> {
        let components_count = self.read_u16()?;
        self.parse_vec(components_count, |p| {
            let name_index = p.read_u16()?;
            let descriptor_index = p.read_u16()?;
            let attributes = p.parse_attributes(&cx.nested(p.position())?)?;
            Ok(RecordComponent {
                name_index,
                descriptor_index,
                attributes,
            })
        })
    }
}
