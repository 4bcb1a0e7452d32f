use crate::{parser::Parser, Result};

use super::{Attributes, DecodeContext};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionTableEntry {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    pub catch_type: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub exception_table: Vec<ExceptionTableEntry>,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineNumber {
    pub start_pc: u16,
    pub line_number: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalVariable {
    pub start_pc: u16,
    pub length: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub index: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalVariableType {
    pub start_pc: u16,
    pub length: u16,
    pub name_index: u16,
    pub signature_index: u16,
    pub index: u16,
}

impl<'a> Parser<'a> {
    pub fn parse_code_attribute(&mut self, cx: &DecodeContext<'_>) -> Result<CodeAttribute> {
        let max_stack = self.read_u16()?;
        let max_locals = self.read_u16()?;
        let code_length = self.read_u32()?;
        let code = self.read_bytes(code_length as usize)?;
        let exception_table_length = self.read_u16()?;
        let exception_table =
            self.parse_vec(exception_table_length, Self::parse_exception_table_entry)?;
        let attributes = self.parse_attributes(&cx.nested(self.position())?)?;

        Ok(CodeAttribute {
            max_stack,
            max_locals,
            code,
            exception_table,
            attributes,
        })
    }

    fn parse_exception_table_entry(&mut self) -> Result<ExceptionTableEntry> {
        let start_pc = self.read_u16()?;
        let end_pc = self.read_u16()?;
        let handler_pc = self.read_u16()?;
        let catch_type = self.read_u16()?;

        Ok(ExceptionTableEntry {
            start_pc,
            end_pc,
            handler_pc,
            catch_type,
        })
    }

    pub fn parse_line_number_table(&mut self) -> Result<Vec<LineNumber>> {
        let line_number_table_length = self.read_u16()?;
        self.parse_vec(line_number_table_length, |p| {
            Ok(LineNumber {
                start_pc: p.read_u16()?,
                line_number: p.read_u16()?,
            })
        })
    }

    pub fn parse_local_variable_table(&mut self) -> Result<Vec<LocalVariable>> {
        let local_variable_table_length = self.read_u16()?;
        self.parse_vec(local_variable_table_length, |p| {
            Ok(LocalVariable {
                start_pc: p.read_u16()?,
                length: p.read_u16()?,
                name_index: p.read_u16()?,
                descriptor_index: p.read_u16()?,
                index: p.read_u16()?,
            })
        })
    }

    pub fn parse_local_variable_type_table(&mut self) -> Result<Vec<LocalVariableType>> {
        let local_variable_type_table_length = self.read_u16()?;
        self.parse_vec(local_variable_type_table_length, |p| {
            Ok(LocalVariableType {
                start_pc: p.read_u16()?,
                length: p.read_u16()?,
                name_index: p.read_u16()?,
                signature_index: p.read_u16()?,
                index: p.read_u16()?,
            })
        })
    }
}
