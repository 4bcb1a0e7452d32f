use crate::{parser::Parser, ModuleFlags, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub module_name_index: u16,
    pub module_flags: ModuleFlags,
    /// Zero if the module has no version.
    pub module_version_index: u16,
    pub requires: Vec<Requires>,
    pub exports: Vec<Exports>,
    pub opens: Vec<Opens>,
    pub uses_index: Vec<u16>,
    pub provides: Vec<Provides>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requires {
    pub requires_index: u16,
    pub requires_flags: ModuleFlags,
    pub requires_version_index: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exports {
    pub exports_index: u16,
    pub exports_flags: ModuleFlags,
    /// Empty for an unqualified export.
    pub exports_to_index: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opens {
    pub opens_index: u16,
    pub opens_flags: ModuleFlags,
    pub opens_to_index: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provides {
    pub provides_index: u16,
    pub provides_with_index: Vec<u16>,
}

/// Hashes jlink records for the modules a module was linked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleHashes {
    pub algorithm_index: u16,
    pub hashes: Vec<ModuleHash>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleHash {
    pub module_name_index: u16,
    pub hash: Vec<u8>,
}

impl<'a> Parser<'a> {
    pub fn parse_module(&mut self) -> Result<Module> {
        let module_name_index = self.read_u16()?;
        let module_flags = self.parse_module_flags()?;
        let module_version_index = self.read_u16()?;

        let requires_count = self.read_u16()?;
        let requires = self.parse_vec(requires_count, |p| {
            Ok(Requires {
                requires_index: p.read_u16()?,
                requires_flags: p.parse_module_flags()?,
                requires_version_index: p.read_u16()?,
            })
        })?;

        let exports_count = self.read_u16()?;
        let exports = self.parse_vec(exports_count, |p| {
            Ok(Exports {
                exports_index: p.read_u16()?,
                exports_flags: p.parse_module_flags()?,
                exports_to_index: p.parse_u16_table()?,
            })
        })?;

        let opens_count = self.read_u16()?;
        let opens = self.parse_vec(opens_count, |p| {
            Ok(Opens {
                opens_index: p.read_u16()?,
                opens_flags: p.parse_module_flags()?,
                opens_to_index: p.parse_u16_table()?,
            })
        })?;

        let uses_index = self.parse_u16_table()?;

        let provides_count = self.read_u16()?;
        let provides = self.parse_vec(provides_count, |p| {
            Ok(Provides {
                provides_index: p.read_u16()?,
                provides_with_index: p.parse_u16_table()?,
            })
        })?;

        Ok(Module {
            module_name_index,
            module_flags,
            module_version_index,
            requires,
            exports,
            opens,
            uses_index,
            provides,
        })
    }

    pub fn parse_module_hashes(&mut self) -> Result<ModuleHashes> {
        let algorithm_index = self.read_u16()?;
        let hashes_count = self.read_u16()?;
        let hashes = self.parse_vec(hashes_count, |p| {
            let module_name_index = p.read_u16()?;
            let hash_length = p.read_u16()?;
            let hash = p.read_bytes(hash_length as usize)?;
            Ok(ModuleHash {
                module_name_index,
                hash,
            })
        })?;

        Ok(ModuleHashes {
            algorithm_index,
            hashes,
        })
    }

    fn parse_module_flags(&mut self) -> Result<ModuleFlags> {
        Ok(ModuleFlags::from_bits_truncate(self.read_u16()?))
    }
}

#[cfg(test)]
mod parse_module_tests {
    use super::*;
    use crate::{
        attributes::{test_support::*, AttributeBody},
        ClassFileError,
    };

    #[test]
    fn it_should_decode_a_module_declaration() {
        let symbols = Symbols::with(&[(1, "Module")]);
        #[rustfmt::skip]
        let bytes = [
            0x00, 0x01, 0x00, 0x00, 0x00, 0x2e,
            // name, flags, version
            0x00, 0x02, 0x00, 0x20, 0x00, 0x00,
            // requires java.base mandated
            0x00, 0x01,
            0x00, 0x03, 0x80, 0x00, 0x00, 0x04,
            // exports one package to one module
            0x00, 0x01,
            0x00, 0x05, 0x00, 0x00, 0x00, 0x01, 0x00, 0x06,
            // opens one package to everyone
            0x00, 0x01,
            0x00, 0x07, 0x00, 0x00, 0x00, 0x00,
            // uses
            0x00, 0x01, 0x00, 0x08,
            // provides one service with two implementations
            0x00, 0x01,
            0x00, 0x09, 0x00, 0x02, 0x00, 0x0a, 0x00, 0x0b,
        ];

        let attribute = parse_one(&symbols, &bytes).unwrap();

        assert_eq!(
            attribute.body,
            AttributeBody::Module(Module {
                module_name_index: 2,
                module_flags: ModuleFlags::OPEN,
                module_version_index: 0,
                requires: vec![Requires {
                    requires_index: 3,
                    requires_flags: ModuleFlags::MANDATED,
                    requires_version_index: 4,
                }],
                exports: vec![Exports {
                    exports_index: 5,
                    exports_flags: ModuleFlags::empty(),
                    exports_to_index: vec![6],
                }],
                opens: vec![Opens {
                    opens_index: 7,
                    opens_flags: ModuleFlags::empty(),
                    opens_to_index: vec![],
                }],
                uses_index: vec![8],
                provides: vec![Provides {
                    provides_index: 9,
                    provides_with_index: vec![10, 11],
                }],
            })
        );
    }

    #[test]
    fn it_should_decode_module_hashes() {
        let symbols = Symbols::with(&[(1, "ModuleHashes")]);
        #[rustfmt::skip]
        let bytes = [
            0x00, 0x01, 0x00, 0x00, 0x00, 0x0b,
            0x00, 0x02,
            0x00, 0x01,
            0x00, 0x03, 0x00, 0x03, 0xca, 0xfe, 0x01,
        ];

        assert_eq!(
            parse_one(&symbols, &bytes).unwrap().body,
            AttributeBody::ModuleHashes(ModuleHashes {
                algorithm_index: 2,
                hashes: vec![ModuleHash {
                    module_name_index: 3,
                    hash: vec![0xca, 0xfe, 0x01],
                }],
            })
        );
    }

    #[test]
    fn it_should_fail_on_a_hash_longer_than_the_input() {
        let symbols = Symbols::with(&[(1, "ModuleHashes")]);
        #[rustfmt::skip]
        let bytes = [
            0x00, 0x01, 0x00, 0x00, 0x00, 0x09,
            0x00, 0x02,
            0x00, 0x01,
            0x00, 0x03, 0x00, 0x10, 0xca,
        ];

        let err = parse_one(&symbols, &bytes).unwrap_err();
        assert!(matches!(err, ClassFileError::InAttribute { offset: 6, .. }));
        assert!(matches!(
            err.root_cause(),
            ClassFileError::TruncatedInput {
                offset: 14,
                needed: 16,
                available: 1,
            }
        ));
    }

    #[test]
    fn it_should_decode_module_packages_and_main_class() {
        let symbols = Symbols::with(&[(1, "ModulePackages"), (2, "ModuleMainClass")]);

        let attribute = parse_one(
            &symbols,
            &[0x00, 0x01, 0, 0, 0, 6, 0x00, 0x02, 0x00, 0x0c, 0x00, 0x0d],
        )
        .unwrap();
        assert_eq!(attribute.body, AttributeBody::ModulePackages(vec![12, 13]));

        let attribute = parse_one(&symbols, &[0x00, 0x02, 0, 0, 0, 2, 0x00, 0x0e]).unwrap();
        assert_eq!(
            attribute.body,
            AttributeBody::ModuleMainClass {
                main_class_index: 14
            }
        );
    }
}
