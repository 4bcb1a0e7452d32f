use crate::Result;

/// Read-only view of the symbol table an attribute tree refers into.
///
/// Decoders only ever hold indices; names are resolved once, by the attribute
/// dispatcher, before a decoder is selected.
pub trait SymbolLookup {
    /// Resolves `index` to a UTF-8 name. Required for attribute dispatch.
    fn resolve_name(&self, index: u16) -> Result<&str>;

    /// Human readable description of the entry at `index`. Cosmetic only.
    fn describe(&self, index: u16) -> String;
}
