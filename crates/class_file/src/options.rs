/// Knobs for a single decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderOptions {
    /// How deep `@` and `[` element values may nest before decoding gives up.
    pub max_nesting_depth: usize,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            max_nesting_depth: 128,
        }
    }
}
