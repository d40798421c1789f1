use crate::encoding::DEFAULT_RECURSION_LIMIT;

/// Options to control decoding of messages.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    pub(super) recursion_limit: u32,
    pub(super) retain_unknown_fields: bool,
}

impl DecodeOptions {
    /// Creates a new instance of [`DecodeOptions`], with the default options.
    pub const fn new() -> Self {
        DecodeOptions {
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            retain_unknown_fields: true,
        }
    }

    /// The maximum depth of nested messages and groups.
    ///
    /// Input nested more deeply than this fails to decode with
    /// [`RecursionLimitReached`][crate::encoding::DecodeErrorKind::RecursionLimitReached].
    ///
    /// The default value is `100`.
    pub const fn recursion_limit(mut self, limit: u32) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Whether to keep fields with numbers not declared by the message.
    ///
    /// If `true`, such fields are stored as raw bytes and written back out when the message is
    /// encoded. Otherwise they are consumed and discarded.
    ///
    /// The default value is `true`.
    pub const fn retain_unknown_fields(mut self, yes: bool) -> Self {
        self.retain_unknown_fields = yes;
        self
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions::new()
    }
}
