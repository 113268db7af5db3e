#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indent {
    Spaces(usize),
}

impl Indent {
    pub fn spaces(count: usize) -> Self {
        Indent::Spaces(count)
    }

    pub fn get_spaces(self) -> usize {
        let Indent::Spaces(count) = self;
        count
    }
}

impl Default for Indent {
    fn default() -> Self {
        Indent::Spaces(crate::constants::DEFAULT_INDENT)
    }
}

/// TOML language revision accepted by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum TomlVersion {
    V1_0,
    #[default]
    V1_1,
}

#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub version: TomlVersion,
    /// Accept the bare `null` keyword as a value.
    pub allow_null: bool,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(mut self, version: TomlVersion) -> Self {
        self.version = version;
        self
    }

    pub fn with_allow_null(mut self, allow_null: bool) -> Self {
        self.allow_null = allow_null;
        self
    }

    pub(crate) fn is_v1_1(&self) -> bool {
        self.version >= TomlVersion::V1_1
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            version: TomlVersion::default(),
            allow_null: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FormatOptions {
    pub indent: Indent,
}

impl FormatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_indent(mut self, indent: Indent) -> Self {
        self.indent = indent;
        self
    }
}
