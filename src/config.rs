use std::path::PathBuf;

/// Evaluator settings. The CLI fills these from flags; embedders usually
/// start from [`Config::default`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Nested evaluation ceiling before a stack-overflow runtime error.
    pub max_depth: usize,
    /// Global function invoked after the top-level statements, if defined.
    pub entry_point: String,
    /// Directory that relative `取り込む` paths resolve against.
    pub module_root: PathBuf,
    /// Print `表示` output as it happens instead of buffering it.
    pub stream_output: bool,
}

pub const DEFAULT_MAX_DEPTH: usize = 10_000;
pub const DEFAULT_ENTRY_POINT: &str = "主";

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
            module_root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            stream_output: false,
        }
    }
}

impl Config {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = entry_point.into();
        self
    }

    pub fn with_module_root(mut self, module_root: impl Into<PathBuf>) -> Self {
        self.module_root = module_root.into();
        self
    }

    pub fn streaming(mut self, stream_output: bool) -> Self {
        self.stream_output = stream_output;
        self
    }
}
