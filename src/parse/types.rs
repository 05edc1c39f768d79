//! Types produced by the parse layer and consumed by the exec layer.

/// Residual argument vector plus the redirection targets pulled out of it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Redirected {
    pub argv: Vec<String>,
    /// Target of `<`, if any.
    pub input_file: Option<String>,
    /// Target of `>`, if any.
    pub output_file: Option<String>,
}

/// A single command ready for the process supervisor.
///
/// `argv[0]` is the executable name. An empty `argv` is legal here and means
/// "nothing to run"; the supervisor never creates a process for it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedCommand {
    pub argv: Vec<String>,
    pub input_file: Option<String>,
    pub output_file: Option<String>,
    /// Set when the line ended with the background marker.
    pub background: bool,
}

impl ParsedCommand {
    /// A foreground command with no redirection.
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }
}

/// Two commands joined by one pipe: `stage_a`'s stdout feeds `stage_b`'s stdin.
///
/// Stages are bare argument vectors; redirection and background markers are
/// not interpreted inside a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSpec {
    pub stage_a: Vec<String>,
    pub stage_b: Vec<String>,
}

impl PipelineSpec {
    /// Stages in data-flow order.
    pub fn stages(&self) -> [&[String]; 2] {
        [&self.stage_a, &self.stage_b]
    }
}
