pub mod expand;
pub mod pipeline;
pub mod redirect;
pub mod tokenize;
pub mod types;

pub use expand::expand_variables;
pub use pipeline::{PIPE, split_pipeline};
pub use redirect::{parse_command, parse_redirections};
pub use tokenize::{render_argv, split_words, strip_quotes, tokenize};
pub use types::{ParsedCommand, PipelineSpec, Redirected};
