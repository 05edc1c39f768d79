use super::types::{ParsedCommand, Redirected};
use crate::error::ShellError;

/// Pull `<` and `>` targets out of a token sequence.
///
/// Operators may appear in any order and be interleaved with ordinary
/// arguments. A later operator of the same kind overrides an earlier one.
/// An operator with nothing after it is a syntax error.
pub fn parse_redirections(tokens: Vec<String>) -> Result<Redirected, ShellError> {
    let mut out = Redirected::default();
    let mut iter = tokens.into_iter();

    while let Some(token) = iter.next() {
        match token.as_str() {
            ">" => {
                let target = iter.next().ok_or_else(|| {
                    ShellError::Syntax("missing file for output redirection".into())
                })?;
                out.output_file = Some(target);
            }
            "<" => {
                let target = iter.next().ok_or_else(|| {
                    ShellError::Syntax("missing file for input redirection".into())
                })?;
                out.input_file = Some(target);
            }
            _ => out.argv.push(token),
        }
    }

    Ok(out)
}

/// Build a [`ParsedCommand`] from a tokenized line: redirection first, then a
/// trailing background marker is stripped from the residual argv.
pub fn parse_command(tokens: Vec<String>, background_marker: &str) -> Result<ParsedCommand, ShellError> {
    let Redirected {
        mut argv,
        input_file,
        output_file,
    } = parse_redirections(tokens)?;

    let background = argv.last().is_some_and(|t| t == background_marker);
    if background {
        argv.pop();
    }

    Ok(ParsedCommand {
        argv,
        input_file,
        output_file,
        background,
    })
}
