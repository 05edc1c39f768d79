use super::tokenize::tokenize;
use super::types::PipelineSpec;
use crate::error::ShellError;

/// The pipe delimiter.
pub const PIPE: char = '|';

/// Split a line at pipe delimiters outside quoted words.
///
/// Quoted words follow the tokenizer: only a `"` that opens a word starts a
/// quoted span, and an opening quote with no partner runs to end of line.
/// Returns the raw text of each side, untrimmed.
fn split_on_pipes(line: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut word_start = true;
    let mut chars = line.char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            '"' if word_start => {
                if !line[i + 1..].contains('"') {
                    break;
                }
                for (_, c) in chars.by_ref() {
                    if c == '"' {
                        break;
                    }
                }
            }
            PIPE => {
                parts.push(&line[start..i]);
                start = i + c.len_utf8();
                word_start = true;
            }
            c if c.is_whitespace() => word_start = true,
            _ => word_start = false,
        }
    }
    parts.push(&line[start..]);
    parts
}

/// Detect and split a two-stage pipeline.
///
/// Returns `None` when the line has no pipe delimiter outside quotes. Each
/// side is tokenized and quote-stripped on its own. A missing side or a
/// second delimiter is a syntax error.
///
/// Not every `|` character makes a pipeline. A `|` inside a quoted word is
/// an ordinary argument character, so `echo "a|b"` runs as one command. A
/// line with three or more stages is rejected as a whole instead of being
/// split at its first `|`.
pub fn split_pipeline(line: &str) -> Option<Result<PipelineSpec, ShellError>> {
    let parts = split_on_pipes(line);
    if parts.len() < 2 {
        return None;
    }
    if parts.len() > 2 {
        return Some(Err(ShellError::Syntax(format!(
            "only two-stage pipelines are supported ({} stages given)",
            parts.len()
        ))));
    }

    let stage_a = tokenize(parts[0]);
    let stage_b = tokenize(parts[1]);
    if stage_a.is_empty() || stage_b.is_empty() {
        return Some(Err(ShellError::Syntax(
            "missing command on one side of '|'".into(),
        )));
    }

    Some(Ok(PipelineSpec { stage_a, stage_b }))
}
