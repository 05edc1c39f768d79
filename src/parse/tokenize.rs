/// Split a line into words on whitespace.
///
/// A word that opens with `"` runs to the next `"` and may hold whitespace.
/// Any other word is a run of non-whitespace, with inner quotes kept
/// literally, so `a"b c"` splits into `a"b` and `c"`. A closed quoted span
/// ends its word even when more text follows. An opening quote with no
/// partner runs to end of line. Quote characters are preserved in the output.
pub fn split_words(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut rest = line.trim_start();

    while !rest.is_empty() {
        let end = if let Some(body) = rest.strip_prefix('"') {
            match body.find('"') {
                Some(close) => close + 2,
                None => rest.len(),
            }
        } else {
            rest.find(char::is_whitespace).unwrap_or(rest.len())
        };
        words.push(rest[..end].to_string());
        rest = rest[end..].trim_start();
    }
    words
}

/// Remove leading and trailing double quotes from a word.
pub fn strip_quotes(word: &str) -> String {
    word.trim_matches('"').to_string()
}

/// Quote-aware tokenization followed by quote stripping.
pub fn tokenize(line: &str) -> Vec<String> {
    split_words(line).iter().map(|w| strip_quotes(w)).collect()
}

/// Render an argument vector as shell text for log lines.
pub fn render_argv(argv: &[String]) -> String {
    shlex::try_join(argv.iter().map(String::as_str)).unwrap_or_else(|_| argv.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_simple() {
        assert_eq!(tokenize("ls -la /tmp"), vec!["ls", "-la", "/tmp"]);
    }

    #[test]
    fn tokenize_double_quoted() {
        assert_eq!(
            tokenize("echo \"hello world\""),
            vec!["echo", "hello world"]
        );
    }

    #[test]
    fn tokenize_collapses_runs_of_whitespace() {
        assert_eq!(tokenize("  echo   a\tb  "), vec!["echo", "a", "b"]);
    }

    #[test]
    fn tokenize_empty_line() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn tokenize_single_quotes_are_literal() {
        assert_eq!(tokenize("echo it's"), vec!["echo", "it's"]);
    }

    #[test]
    fn tokenize_quote_inside_word_is_literal() {
        assert_eq!(
            tokenize("grep --label=\"a b\" file"),
            vec!["grep", "--label=\"a", "b", "file"]
        );
        assert_eq!(tokenize("echo a\"b\"c"), vec!["echo", "a\"b\"c"]);
    }

    #[test]
    fn tokenize_adjacent_quoted_spans_are_separate_words() {
        assert_eq!(tokenize("echo \"a\"\"b\""), vec!["echo", "a", "b"]);
        assert_eq!(tokenize("echo \"a\"b"), vec!["echo", "a", "b"]);
    }

    #[test]
    fn strip_quotes_trims_only_the_ends() {
        assert_eq!(strip_quotes("\"a\"b\""), "a\"b");
        assert_eq!(strip_quotes("--label=\"a"), "--label=\"a");
    }

    #[test]
    fn tokenize_unbalanced_quote_runs_to_end() {
        assert_eq!(
            tokenize("echo \"unterminated run here"),
            vec!["echo", "unterminated run here"]
        );
    }

    #[test]
    fn tokenize_empty_quotes_yield_empty_word() {
        assert_eq!(tokenize("printf \"\""), vec!["printf", ""]);
    }

    #[test]
    fn split_words_keeps_quotes() {
        assert_eq!(
            split_words("grep \"test\" file.txt"),
            vec!["grep", "\"test\"", "file.txt"]
        );
    }

    #[test]
    fn render_argv_quotes_spaces() {
        let argv = vec!["echo".to_string(), "a b".to_string()];
        assert_eq!(render_argv(&argv), "echo 'a b'");
    }
}
