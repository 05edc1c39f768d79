use crate::env::Environment;

/// Substitute `$NAME` words with their environment values.
///
/// Works on plain whitespace-separated words, before quote-aware
/// tokenization: a whole word starting with `$` is replaced when `NAME` is
/// bound and left untouched (sigil included) when it is not. The result is
/// rejoined with single spaces, so runs of whitespace collapse even inside
/// what will later be a quoted span.
pub fn expand_variables(line: &str, env: &Environment) -> String {
    line.split_whitespace()
        .map(|word| match word.strip_prefix('$') {
            Some(name) => env.get(name).unwrap_or(word),
            None => word,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> Environment {
        Environment::from_pairs([("FOO", "bar"), ("GREETING", "hello there")])
    }

    #[test]
    fn bound_variable_is_replaced() {
        assert_eq!(expand_variables("echo $FOO", &env()), "echo bar");
    }

    #[test]
    fn unbound_variable_keeps_sigil() {
        assert_eq!(expand_variables("echo $NOPE", &env()), "echo $NOPE");
    }

    #[test]
    fn bare_sigil_is_unchanged() {
        assert_eq!(expand_variables("echo $", &env()), "echo $");
    }

    #[test]
    fn only_whole_words_expand() {
        assert_eq!(
            expand_variables("echo pre$FOO $FOO/x", &env()),
            "echo pre$FOO $FOO/x"
        );
    }

    #[test]
    fn value_with_spaces_is_spliced_in() {
        assert_eq!(
            expand_variables("echo $GREETING", &env()),
            "echo hello there"
        );
    }

    #[test]
    fn word_inside_quotes_still_expands() {
        assert_eq!(
            expand_variables("echo \" $FOO \"", &env()),
            "echo \" bar \""
        );
    }

    #[test]
    fn whitespace_is_normalized() {
        assert_eq!(expand_variables("  ls   -l  ", &env()), "ls -l");
    }
}
