//! Tokenizer for IPPcode23 source text.

/// A single token from a source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    /// A word starting with `.`, e.g. the `.IPPcode23` header.
    Directive(&'a str),
    /// `prefix@body`: a variable (`GF@x`) or a literal (`int@5`).
    Prefixed {
        text: &'a str,
        prefix: &'a str,
        body: &'a str,
    },
    /// Anything else: opcode mnemonics, label names, type names.
    Word(&'a str),
}

/// Tokenize a single line of source text.
///
/// Returns an empty Vec for blank lines and comment-only lines.
/// Comments start with `#` and extend to end of line. Tokens are split on
/// ASCII whitespace only; string literals escape it as `\DDD`.
pub(crate) fn tokenize_line(line: &str) -> Vec<Token<'_>> {
    // Strip comment
    let line = match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    };

    line.split_ascii_whitespace()
        .map(|word| {
            if word.starts_with('.') {
                Token::Directive(word)
            } else if let Some((prefix, body)) = word.split_once('@') {
                Token::Prefixed {
                    text: word,
                    prefix,
                    body,
                }
            } else {
                Token::Word(word)
            }
        })
        .collect()
}
