use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::env;
use std::fmt;

/// One fragment of a word expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordPart {
    /// Literal text, used verbatim
    Literal(String),
    /// Reference to an environment variable by name (without the `$`)
    Variable(String),
}

impl WordPart {
    /// Resolve this fragment against the current process environment.
    ///
    /// Unset variables resolve to the empty string.
    pub fn resolve(&self) -> Cow<'_, str> {
        match self {
            WordPart::Literal(text) => Cow::Borrowed(text),
            WordPart::Variable(name) => Cow::Owned(
                env::var_os(name)
                    .map(|value| value.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            ),
        }
    }
}

/// A word expression: literal text interleaved with variable references.
///
/// Words are resolved on demand and never cached, so resolving the same word
/// twice may observe different environment state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Word {
    parts: Vec<WordPart>,
}

impl Word {
    pub fn new(parts: Vec<WordPart>) -> Self {
        Self { parts }
    }

    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            parts: vec![WordPart::Literal(text.into())],
        }
    }

    pub fn var(name: impl Into<String>) -> Self {
        Self {
            parts: vec![WordPart::Variable(name.into())],
        }
    }

    /// Append a literal fragment
    pub fn push_literal(mut self, text: impl Into<String>) -> Self {
        self.parts.push(WordPart::Literal(text.into()));
        self
    }

    /// Append a variable reference
    pub fn push_var(mut self, name: impl Into<String>) -> Self {
        self.parts.push(WordPart::Variable(name.into()));
        self
    }

    pub fn parts(&self) -> &[WordPart] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Concatenate all fragments into a single string.
    ///
    /// Returns `None` for a word with no fragments.
    pub fn resolve(&self) -> Option<String> {
        if self.parts.is_empty() {
            return None;
        }
        Some(self.parts.iter().map(WordPart::resolve).collect())
    }
}

impl From<&str> for Word {
    fn from(text: &str) -> Self {
        Word::literal(text)
    }
}

impl From<String> for Word {
    fn from(text: String) -> Self {
        Word::literal(text)
    }
}

fn needs_quoting(text: &str) -> bool {
    text.is_empty()
        || text
            .chars()
            .any(|c| c.is_whitespace() || "|&;<>()$`\\\"'*?".contains(c))
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = self.parts.iter().peekable();
        while let Some(part) = parts.next() {
            match part {
                WordPart::Literal(text) if needs_quoting(text) => {
                    write!(f, "'{}'", text.replace('\'', "'\\''"))?
                }
                WordPart::Literal(text) => f.write_str(text)?,
                WordPart::Variable(name) => {
                    // Braces keep `$A` followed by `B` from reading as `$AB`
                    let glued = matches!(
                        parts.peek(),
                        Some(WordPart::Literal(next))
                            if next.starts_with(|c: char| c.is_alphanumeric() || c == '_')
                    );
                    if glued {
                        write!(f, "${{{}}}", name)?
                    } else {
                        write!(f, "${}", name)?
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_word_resolves_to_none() {
        assert_eq!(Word::default().resolve(), None);
    }

    #[test]
    fn test_literal_resolution() {
        assert_eq!(Word::literal("hello").resolve().as_deref(), Some("hello"));
    }

    #[test]
    fn test_concatenates_fragments() {
        env::set_var("MINISH_WORD_TEST_USER", "alice");
        let word = Word::literal("/home/")
            .push_var("MINISH_WORD_TEST_USER")
            .push_literal("/bin");
        assert_eq!(word.resolve().as_deref(), Some("/home/alice/bin"));
    }

    #[test]
    fn test_unset_variable_is_empty() {
        env::remove_var("MINISH_WORD_TEST_UNSET");
        let word = Word::literal("[")
            .push_var("MINISH_WORD_TEST_UNSET")
            .push_literal("]");
        assert_eq!(word.resolve().as_deref(), Some("[]"));
    }

    #[test]
    fn test_resolution_is_not_cached() {
        let word = Word::var("MINISH_WORD_TEST_CHANGING");
        env::set_var("MINISH_WORD_TEST_CHANGING", "one");
        assert_eq!(word.resolve().as_deref(), Some("one"));
        env::set_var("MINISH_WORD_TEST_CHANGING", "two");
        assert_eq!(word.resolve().as_deref(), Some("two"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Word::literal("plain").to_string(), "plain");
        assert_eq!(Word::literal("two words").to_string(), "'two words'");
        assert_eq!(Word::var("HOME").push_literal("/x").to_string(), "$HOME/x");
        assert_eq!(Word::var("A").push_literal("B").to_string(), "${A}B");
    }

    #[test]
    fn test_serde_shape() {
        let word = Word::literal("a").push_var("B");
        let json = serde_json::to_string(&word).unwrap();
        assert_eq!(json, r#"[{"literal":"a"},{"variable":"B"}]"#);
        let back: Word = serde_json::from_str(&json).unwrap();
        assert_eq!(back, word);
    }
}
