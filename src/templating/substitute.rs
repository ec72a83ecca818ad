//! Placeholder substitution.
//!
//! Placeholders are `@KEY@` tokens. All configured keys are replaced in one left-to-right
//! scan over the text, so a value that itself contains `@OTHER@` is emitted verbatim and
//! never substituted again. Tokens whose key is not configured are left untouched.

use std::borrow::Cow;
use std::collections::BTreeMap;

use regex::{Captures, Regex};

/// A compiled set of placeholder replacements.
#[derive(Debug, Clone)]
pub struct Substitution<'a> {
    pattern: Option<Regex>,
    variables: &'a BTreeMap<String, String>,
}

impl<'a> Substitution<'a> {
    /// Compile a matcher for every non-empty key in `variables`.
    pub fn new(variables: &'a BTreeMap<String, String>) -> Result<Self, regex::Error> {
        let alternation = variables
            .keys()
            .filter(|key| !key.is_empty())
            .map(|key| regex::escape(key))
            .collect::<Vec<_>>()
            .join("|");

        let pattern = if alternation.is_empty() {
            None
        } else {
            Some(Regex::new(&format!("@({alternation})@"))?)
        };

        Ok(Self {
            pattern,
            variables,
        })
    }

    /// Replace every placeholder in `text`.
    ///
    /// Borrows the input unchanged when it contains no known placeholder.
    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        match &self.pattern {
            Some(pattern) => pattern.replace_all(text, |caps: &Captures<'_>| {
                self.variables.get(&caps[1]).cloned().unwrap_or_else(|| caps[0].to_string())
            }),
            None => Cow::Borrowed(text),
        }
    }
}

/// Substitute `variables` into `text` in one pass.
pub fn substitute(text: &str, variables: &BTreeMap<String, String>) -> Result<String, regex::Error> {
    Ok(Substitution::new(variables)?.apply(text).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    #[test]
    fn test_basic_substitution() {
        let vars = vars(&[("NAME", "foo"), ("VER", "1.0")]);
        assert_eq!(substitute("@NAME@-@VER@", &vars).unwrap(), "foo-1.0");
    }

    #[test]
    fn test_every_occurrence_is_replaced() {
        let vars = vars(&[("NAME", "foo")]);
        assert_eq!(
            substitute("PKGNAME=@NAME@\nPKGDES=\"@NAME@ for @NAME@\"\n", &vars).unwrap(),
            "PKGNAME=foo\nPKGDES=\"foo for foo\"\n"
        );
    }

    #[test]
    fn test_substituted_text_is_not_rescanned() {
        let vars = vars(&[("NAME", "@VER@"), ("VER", "1.0")]);
        assert_eq!(substitute("@NAME@ @VER@", &vars).unwrap(), "@VER@ 1.0");
    }

    #[test]
    fn test_unknown_placeholders_are_untouched() {
        let vars = vars(&[("NAME", "foo")]);
        assert_eq!(substitute("@UNKNOWN@ user@example.org", &vars).unwrap(), "@UNKNOWN@ user@example.org");
    }

    #[test]
    fn test_adjacent_unknown_token_does_not_swallow_delimiter() {
        let vars = vars(&[("NAME", "foo")]);
        assert_eq!(substitute("x@FOO@NAME@", &vars).unwrap(), "x@FOOfoo");
    }

    #[test]
    fn test_prefix_keys() {
        let vars = vars(&[("VER", "1.0"), ("VERSION_SUFFIX", "~rc1")]);
        assert_eq!(substitute("@VER@@VERSION_SUFFIX@", &vars).unwrap(), "1.0~rc1");
    }

    #[test]
    fn test_regex_metacharacters_in_values_and_keys() {
        let vars = vars(&[("A.B", "$1 \\d"), ("DEPS", "a+b c*")]);
        assert_eq!(substitute("@A.B@ @AxB@ @DEPS@", &vars).unwrap(), "$1 \\d @AxB@ a+b c*");
    }

    #[test]
    fn test_empty_variables_borrow_input() {
        let empty = BTreeMap::new();
        let substitution = Substitution::new(&empty).unwrap();
        assert!(matches!(substitution.apply("@NAME@"), Cow::Borrowed("@NAME@")));
    }
}
