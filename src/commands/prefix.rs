use regex::Regex;

/// What a message has to start with to be treated as a command.
#[derive(Clone, Debug)]
pub enum Prefix {
    Literal(String),
    /// The command text is the first capture group, or everything after the match without one.
    Pattern(Regex),
}

impl Prefix {
    /// The command text of `content`, if it carries this prefix and something follows it.
    pub fn strip<'a>(&self, content: &'a str) -> Option<&'a str> {
        let rest = match self {
            Prefix::Literal(prefix) => content.strip_prefix(prefix.as_str())?,
            Prefix::Pattern(regex) => {
                let captures = regex.captures(content)?;
                match captures.get(1) {
                    Some(group) => group.as_str(),
                    None => &content[captures.get(0)?.end()..],
                }
            }
        };

        let rest = rest.trim();
        (!rest.is_empty()).then_some(rest)
    }
}

impl PartialEq for Prefix {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Prefix::Literal(a), Prefix::Literal(b)) => a == b,
            (Prefix::Pattern(a), Prefix::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl From<&str> for Prefix {
    fn from(prefix: &str) -> Self {
        Prefix::Literal(prefix.to_owned())
    }
}

impl From<String> for Prefix {
    fn from(prefix: String) -> Self {
        Prefix::Literal(prefix)
    }
}

impl From<Regex> for Prefix {
    fn from(regex: Regex) -> Self {
        Prefix::Pattern(regex)
    }
}

/// Command text after the first matching prefix.
pub fn test_prefix<'a>(prefixes: &[Prefix], content: &'a str) -> Option<&'a str> {
    prefixes.iter().find_map(|prefix| prefix.strip(content))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefixes() -> Vec<Prefix> {
        vec![
            "!".into(),
            "?".into(),
            Regex::new("^foo (.+)").unwrap().into(),
        ]
    }

    #[test]
    fn rejects_unprefixed_text() {
        let prefixes = prefixes();
        for content in ["foo", "foobar", "foo!", "foo?", "!", "?   "] {
            assert_eq!(test_prefix(&prefixes, content), None, "{content}");
        }
    }

    #[test]
    fn strips_the_prefix() {
        let prefixes = prefixes();
        assert_eq!(test_prefix(&prefixes, "foo bar"), Some("bar"));
        assert_eq!(test_prefix(&prefixes, "!foo"), Some("foo"));
        assert_eq!(test_prefix(&prefixes, "?foo"), Some("foo"));
        assert_eq!(
            test_prefix(&prefixes, "!foo bar some other stuff"),
            Some("foo bar some other stuff")
        );
        assert_eq!(
            test_prefix(&prefixes, "?foo bar some other stuff"),
            Some("foo bar some other stuff")
        );
    }

    #[test]
    fn patterns_without_groups_use_the_remainder() {
        let prefix = Prefix::from(Regex::new(r"^<@!?\d+>").unwrap());
        assert_eq!(prefix.strip("<@!1234> help me"), Some("help me"));
        assert_eq!(prefix.strip("<@1234>"), None);
    }
}
