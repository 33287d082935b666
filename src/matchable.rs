//! Keys that middleware is registered under.
//!
//! A key is either an event name, which may contain glob metacharacters (`*`, `**`, `?`,
//! `[...]`, `{a,b}`), or a regular expression.  Plain names only match themselves.

use regex::Regex;

/// Key matching every event.
pub const WILDCARD: &str = "*";

#[derive(Clone, Debug)]
pub struct Matchable {
    kind: Kind,
}

#[derive(Clone, Debug)]
enum Kind {
    Name { name: String, glob: Option<Regex> },
    Pattern(Regex),
}

impl Matchable {
    pub fn name(name: impl Into<String>) -> Self {
        let name = name.into();
        let glob = if has_glob_syntax(&name) {
            // An unbalanced glob such as `foo{bar` is matched literally instead.
            Regex::new(&glob_to_regex(&name)).ok()
        } else {
            None
        };

        Self {
            kind: Kind::Name { name, glob },
        }
    }

    pub fn pattern(regex: Regex) -> Self {
        Self {
            kind: Kind::Pattern(regex),
        }
    }

    pub fn wildcard() -> Self {
        Self::name(WILDCARD)
    }

    /// The event name, if this key is not a regex.
    pub fn as_name(&self) -> Option<&str> {
        match &self.kind {
            Kind::Name { name, .. } => Some(name),
            Kind::Pattern(_) => None,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_name() == Some(WILDCARD)
    }

    /// Whether this key is literally the event name `event`, as opposed to merely matching it.
    pub fn is(&self, event: &str) -> bool {
        self.as_name() == Some(event)
    }

    pub fn matches(&self, event: &str) -> bool {
        match &self.kind {
            Kind::Name { glob: Some(glob), .. } => glob.is_match(event),
            Kind::Name { name, glob: None } => name == event,
            Kind::Pattern(regex) => regex.is_match(event),
        }
    }
}

impl PartialEq for Matchable {
    fn eq(&self, other: &Self) -> bool {
        match (&self.kind, &other.kind) {
            (Kind::Name { name: a, .. }, Kind::Name { name: b, .. }) => a == b,
            (Kind::Pattern(a), Kind::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl Eq for Matchable {}

impl std::fmt::Display for Matchable {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &self.kind {
            Kind::Name { name, .. } => write!(f, "{}", name),
            Kind::Pattern(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}

impl From<&str> for Matchable {
    fn from(name: &str) -> Self {
        Self::name(name)
    }
}

impl From<String> for Matchable {
    fn from(name: String) -> Self {
        Self::name(name)
    }
}

impl From<&String> for Matchable {
    fn from(name: &String) -> Self {
        Self::name(name.as_str())
    }
}

impl From<Regex> for Matchable {
    fn from(regex: Regex) -> Self {
        Self::pattern(regex)
    }
}

impl From<&Matchable> for Matchable {
    fn from(key: &Matchable) -> Self {
        key.clone()
    }
}

fn has_glob_syntax(name: &str) -> bool {
    name.contains(['*', '?', '[', '{', '\\'])
}

/// Translate a glob into an anchored regex.  Path separators are respected the way shell globs
/// respect them, which lets event namespaces such as `guild/*` be matched one level at a time.
fn glob_to_regex(glob: &str) -> String {
    let mut out = String::from("^");
    let mut chars = glob.chars().peekable();
    let mut open_braces = 0usize;

    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                // A whole `**` segment also matches zero segments.
                if out.ends_with('/') && chars.peek() == Some(&'/') {
                    chars.next();
                    out.pop();
                    out.push_str("(?:/|/.*/)");
                } else if out == "^" && chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("(?:.*/)?");
                } else {
                    out.push_str(".*");
                }
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            '[' => match take_class(&mut chars) {
                Some(class) => out.push_str(&class),
                None => out.push_str(r"\["),
            },
            '{' => {
                open_braces += 1;
                out.push_str("(?:");
            }
            '}' if open_braces > 0 => {
                open_braces -= 1;
                out.push(')');
            }
            ',' if open_braces > 0 => out.push('|'),
            '\\' => match chars.next() {
                Some(escaped) => out.push_str(&regex::escape(escaped.encode_utf8(&mut [0; 4]))),
                None => out.push_str(r"\\"),
            },
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }

    out.push('$');
    out
}

/// Consume a `[...]` character class (the opening bracket already taken).  Returns `None`, leaving
/// the iterator untouched, when the class is never closed.
fn take_class(chars: &mut std::iter::Peekable<std::str::Chars>) -> Option<String> {
    let rest: String = chars.clone().collect();
    let mut body = rest.chars().peekable();
    let mut class = String::from("[");
    let mut consumed = 0usize;

    if let Some(&c) = body.peek() {
        if c == '!' || c == '^' {
            class.push('^');
            body.next();
            consumed += 1;
        }
    }

    let mut first = true;
    loop {
        let c = body.next()?;
        consumed += 1;
        match c {
            ']' if !first => break,
            '\\' | '[' | '&' | '~' | ']' => {
                class.push('\\');
                class.push(c);
            }
            _ => class.push(c),
        }
        first = false;
    }
    class.push(']');

    for _ in 0..consumed {
        chars.next();
    }
    Some(class)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_match_only_themselves() {
        let key = Matchable::from("foo");
        assert!(key.matches("foo"));
        assert!(!key.matches("foobar"));
        assert!(!key.matches("fo"));
    }

    #[test]
    fn wildcard_matches_any_event() {
        let key = Matchable::wildcard();
        assert!(key.is_wildcard());
        for event in ["foo", "bar", "erisa.commands.run", "guild_create"] {
            assert!(key.matches(event), "{event}");
        }
    }

    #[test]
    fn globs() {
        assert!(Matchable::from("f*").matches("foo"));
        assert!(!Matchable::from("f*").matches("bar"));
        assert!(Matchable::from("guild_?reate").matches("guild_create"));
        assert!(Matchable::from("guild_{create,delete}").matches("guild_delete"));
        assert!(!Matchable::from("guild_{create,delete}").matches("guild_update"));
        assert!(Matchable::from("[fb]oo").matches("boo"));
        assert!(!Matchable::from("[!fb]oo").matches("foo"));
        assert!(Matchable::from("erisa.commands.*").matches("erisa.commands.run"));
        assert!(!Matchable::from("a/*").matches("a/b/c"));
        assert!(Matchable::from("a/**").matches("a/b/c"));
    }

    #[test]
    fn escaped_and_unbalanced_globs_are_literal() {
        assert!(Matchable::from(r"foo\*").matches("foo*"));
        assert!(!Matchable::from(r"foo\*").matches("foobar"));
        assert!(Matchable::from("foo{bar").matches("foo{bar"));
        assert!(Matchable::from("[foo").matches("[foo"));
    }

    #[test]
    fn regex_keys() {
        let key = Matchable::from(Regex::new("foo").unwrap());
        assert!(key.matches("foobar"));
        assert!(!key.matches("bar"));
        assert_eq!(key.as_name(), None);
        assert_eq!(key.to_string(), "/foo/");
    }

    #[test]
    fn equality_is_by_source() {
        assert_eq!(Matchable::from("foo"), Matchable::from(String::from("foo")));
        assert_eq!(
            Matchable::from(Regex::new("foo").unwrap()),
            Matchable::from(Regex::new("foo").unwrap())
        );
        assert_ne!(Matchable::from("foo"), Matchable::from(Regex::new("foo").unwrap()));
    }

    #[test]
    fn globstar_segments_may_be_empty() {
        let key = Matchable::from("a/**/b");
        assert!(key.matches("a/b"));
        assert!(key.matches("a/x/b"));
        assert!(key.matches("a/x/y/b"));
        assert!(!key.matches("ab"));
        assert!(!key.matches("a/bc"));

        let leading = Matchable::from("**/b");
        assert!(leading.matches("b"));
        assert!(leading.matches("x/y/b"));
        assert!(!leading.matches("xb"));
    }
}
