//! Splitting a command invocation into its name and arguments

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedArgs {
    /// Everything before the first space
    pub cmd: String,
    /// The suffix split on whitespace, with quoted groups kept together and unquoted
    pub args: Vec<String>,
    /// Everything after the first space, trimmed
    pub suffix: String,
}

/// Parse `text` (the message content with its prefix already removed).
///
/// Both `"double"` and `'single'` quotes group words.  A quote only opens a group at the start of
/// a word and when it is closed later on, so apostrophes such as in `I'm` stay literal.
pub fn parse_args(text: &str) -> ParsedArgs {
    let (cmd, rest) = text.split_once(' ').unwrap_or((text, ""));
    let suffix = rest.trim();

    ParsedArgs {
        cmd: cmd.to_owned(),
        args: split_args(suffix),
        suffix: suffix.to_owned(),
    }
}

fn split_args(text: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut rest = text.trim_start();

    while let Some(first) = rest.chars().next() {
        if first == '"' || first == '\'' {
            if let Some(len) = rest[1..].find(first) {
                let group = &rest[1..1 + len];
                if !group.trim().is_empty() {
                    args.push(group.to_owned());
                }
                rest = rest[len + 2..].trim_start();
                continue;
            }
        }

        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        args.push(rest[..end].to_owned());
        rest = rest[end..].trim_start();
    }

    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_along_spaces() {
        let parsed = parse_args("foo bar foobar fazbaz");

        assert_eq!(parsed.cmd, "foo");
        assert_eq!(parsed.args, vec!["bar", "foobar", "fazbaz"]);
        assert_eq!(parsed.suffix, "bar foobar fazbaz");
    }

    #[test]
    fn groups_quotes_and_keeps_apostrophes() {
        let text = r#"foo bar "foobar fazbaz" lorem 'ipsum' I'm running out of things to write here."#;
        let parsed = parse_args(text);

        assert_eq!(parsed.cmd, "foo");
        assert_eq!(
            parsed.args,
            vec![
                "bar",
                "foobar fazbaz",
                "lorem",
                "ipsum",
                "I'm",
                "running",
                "out",
                "of",
                "things",
                "to",
                "write",
                "here."
            ]
        );
        assert_eq!(
            parsed.suffix,
            r#"bar "foobar fazbaz" lorem 'ipsum' I'm running out of things to write here."#
        );
    }

    #[test]
    fn command_without_arguments() {
        let parsed = parse_args("help");

        assert_eq!(parsed.cmd, "help");
        assert!(parsed.args.is_empty());
        assert_eq!(parsed.suffix, "");
    }

    #[test]
    fn blank_groups_and_extra_whitespace_are_dropped() {
        let parsed = parse_args(r#"say   ""   hi    there "#);

        assert_eq!(parsed.args, vec!["hi", "there"]);
        assert_eq!(parsed.suffix, r#"""   hi    there"#);
    }

    #[test]
    fn unterminated_quotes_are_literal() {
        let parsed = parse_args(r#"say "hello world"#);
        assert_eq!(parsed.args, vec![r#""hello"#, "world"]);
    }
}
