//! Splitting long replies into pages that fit in a Discord message

/// Discord's message length limit
pub const MESSAGE_LIMIT: usize = 2000;

const CODE_BLOCK: &str = "```";

/// Collects lines and packs them into code-block pages.
///
/// Lengths are measured in bytes, which never undercounts Discord's character limit.
#[derive(Clone, Debug)]
pub struct Paginator {
    prefix: String,
    suffix: String,
    max_length: usize,
    lines: Vec<String>,
}

impl Paginator {
    pub fn new() -> Self {
        Self::with(CODE_BLOCK, CODE_BLOCK, MESSAGE_LIMIT)
    }

    /// A paginator opening each page with `prefix`, e.g. "```yaml\n".
    pub fn with_prefix(prefix: &str) -> Self {
        Self::with(prefix, CODE_BLOCK, MESSAGE_LIMIT)
    }

    /// `limit` must exceed the suffix length.  A prefix leaving no room for content falls back
    /// to a bare code block opener, or to nothing when even that doesn't fit.
    pub fn with(prefix: &str, suffix: &str, limit: usize) -> Self {
        let max_length = limit.saturating_sub(suffix.len());
        // At least one byte of content and its newline
        let fits = |prefix: &str| prefix.len() + 2 <= max_length;
        let prefix = [prefix, CODE_BLOCK]
            .into_iter()
            .find(|prefix| fits(prefix))
            .unwrap_or("");

        Self {
            prefix: prefix.to_owned(),
            suffix: suffix.to_owned(),
            max_length,
            lines: Vec::new(),
        }
    }

    /// Page length limit, excluding the suffix
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn add_line(&mut self, line: impl Into<String>, empty_after: bool) {
        self.lines.push(line.into());
        if empty_after {
            self.lines.push(String::new());
        }
    }

    pub fn add_lines<I>(&mut self, lines: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.lines.extend(lines.into_iter().map(Into::into));
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// The collected lines packed into pages.  Lines too long for any page are hard-split.
    pub fn pages(&self) -> Vec<String> {
        // Room for one line on an otherwise empty page, newline included.
        let room = self
            .max_length
            .saturating_sub(self.prefix.len() + 1)
            .max(1);

        let mut pages = Vec::new();
        let mut page = self.prefix.clone();

        for line in &self.lines {
            for chunk in split_at_most(line, room) {
                if page.len() + chunk.len() + 1 > self.max_length && page.len() > self.prefix.len() {
                    page.push_str(&self.suffix);
                    pages.push(std::mem::replace(&mut page, self.prefix.clone()));
                }
                page.push_str(chunk);
                page.push('\n');
            }
        }

        if !self.lines.is_empty() {
            page.push_str(&self.suffix);
            pages.push(page);
        }

        pages
    }
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new()
    }
}

/// Split `line` into pieces of at most `max` bytes, on character boundaries.  An empty line
/// stays one empty piece.
fn split_at_most(line: &str, max: usize) -> Vec<&str> {
    if line.len() <= max {
        return vec![line];
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    while start < line.len() {
        let mut end = (start + max).min(line.len());
        while !line.is_char_boundary(end) {
            end -= 1;
        }
        if end == start {
            // A single character wider than `max`; emit it whole.
            end = start + line[start..].chars().next().map_or(1, char::len_utf8);
        }
        pieces.push(&line[start..end]);
        start = end;
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_length_leaves_room_for_the_suffix() {
        assert_eq!(Paginator::new().max_length(), 1997);
        assert_eq!(Paginator::with("```", "```", 1000).max_length(), 997);
        assert_eq!(
            Paginator::with("```", "big ending", MESSAGE_LIMIT).max_length(),
            2000 - "big ending".len()
        );
        assert_eq!(
            Paginator::with("```", "big ending", 1000).max_length(),
            1000 - "big ending".len()
        );
    }

    #[test]
    fn add_line() {
        let mut paginator = Paginator::new();
        paginator.add_line("foo", false);
        paginator.add_line("bar", false);
        assert_eq!(paginator.lines(), ["foo", "bar"]);

        paginator.clear();
        paginator.add_line("foo", true);
        assert_eq!(paginator.lines(), ["foo", ""]);
    }

    #[test]
    fn add_lines() {
        let mut paginator = Paginator::new();
        paginator.add_lines(["foo"]);
        paginator.add_lines(vec!["bar".to_owned(), "baz".to_owned()]);
        assert_eq!(paginator.lines(), ["foo", "bar", "baz"]);

        paginator.clear();
        assert!(paginator.lines().is_empty());
    }

    #[test]
    fn short_content_is_one_page() {
        let mut paginator = Paginator::with_prefix("```yaml\n");
        paginator.add_lines(["foo", "bar"]);

        assert_eq!(paginator.pages(), vec!["```yaml\nfoo\nbar\n```"]);
    }

    #[test]
    fn no_lines_no_pages() {
        assert!(Paginator::new().pages().is_empty());
    }

    #[test]
    fn pages_never_exceed_the_limit() {
        let mut paginator = Paginator::with("```", "```", 20);
        paginator.add_lines(["aaaa", "bbbb", "cccc", "dddd", "eeee"]);

        let pages = paginator.pages();
        assert_eq!(
            pages,
            vec!["```aaaa\nbbbb\n```", "```cccc\ndddd\n```", "```eeee\n```"]
        );
        for page in &pages {
            assert!(page.len() <= 20, "{page:?}");
        }
    }

    #[test]
    fn long_lines_are_split() {
        let mut paginator = Paginator::with("```", "```", 12);
        paginator.add_line("abcdefghij", false);

        let pages = paginator.pages();
        assert_eq!(pages, vec!["```abcde\n```", "```fghij\n```"]);
    }

    #[test]
    fn oversized_prefixes_fall_back_to_a_plain_block() {
        let mut paginator = Paginator::with("```a-very-long-lang\n", "```", 20);
        paginator.add_line("abcdefghij", false);

        let pages = paginator.pages();
        assert_eq!(pages, vec!["```abcdefghij\n```"]);

        let mut tiny = Paginator::with("```", "```", 6);
        tiny.add_line("abc", false);
        for page in tiny.pages() {
            assert!(page.len() <= 6, "{page:?}");
        }
    }

    #[test]
    fn splitting_respects_char_boundaries() {
        assert_eq!(split_at_most("ééé", 3), vec!["é", "é", "é"]);
        assert_eq!(split_at_most("", 3), vec![""]);
    }
}
