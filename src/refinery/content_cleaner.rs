// * Boilerplate & Navigation Removal over crawled markdown
// * Drops legal/cookie/social noise line by line and skips navigation-heavy sections.

use regex::{Regex, RegexSet};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::config::constants::MIN_CONTENT_CHARS;

/// Ordered boilerplate patterns, matched case-insensitively anywhere in a line
pub const BOILERPLATE_PATTERNS: &[&str] = &[
    r"All rights reserved\.?",
    r"©\s*\d{4}",
    r"Cookie\s*Settings?",
    r"Accept\s*Cookies?",
    r"Privacy\s*Policy",
    r"Terms\s*(of|&)\s*(Service|Use)",
    r"Sign\s*up\s*for\s*our\s*newsletter",
    r"Follow\s*us\s*on",
    r"Connect\s*with\s*us",
    r"Share\s*(this|on)\s*(Facebook|Twitter|LinkedIn)",
    r"Loading\.\.\.",
    r"Please\s*wait",
    r"\[Skip to.*?\]",
    r"Back to top",
];

static BOILERPLATE: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new(BOILERPLATE_PATTERNS.iter().map(|p| format!("(?i){}", p))).unwrap()
});

static NAV_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^#+\s*(Navigation|Menu|Footer|Sidebar|Header)").unwrap()
});

static ANY_HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#+\s").unwrap());

static EXCESS_NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Cleaned markdown plus statistics about what was removed
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CleanedContent {
    /// Cleaned markdown text
    pub text: String,
    /// Lines dropped because they matched a boilerplate pattern
    pub lines_removed: usize,
    /// Lines dropped because they sat inside a navigation section
    pub sections_skipped: usize,
}

impl CleanedContent {
    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether there is enough content left to be worth indexing
    pub fn is_sufficient(&self) -> bool {
        self.is_sufficient_with(MIN_CONTENT_CHARS)
    }

    pub fn is_sufficient_with(&self, min_chars: usize) -> bool {
        self.char_len() >= min_chars
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Scanner state threaded through the line fold
#[derive(Debug, Default)]
struct ScanState<'a> {
    kept: Vec<&'a str>,
    in_nav_section: bool,
    lines_removed: usize,
    sections_skipped: usize,
}

impl<'a> ScanState<'a> {
    fn last_kept_is_blank(&self) -> bool {
        self.kept.last().map_or(true, |l| l.trim().is_empty())
    }

    fn step(mut self, line: &'a str) -> Self {
        if line.trim().is_empty() {
            // * Blank lines survive only as a single separator after content
            if !self.last_kept_is_blank() {
                self.kept.push(line);
            }
            return self;
        }

        // * Roles are decided on the unindented line
        let content = line.trim_start();
        let is_boilerplate = BOILERPLATE.is_match(content);

        if NAV_HEADING.is_match(content) {
            self.in_nav_section = true;
        } else if ANY_HEADING.is_match(content) {
            self.in_nav_section = false;
        }

        if self.in_nav_section {
            self.sections_skipped += 1;
        } else if is_boilerplate {
            self.lines_removed += 1;
        } else {
            self.kept.push(line);
        }

        self
    }
}

/// Line-oriented markdown cleaner
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentCleaner;

impl ContentCleaner {
    pub fn new() -> Self {
        Self
    }

    /// Removes boilerplate lines and navigation sections.
    ///
    /// Idempotent: cleaning already-cleaned content returns it unchanged.
    pub fn clean(&self, markdown: &str) -> CleanedContent {
        if markdown.is_empty() {
            return CleanedContent::default();
        }

        let state = markdown
            .split('\n')
            .fold(ScanState::default(), |state, line| state.step(line));

        let joined = state.kept.join("\n");
        let collapsed = EXCESS_NEWLINES.replace_all(&joined, "\n\n");

        CleanedContent {
            text: collapsed.trim().to_string(),
            lines_removed: state.lines_removed,
            sections_skipped: state.sections_skipped,
        }
    }

    /// Cleans and returns only the text
    pub fn clean_text(&self, markdown: &str) -> String {
        self.clean(markdown).text
    }
}

/// Convenience function for cleaning with defaults
pub fn clean_markdown(markdown: &str) -> CleanedContent {
    ContentCleaner::new().clean(markdown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        let result = clean_markdown("");
        assert!(result.is_empty());
        assert!(!result.is_sufficient());
    }

    #[test]
    fn test_copyright_line_removed() {
        let md = "Intro paragraph.\n© 2024 Example Corp. All rights reserved.\nClosing paragraph.";
        let result = clean_markdown(md);
        assert_eq!(result.text, "Intro paragraph.\nClosing paragraph.");
        assert_eq!(result.lines_removed, 1);
    }

    #[test]
    fn test_footer_section_removed() {
        let md = "## Footer\n[About](/about)\n[Jobs](/jobs)\n[Contact](/contact)\n## Main Content\nReal text here.";
        let result = clean_markdown(md);
        assert_eq!(result.text, "## Main Content\nReal text here.");
        assert_eq!(result.sections_skipped, 4);
    }

    #[test]
    fn test_nav_heading_case_insensitive() {
        let md = "# NAVIGATION\n- Home\n- Blog\n# Article\nBody";
        assert_eq!(clean_markdown(md).text, "# Article\nBody");
    }

    #[test]
    fn test_any_heading_ends_skip_section() {
        let md = "### Sidebar\nlinks\n#### Tiny heading\nkept line";
        assert_eq!(clean_markdown(md).text, "#### Tiny heading\nkept line");
    }

    #[test]
    fn test_boilerplate_variants() {
        let md = "Keep me\nAccept Cookies\nPrivacy policy\nTerms & Use\nFollow us on Twitter\n\
                  Share this Facebook\nLoading...\nPlease wait\n[Skip to content](#main)\nBack to top\nKeep me too";
        assert_eq!(clean_markdown(md).text, "Keep me\nKeep me too");
    }

    #[test]
    fn test_blank_runs_collapsed() {
        let md = "First\n\n\n\n\nSecond\n\n\nThird";
        assert_eq!(clean_markdown(md).text, "First\n\nSecond\n\nThird");
    }

    #[test]
    fn test_leading_and_trailing_whitespace_trimmed() {
        let md = "\n\n   \nBody text\n\n";
        assert_eq!(clean_markdown(md).text, "Body text");
    }

    #[test]
    fn test_idempotent() {
        let md = "# Title\n\nPara one.\n\n\n## Menu\n- a\n\n- b\n## Details\n© 2023 Co\nPara two.\n  \nBack to top\n";
        let once = clean_markdown(md).text;
        let twice = clean_markdown(&once).text;
        assert_eq!(once, twice);
    }

    #[test]
    fn test_indented_nav_heading_idempotent() {
        let md = "  ## Footer\n[About](/about)\n[Jobs](/jobs)";
        let once = clean_markdown(md).text;
        assert_eq!(once, "");
        assert_eq!(clean_markdown(&once).text, once);

        let md = "Cookie Settings\n  ## Footer\n[About](/about)\n## Body\ntext";
        let once = clean_markdown(md).text;
        assert_eq!(once, "## Body\ntext");
        assert_eq!(clean_markdown(&once).text, once);
    }

    #[test]
    fn test_indented_heading_ends_skip_section() {
        let md = "## Menu\n- a\n   ## Details\nbody";
        assert_eq!(clean_markdown(md).text, "## Details\nbody");
    }

    #[test]
    fn test_sufficiency_threshold() {
        let short = clean_markdown(&"x".repeat(50));
        assert!(!short.is_sufficient());
        let long = clean_markdown(&"x".repeat(MIN_CONTENT_CHARS));
        assert!(long.is_sufficient());
    }
}
