use once_cell::sync::Lazy;
use regex::Regex;

use crate::utils::format::is_blank;

static LINE_BREAKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\r\n]+").expect("line break pattern is valid"));

/// Header and chart tags the parser understands. Everything else in a
/// simfile (`#OFFSET`, `#MUSIC`, `#BANNER`, ...) is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Title,
    Subtitle,
    Artist,
    TitleTranslit,
    SubtitleTranslit,
    ArtistTranslit,
    Bpms,
    Stops,
    Notes,
}

impl Tag {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "#TITLE" => Some(Tag::Title),
            "#SUBTITLE" => Some(Tag::Subtitle),
            "#ARTIST" => Some(Tag::Artist),
            "#TITLETRANSLIT" => Some(Tag::TitleTranslit),
            "#SUBTITLETRANSLIT" => Some(Tag::SubtitleTranslit),
            "#ARTISTTRANSLIT" => Some(Tag::ArtistTranslit),
            "#BPMS" => Some(Tag::Bpms),
            "#STOPS" => Some(Tag::Stops),
            "#NOTES" => Some(Tag::Notes),
            _ => None,
        }
    }
}

/// One `#KEY:value;` statement, both halves trimmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Declaration<'a> {
    pub key: &'a str,
    pub value: &'a str,
}

/// Drops everything from `//` to the end of each line. Line breaks (including
/// blank lines and `\r\n`) collapse into a single `\n` per line, the same way
/// StepMania reads .sm files.
pub fn strip_comments(content: &str) -> String {
    let mut stripped = String::with_capacity(content.len() + 1);
    for line in LINE_BREAKS.split(content) {
        let code = line.split_once("//").map_or(line, |(code, _)| code);
        stripped.push_str(code);
        stripped.push('\n');
    }
    stripped
}

/// Splits on the first `delimiter` only, so `#TITLE:apo::lith` keeps its
/// colons in the value. Text without a delimiter is all key. A leading
/// byte-order mark is trimmed along with the whitespace.
pub fn read_element(element: &str, delimiter: char) -> (&str, &str) {
    match element.split_once(delimiter) {
        Some((key, value)) => (key.trim_matches(is_blank), value.trim_matches(is_blank)),
        None => (element.trim_matches(is_blank), ""),
    }
}

/// Every `;`-terminated declaration with a non-empty value, in source order.
pub fn declarations(content: &str) -> impl Iterator<Item = Declaration<'_>> {
    content
        .split(';')
        .map(|element| read_element(element, ':'))
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| Declaration { key, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn comments_are_stripped_per_line() {
        let stripped = strip_comments("#TITLE:Foo; // the title\r\n\r\n#ARTIST:Bar;//x");
        assert_eq!(stripped, "#TITLE:Foo; \n#ARTIST:Bar;\n");
    }

    #[test]
    fn value_keeps_later_colons() {
        assert_eq!(read_element("  #TITLE:apo::lith \n", ':'), ("#TITLE", "apo::lith"));
        assert_eq!(read_element("4.000=150", '='), ("4.000", "150"));
        assert_eq!(read_element("garbage", '='), ("garbage", ""));
    }

    #[test]
    fn byte_order_mark_is_not_part_of_the_key() {
        assert_eq!(read_element("\u{feff}#TITLE:Song", ':'), ("#TITLE", "Song"));
        assert_eq!(read_element("#TITLE:\u{a0}Song\u{feff}", ':'), ("#TITLE", "Song"));
    }

    #[test]
    fn empty_declarations_are_skipped() {
        let content = "#TITLE:Song;\n#SUBTITLE:;\n#CDTITLE:   ;\n#ARTIST:Someone;\n";
        let found: Vec<_> = declarations(content).collect();
        assert_eq!(
            found,
            vec![
                Declaration { key: "#TITLE", value: "Song" },
                Declaration { key: "#ARTIST", value: "Someone" },
            ]
        );
    }

    #[test]
    fn tags_are_case_sensitive() {
        assert_eq!(Tag::from_key("#NOTES"), Some(Tag::Notes));
        assert_eq!(Tag::from_key("#notes"), None);
        assert_eq!(Tag::from_key("#OFFSET"), None);
    }
}
