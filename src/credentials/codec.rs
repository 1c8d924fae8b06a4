//! Lossless reader and writer for the INI profile format of the AWS shared
//! credentials file.
//!
//! Every line keeps its original text, line terminator included, until it is
//! modified. Serializing a document nobody touched reproduces the input byte
//! for byte; modified or new properties are rendered as `key = value`.

use std::borrow::Cow;

use thiserror::Error;

const COMMENT_PREFIXES: [char; 2] = ['#', ';'];

/// A line that cannot be read as part of a profile container
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {reason}")]
pub struct ParseError {
    pub line: usize,
    pub reason: &'static str,
}

impl ParseError {
    fn new(line: usize, reason: &'static str) -> Self {
        Self { line, reason }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    /// The terminator of the first line decides for the whole document
    fn detect(text: &str) -> Self {
        match text.find('\n') {
            Some(end) if text[..end].ends_with('\r') => Self::CrLf,
            _ => Self::Lf,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    /// Blank line or comment
    Verbatim(String),
    Entry(Entry),
    /// Indented line belonging to a nested value
    Continuation(String),
}

impl Line {
    fn is_blank(&self) -> bool {
        matches!(self, Line::Verbatim(raw) if raw.trim().is_empty())
    }

    fn is_property(&self) -> bool {
        !matches!(self, Line::Verbatim(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    key: String,
    value: String,
    /// Original text; `None` once the entry is created or modified
    raw: Option<String>,
}

impl Entry {
    fn new(key: &str, value: String) -> Self {
        Self {
            key: key.to_string(),
            value,
            raw: None,
        }
    }

    fn render(&self, ending: LineEnding) -> Cow<'_, str> {
        match &self.raw {
            Some(raw) => Cow::Borrowed(raw),
            None => Cow::Owned(format!("{} = {}{}", self.key, self.value, ending.as_str())),
        }
    }
}

/// One `[name]` section and the lines up to the next header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    name: String,
    header: Option<String>,
    lines: Vec<Line>,
}

impl Section {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            header: None,
            lines: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value of the first property named `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value)
    }

    /// Properties in file order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines.iter().filter_map(|line| match line {
            Line::Entry(entry) => Some((entry.key.as_str(), entry.value.as_str())),
            _ => None,
        })
    }

    /// Sets `key` in place, or appends it after the last property.
    /// Later duplicates of `key` are dropped.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        let positions: Vec<usize> = self
            .lines
            .iter()
            .enumerate()
            .filter_map(|(index, line)| match line {
                Line::Entry(entry) if entry.key == key => Some(index),
                _ => None,
            })
            .collect();

        match positions.split_first() {
            Some((&first, duplicates)) => {
                for &index in duplicates.iter().rev() {
                    let end = self.property_end(index);
                    self.lines.drain(index..end);
                }
                let end = self.property_end(first);
                self.lines.drain(first + 1..end);
                self.lines[first] = Line::Entry(Entry::new(key, value));
            }
            None => {
                let at = self
                    .lines
                    .iter()
                    .rposition(Line::is_property)
                    .map_or(0, |index| index + 1);
                self.lines.insert(at, Line::Entry(Entry::new(key, value)));
            }
        }
    }

    /// Removes every property, keeping blank lines and comments
    pub fn clear(&mut self) {
        self.lines.retain(|line| !line.is_property());
    }

    /// Index one past the entry at `index` and its nested lines
    fn property_end(&self, index: usize) -> usize {
        let nested = self.lines[index + 1..]
            .iter()
            .take_while(|line| matches!(line, Line::Continuation(_)))
            .count();
        index + 1 + nested
    }

    fn accepts_continuation(&self) -> bool {
        match self.lines.last() {
            Some(Line::Continuation(_)) => true,
            Some(Line::Entry(entry)) => entry.value.is_empty(),
            _ => false,
        }
    }

    fn ends_with_blank_line(&self) -> bool {
        self.lines.last().is_some_and(Line::is_blank)
    }

    fn trim_trailing_blank_lines(&mut self) {
        while self.ends_with_blank_line() {
            self.lines.pop();
        }
    }
}

/// An ordered collection of sections plus any leading comments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    preamble: Vec<String>,
    sections: Vec<Section>,
    line_ending: LineEnding,
}

impl Document {
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut document = Document {
            line_ending: LineEnding::detect(text),
            ..Default::default()
        };

        for (index, raw) in text.split_inclusive('\n').enumerate() {
            let number = index + 1;
            let content = raw.trim_end_matches(['\n', '\r']);
            let trimmed = content.trim();

            if trimmed.is_empty() || trimmed.starts_with(COMMENT_PREFIXES) {
                match document.sections.last_mut() {
                    Some(section) => section.lines.push(Line::Verbatim(raw.to_string())),
                    None => document.preamble.push(raw.to_string()),
                }
                continue;
            }

            if trimmed.starts_with('[') {
                let name = parse_header(trimmed)
                    .ok_or_else(|| ParseError::new(number, "malformed section header"))?;
                document.sections.push(Section {
                    name: name.to_string(),
                    header: Some(raw.to_string()),
                    lines: Vec::new(),
                });
                continue;
            }

            let section = document
                .sections
                .last_mut()
                .ok_or_else(|| ParseError::new(number, "property outside of any profile section"))?;

            if content.starts_with([' ', '\t']) && section.accepts_continuation() {
                section.lines.push(Line::Continuation(raw.to_string()));
                continue;
            }

            let (key, value) = trimmed
                .split_once('=')
                .ok_or_else(|| ParseError::new(number, "expected `key = value`"))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(ParseError::new(number, "missing property name"));
            }

            section.lines.push(Line::Entry(Entry {
                key: key.to_string(),
                value: value.trim().to_string(),
                raw: Some(raw.to_string()),
            }));
        }

        Ok(document)
    }

    pub fn serialize(&self) -> String {
        let ending = self.line_ending.as_str();
        let mut out = String::new();

        for raw in &self.preamble {
            push_line(&mut out, raw, ending);
        }

        for section in &self.sections {
            match &section.header {
                Some(raw) => push_line(&mut out, raw, ending),
                None => push_line(&mut out, &format!("[{}]{ending}", section.name), ending),
            }
            for line in &section.lines {
                match line {
                    Line::Verbatim(raw) | Line::Continuation(raw) => {
                        push_line(&mut out, raw, ending)
                    }
                    Line::Entry(entry) => {
                        push_line(&mut out, &entry.render(self.line_ending), ending)
                    }
                }
            }
        }

        out
    }

    pub fn sections(&self) -> std::slice::Iter<'_, Section> {
        self.sections.iter()
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.name == name)
    }

    pub fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|section| section.name == name)
    }

    /// First section named `name`, appended when missing
    pub fn section_mut_or_append(&mut self, name: &str) -> &mut Section {
        match self.sections.iter().position(|section| section.name == name) {
            Some(index) => &mut self.sections[index],
            None => self.append_section(name),
        }
    }

    /// Appends an empty section, separated from the previous content by a
    /// blank line
    pub fn append_section(&mut self, name: &str) -> &mut Section {
        let separator = Line::Verbatim(self.line_ending.as_str().to_string());
        match self.sections.last_mut() {
            Some(last) if !last.ends_with_blank_line() => last.lines.push(separator),
            Some(_) => {}
            None => {
                if self.preamble.last().is_some_and(|raw| !raw.trim().is_empty()) {
                    self.preamble.push(self.line_ending.as_str().to_string());
                }
            }
        }

        self.sections.push(Section::new(name));
        let index = self.sections.len() - 1;
        &mut self.sections[index]
    }

    /// Drops every section for which `keep` returns false and returns the
    /// removed names in file order. When the final section goes, the blank
    /// lines that separated it from its predecessor go with it.
    pub fn retain_sections<F>(&mut self, mut keep: F) -> Vec<String>
    where
        F: FnMut(&Section) -> bool,
    {
        let mut removed = Vec::new();
        let mut tail_removed = false;
        let count = self.sections.len();
        let mut index = 0;

        self.sections.retain(|section| {
            index += 1;
            if keep(section) {
                return true;
            }
            tail_removed = index == count;
            removed.push(section.name.clone());
            false
        });

        if tail_removed {
            match self.sections.last_mut() {
                Some(last) => last.trim_trailing_blank_lines(),
                None => {
                    while self.preamble.last().is_some_and(|raw| raw.trim().is_empty()) {
                        self.preamble.pop();
                    }
                }
            }
        }

        removed
    }
}

fn parse_header(line: &str) -> Option<&str> {
    let (inner, rest) = line.strip_prefix('[')?.split_once(']')?;
    let name = inner.trim();
    let rest = rest.trim();
    let trailing_ok = rest.is_empty() || rest.starts_with(COMMENT_PREFIXES);
    (!name.is_empty() && trailing_ok).then_some(name)
}

fn push_line(out: &mut String, raw: &str, ending: &str) {
    // the original last line may lack a terminator
    if !out.is_empty() && !out.ends_with('\n') {
        out.push_str(ending);
    }
    out.push_str(raw);
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# managed by hand
[default]
aws_access_key_id = AKIADEFAULT
aws_secret_access_key = secret ; not a comment
mfa_serial=arn:aws:iam::123456789012:mfa/alice

; development account
[dev]
aws_access_key_id = AKIADEV
  aws_secret_access_key   =   devsecret
s3 =
    max_concurrent_requests = 20
region = eu-west-1
";

    #[test]
    fn test_round_trip_is_byte_identical() {
        let document = Document::parse(SAMPLE).unwrap();
        assert_eq!(document.serialize(), SAMPLE);
    }

    #[test]
    fn test_round_trip_crlf_without_final_newline() {
        let text = "[default]\r\naws_access_key_id = A\r\n\r\n[dev]\r\nregion = us-east-2";
        let document = Document::parse(text).unwrap();
        assert_eq!(document.serialize(), text);
    }

    #[test]
    fn test_round_trip_empty() {
        let document = Document::parse("").unwrap();
        assert_eq!(document.serialize(), "");
        assert_eq!(document.sections().count(), 0);
    }

    #[test]
    fn test_parse_reads_sections_and_entries() {
        let document = Document::parse(SAMPLE).unwrap();
        let names: Vec<&str> = document.sections().map(Section::name).collect();
        assert_eq!(names, vec!["default", "dev"]);

        let default = document.section("default").unwrap();
        assert_eq!(
            default.get("mfa_serial"),
            Some("arn:aws:iam::123456789012:mfa/alice")
        );
        assert_eq!(
            default.get("aws_secret_access_key"),
            Some("secret ; not a comment")
        );

        let dev = document.section("dev").unwrap();
        assert_eq!(dev.get("aws_secret_access_key"), Some("devsecret"));
        assert_eq!(dev.get("s3"), Some(""));
        assert_eq!(dev.get("max_concurrent_requests"), None);
        assert_eq!(dev.get("region"), Some("eu-west-1"));
    }

    #[test]
    fn test_parse_header_with_spaces_and_comment() {
        let document = Document::parse("[ profile work ] # main\nregion = x\n").unwrap();
        assert!(document.section("profile work").is_some());
    }

    #[test]
    fn test_parse_rejects_property_before_section() {
        let err = Document::parse("# top\naws_access_key_id = A\n").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_parse_rejects_line_without_separator() {
        let err = Document::parse("[default]\nthis is not ini\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.reason, "expected `key = value`");
    }

    #[test]
    fn test_parse_rejects_malformed_header() {
        assert!(Document::parse("[default\n").is_err());
        assert!(Document::parse("[]\n").is_err());
        assert!(Document::parse("[default] trailing\n").is_err());
    }

    #[test]
    fn test_parse_rejects_empty_key() {
        let err = Document::parse("[default]\n= value\n").unwrap_err();
        assert_eq!(err.reason, "missing property name");
    }

    #[test]
    fn test_set_existing_key_only_rewrites_that_line() {
        let mut document = Document::parse(SAMPLE).unwrap();
        document
            .section_mut("dev")
            .unwrap()
            .set("region", "ap-northeast-1");

        let expected = SAMPLE.replace("region = eu-west-1", "region = ap-northeast-1");
        assert_eq!(document.serialize(), expected);
    }

    #[test]
    fn test_set_new_key_goes_after_last_property() {
        let mut document = Document::parse("[a]\nx = 1\n\n[b]\ny = 2\n").unwrap();
        document.section_mut("a").unwrap().set("z", "3");
        assert_eq!(document.serialize(), "[a]\nx = 1\nz = 3\n\n[b]\ny = 2\n");
    }

    #[test]
    fn test_set_drops_duplicates_and_nested_lines() {
        let mut document = Document::parse("[a]\nk =\n  nested = x\nj = 2\nk = 3\n").unwrap();
        let section = document.section_mut("a").unwrap();
        section.set("k", "9");
        assert_eq!(section.get("k"), Some("9"));
        assert_eq!(document.serialize(), "[a]\nk = 9\nj = 2\n");
    }

    #[test]
    fn test_clear_keeps_comments_and_blank_lines() {
        let mut document = Document::parse("[a]\n# note\nk = 1\n\n[b]\n").unwrap();
        document.section_mut("a").unwrap().clear();
        assert_eq!(document.serialize(), "[a]\n# note\n\n[b]\n");
    }

    #[test]
    fn test_append_section_adds_separator() {
        let mut document = Document::parse("[a]\nk = 1").unwrap();
        document.append_section("b").set("x", "y");
        assert_eq!(document.serialize(), "[a]\nk = 1\n\n[b]\nx = y\n");
    }

    #[test]
    fn test_append_section_reuses_existing_blank_line() {
        let mut document = Document::parse("[a]\nk = 1\n\n").unwrap();
        document.append_section("b").set("x", "y");
        assert_eq!(document.serialize(), "[a]\nk = 1\n\n[b]\nx = y\n");
    }

    #[test]
    fn test_append_section_to_empty_document() {
        let mut document = Document::default();
        document.append_section("a").set("k", "v");
        assert_eq!(document.serialize(), "[a]\nk = v\n");
    }

    #[test]
    fn test_append_section_keeps_crlf() {
        let mut document = Document::parse("[a]\r\nk = 1\r\n").unwrap();
        document.append_section("b").set("x", "y");
        assert_eq!(document.serialize(), "[a]\r\nk = 1\r\n\r\n[b]\r\nx = y\r\n");
    }

    #[test]
    fn test_retain_sections_removes_middle_section() {
        let mut document = Document::parse("[a]\nk = 1\n\n[x]\nk = 2\n\n[b]\nk = 3\n").unwrap();
        let removed = document.retain_sections(|section| section.name() != "x");
        assert_eq!(removed, vec!["x"]);
        assert_eq!(document.serialize(), "[a]\nk = 1\n\n[b]\nk = 3\n");
    }

    #[test]
    fn test_retain_sections_undoes_append() {
        let original = "[a]\nk = 1\n";
        let mut document = Document::parse(original).unwrap();
        document.append_section("x").set("k", "2");
        document.retain_sections(|section| section.name() != "x");
        assert_eq!(document.serialize(), original);
    }

    #[test]
    fn test_retain_sections_nothing_removed() {
        let mut document = Document::parse(SAMPLE).unwrap();
        assert!(document.retain_sections(|_| true).is_empty());
        assert_eq!(document.serialize(), SAMPLE);
    }
}
