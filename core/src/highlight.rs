use std::borrow::Cow;

/// Prefixes whose whole token is a facet, not searchable text.
const FACET_OPERATORS: &[&str] = &["tag:", "-tag:", "created:", "updated:", "has:", "todo:"];
const TITLE_OPERATOR: &str = "intitle:";
const STOP_WORDS: &[&str] = &["and", "or", "not", "near"];
const STRIPPED_CHARS: &[char] = &['"', '\'', '(', ')'];

pub const SNIPPET_MAX_CHARS: usize = 300;

/// Lowercased terms to mark in rendered notes, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightTerms(Vec<String>);

impl HighlightTerms {
    /// Derive terms from a raw query as the user typed it.
    ///
    /// ```
    /// use jot_search_core::HighlightTerms;
    ///
    /// let terms = HighlightTerms::from_query(r#"intitle:meeting tag:work "exact phrase" NEAR"#);
    /// assert_eq!(terms.terms(), &["meeting", "exact", "phrase"]);
    /// ```
    pub fn from_query(raw: &str) -> Self {
        let mut terms: Vec<String> = Vec::new();

        for token in raw.split_whitespace() {
            let token: String = token
                .chars()
                .filter(|c| !STRIPPED_CHARS.contains(c))
                .collect::<String>()
                .to_lowercase();

            if FACET_OPERATORS.iter().any(|op| token.starts_with(op)) {
                continue;
            }
            let token = token.strip_prefix(TITLE_OPERATOR).unwrap_or(&token);

            if token.chars().count() <= 2 || is_stop_word(token) {
                continue;
            }
            if !terms.iter().any(|t| t == token) {
                terms.push(token.to_string());
            }
        }

        HighlightTerms(terms)
    }

    pub fn terms(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn is_stop_word(token: &str) -> bool {
    if STOP_WORDS.contains(&token) {
        return true;
    }
    // proximity operator, e.g. near/5
    token
        .strip_prefix("near/")
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    Document,
    Paragraph,
    Heading(u8),
    List { ordered: bool },
    ListItem,
    Strong,
    Emphasis,
    BlockQuote,
    CodeBlock,
    InlineCode,
    Link { href: String },
    /// Marks a matched search term
    Highlight,
}

impl ElementKind {
    fn highlights_text(&self) -> bool {
        matches!(
            self,
            ElementKind::Paragraph
                | ElementKind::Heading(_)
                | ElementKind::ListItem
                | ElementKind::Strong
                | ElementKind::Emphasis
        )
    }
}

/// Rendered rich-text content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RichNode {
    Text(String),
    Element {
        kind: ElementKind,
        children: Vec<RichNode>,
    },
}

impl RichNode {
    pub fn text(text: impl Into<String>) -> Self {
        RichNode::Text(text.into())
    }

    pub fn element(kind: ElementKind, children: Vec<RichNode>) -> Self {
        RichNode::Element { kind, children }
    }

    /// Concatenated text of the subtree.
    pub fn plain_text(&self) -> String {
        match self {
            RichNode::Text(text) => text.clone(),
            RichNode::Element { children, .. } => {
                children.iter().map(RichNode::plain_text).collect()
            }
        }
    }
}

/// Build a copy of `node` with term matches wrapped in highlight elements.
///
/// Only text directly under a paragraph, heading, list item, strong or
/// emphasis element is touched. The source tree is never modified, and
/// running the result through again changes nothing.
pub fn highlight(node: &RichNode, terms: &HighlightTerms) -> RichNode {
    if terms.is_empty() {
        return node.clone();
    }
    rebuild(node, terms)
}

fn rebuild(node: &RichNode, terms: &HighlightTerms) -> RichNode {
    match node {
        RichNode::Text(_) => node.clone(),
        RichNode::Element { kind, children } => {
            let children = children
                .iter()
                .flat_map(|child| match child {
                    RichNode::Text(text) if kind.highlights_text() => wrap_matches(text, terms),
                    _ => vec![rebuild(child, terms)],
                })
                .collect();
            RichNode::element(kind.clone(), children)
        }
    }
}

fn wrap_matches(text: &str, terms: &HighlightTerms) -> Vec<RichNode> {
    highlight_segments(text, terms)
        .into_iter()
        .map(|segment| {
            if segment.matched {
                RichNode::element(ElementKind::Highlight, vec![RichNode::text(segment.text)])
            } else {
                RichNode::text(segment.text)
            }
        })
        .collect()
}

/// A run of a flat string, matched or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub matched: bool,
}

/// Split flat text, such as a result snippet, into matched and plain runs.
pub fn highlight_segments<'a>(text: &'a str, terms: &HighlightTerms) -> Vec<Segment<'a>> {
    let mut segments = Vec::new();
    let mut plain_from = 0;

    for (start, end) in find_matches(text, terms) {
        if start > plain_from {
            segments.push(Segment {
                text: &text[plain_from..start],
                matched: false,
            });
        }
        segments.push(Segment {
            text: &text[start..end],
            matched: true,
        });
        plain_from = end;
    }
    if plain_from < text.len() || segments.is_empty() {
        segments.push(Segment {
            text: &text[plain_from..],
            matched: false,
        });
    }

    segments
}

/// Byte ranges of non-overlapping matches, scanning left to right.
/// At one position the longest term wins.
fn find_matches(text: &str, terms: &HighlightTerms) -> Vec<(usize, usize)> {
    let mut matches = Vec::new();
    let mut pos = 0;

    while let Some(c) = text[pos..].chars().next() {
        let longest = terms
            .terms()
            .iter()
            .filter_map(|term| match_len(&text[pos..], term))
            .max();

        match longest {
            Some(len) => {
                matches.push((pos, pos + len));
                pos += len;
            }
            None => pos += c.len_utf8(),
        }
    }

    matches
}

/// Bytes of `text` consumed by a case-insensitive match of the lowercase
/// `term` at its start.
fn match_len(text: &str, term: &str) -> Option<usize> {
    let mut wanted = term.chars().peekable();
    wanted.peek()?;

    for (offset, c) in text.char_indices() {
        for lower in c.to_lowercase() {
            if wanted.next() != Some(lower) {
                return None;
            }
        }
        if wanted.peek().is_none() {
            return Some(offset + c.len_utf8());
        }
    }
    None
}

/// Cut a snippet to `max_chars`, marking the cut with `...`.
pub fn truncate_snippet(text: &str, max_chars: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => Cow::Owned(format!("{}...", &text[..cut])),
        None => Cow::Borrowed(text),
    }
}
