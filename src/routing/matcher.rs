//! Path pattern compilation and matching.
//!
//! # Grammar
//! - Literal text matches itself (case-sensitive). `\x` escapes `x`.
//!   Literals are percent-encoded the way request paths are, so `/a b`
//!   matches the pathname `/a%20b`.
//! - `:name` captures one or more characters other than `/`.
//! - `*` captures anything, including `/` and the empty string. Anonymous
//!   captures are named `"0"`, `"1"`, ... in order of appearance.
//! - A `/` directly before a capture is its prefix. Modifiers `?`, `*`, `+`
//!   make the prefix and capture optional or repeated.
//! - `{...}` groups literals and captures; `{...}?` makes the group optional.
//!
//! # Design Decisions
//! - Patterns are compiled once into a flat node list; matching is a
//!   backtracking walk over that list, anchored at both ends
//! - No regex engine: `(...)` groups are rejected at compile time
//! - Captures are recorded as byte ranges and only copied out on success

use std::collections::HashSet;
use std::iter::Peekable;
use std::str::CharIndices;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::error::PatternSyntaxError;
use crate::routing::params::Params;

/// Characters the URL path serializer escapes.
const PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
    One,
    Optional,
    ZeroOrMore,
    OneOrMore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureKind {
    /// `[^/]+`, shortest first.
    Segment,
    /// `.*`, longest first.
    Wildcard,
}

#[derive(Debug, Clone)]
enum Node {
    Literal(String),
    Capture {
        slot: usize,
        prefix: String,
        kind: CaptureKind,
        modifier: Modifier,
    },
    GroupStart {
        optional: bool,
        end: usize,
        first_slot: usize,
        last_slot: usize,
    },
    GroupEnd,
}

/// A compiled path pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    nodes: Vec<Node>,
    names: Vec<String>,
}

impl PathPattern {
    /// Compile `pattern`. It must start with `/`.
    pub fn compile(pattern: &str) -> Result<Self, PatternSyntaxError> {
        if !pattern.starts_with('/') {
            return Err(PatternSyntaxError::MissingLeadingSlash {
                pattern: pattern.to_string(),
            });
        }
        Compiler::new(pattern).run()
    }

    /// The pattern text this was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Declared parameter names, in order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Match the whole of `path`, returning the captures on success.
    pub fn captures(&self, path: &str) -> Option<Params> {
        let mut slots = vec![None; self.names.len()];
        if !self.walk(0, 0, path, &mut slots) {
            return None;
        }
        Some(
            self.names
                .iter()
                .zip(slots)
                .map(|(name, range)| (name.as_str(), range.map(|(s, e)| &path[s..e])))
                .collect(),
        )
    }

    pub fn is_match(&self, path: &str) -> bool {
        let mut slots = vec![None; self.names.len()];
        self.walk(0, 0, path, &mut slots)
    }

    fn walk(
        &self,
        at: usize,
        pos: usize,
        path: &str,
        slots: &mut [Option<(usize, usize)>],
    ) -> bool {
        let Some(node) = self.nodes.get(at) else {
            return pos == path.len();
        };

        match node {
            Node::Literal(text) => {
                path[pos..].starts_with(text.as_str()) && self.walk(at + 1, pos + text.len(), path, slots)
            }
            Node::GroupEnd => self.walk(at + 1, pos, path, slots),
            Node::GroupStart {
                optional,
                end,
                first_slot,
                last_slot,
            } => {
                if self.walk(at + 1, pos, path, slots) {
                    return true;
                }
                if !optional {
                    return false;
                }
                for slot in &mut slots[*first_slot..*last_slot] {
                    *slot = None;
                }
                self.walk(end + 1, pos, path, slots)
            }
            Node::Capture {
                slot,
                prefix,
                kind,
                modifier,
            } => {
                for (end, range) in candidates(path, pos, prefix, *kind, *modifier) {
                    slots[*slot] = range;
                    if self.walk(at + 1, end, path, slots) {
                        return true;
                    }
                }
                slots[*slot] = None;
                false
            }
        }
    }
}

impl std::fmt::Display for PathPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

/// Possible `(end, capture)` outcomes for one capture node, in preference order.
fn candidates(
    path: &str,
    pos: usize,
    prefix: &str,
    kind: CaptureKind,
    modifier: Modifier,
) -> Vec<(usize, Option<(usize, usize)>)> {
    let mut out = Vec::new();

    match (kind, modifier) {
        (_, Modifier::One) | (CaptureKind::Wildcard, Modifier::OneOrMore) => {
            push_units(path, pos, prefix, kind, &mut out);
        }
        (_, Modifier::Optional) | (CaptureKind::Wildcard, Modifier::ZeroOrMore) => {
            push_units(path, pos, prefix, kind, &mut out);
            out.push((pos, None));
        }
        (CaptureKind::Segment, Modifier::ZeroOrMore | Modifier::OneOrMore) => {
            // Every repetition but the last takes a whole segment.
            let mut starts = vec![pos];
            let mut cursor = pos;
            while let Some(next) = whole_unit(path, cursor, prefix) {
                starts.push(next);
                cursor = next;
            }
            let value_start = pos + prefix.len();
            for &rep_start in starts.iter().rev() {
                let mut units = Vec::new();
                push_units(path, rep_start, prefix, kind, &mut units);
                for (end, _) in units {
                    out.push((end, Some((value_start, end))));
                }
            }
            if modifier == Modifier::ZeroOrMore {
                out.push((pos, None));
            }
        }
    }

    out
}

/// All single-unit matches of `prefix` + capture starting at `pos`.
fn push_units(
    path: &str,
    pos: usize,
    prefix: &str,
    kind: CaptureKind,
    out: &mut Vec<(usize, Option<(usize, usize)>)>,
) {
    let rest = &path[pos..];
    if !rest.starts_with(prefix) {
        return;
    }
    let start = pos + prefix.len();
    let tail = &path[start..];

    match kind {
        CaptureKind::Segment => {
            let limit = tail.find('/').unwrap_or(tail.len());
            let ends = tail[..limit]
                .char_indices()
                .map(|(i, c)| start + i + c.len_utf8());
            for end in ends {
                out.push((end, Some((start, end))));
            }
        }
        CaptureKind::Wildcard => {
            let ends = tail
                .char_indices()
                .map(|(i, c)| start + i + c.len_utf8())
                .rev()
                .chain(std::iter::once(start));
            for end in ends {
                out.push((end, Some((start, end))));
            }
        }
    }
}

/// End of `prefix` + a maximal segment at `pos`, if one fits.
fn whole_unit(path: &str, pos: usize, prefix: &str) -> Option<usize> {
    let tail = path[pos..].strip_prefix(prefix)?;
    let len = tail.find('/').unwrap_or(tail.len());
    (len > 0).then(|| pos + prefix.len() + len)
}

struct Compiler<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    nodes: Vec<Node>,
    names: Vec<String>,
    seen: HashSet<String>,
    literal: String,
    anonymous: usize,
    /// Index of the open `GroupStart` node and its offset.
    group: Option<(usize, usize)>,
}

impl<'a> Compiler<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            nodes: Vec::new(),
            names: Vec::new(),
            seen: HashSet::new(),
            literal: String::new(),
            anonymous: 0,
            group: None,
        }
    }

    fn run(mut self) -> Result<PathPattern, PatternSyntaxError> {
        while let Some((offset, c)) = self.chars.next() {
            match c {
                '\\' => match self.chars.next() {
                    Some((_, escaped)) => self.literal.push(escaped),
                    None => return Err(PatternSyntaxError::DanglingEscape),
                },
                ':' => {
                    let name = self.read_name();
                    if name.is_empty() {
                        return Err(PatternSyntaxError::EmptyParamName { offset });
                    }
                    if !self.seen.insert(name.clone()) {
                        return Err(PatternSyntaxError::DuplicateParam { name });
                    }
                    self.push_capture(name, CaptureKind::Segment);
                }
                '*' => {
                    let name = self.anonymous.to_string();
                    self.anonymous += 1;
                    self.push_capture(name, CaptureKind::Wildcard);
                }
                '(' | ')' => return Err(PatternSyntaxError::RegexGroup { offset }),
                '{' => {
                    if self.group.is_some() {
                        return Err(PatternSyntaxError::NestedGroup { offset });
                    }
                    self.flush_literal();
                    self.nodes.push(Node::GroupStart {
                        optional: false,
                        end: 0,
                        first_slot: self.names.len(),
                        last_slot: 0,
                    });
                    self.group = Some((self.nodes.len() - 1, offset));
                }
                '}' => {
                    let Some((start, _)) = self.group.take() else {
                        return Err(PatternSyntaxError::UnbalancedGroup { offset });
                    };
                    self.flush_literal();
                    self.nodes.push(Node::GroupEnd);
                    let close = self.nodes.len() - 1;
                    let optional = match self.chars.peek() {
                        Some(&(_, '?')) => {
                            self.chars.next();
                            true
                        }
                        Some(&(at, m @ ('+' | '*'))) => {
                            return Err(PatternSyntaxError::DanglingModifier {
                                modifier: m,
                                offset: at,
                            })
                        }
                        _ => false,
                    };
                    let slots = self.names.len();
                    if let Node::GroupStart {
                        optional: o,
                        end,
                        last_slot,
                        ..
                    } = &mut self.nodes[start]
                    {
                        *o = optional;
                        *end = close;
                        *last_slot = slots;
                    }
                }
                '?' | '+' => {
                    return Err(PatternSyntaxError::DanglingModifier {
                        modifier: c,
                        offset,
                    })
                }
                other => self.literal.push(other),
            }
        }

        if let Some((_, offset)) = self.group {
            return Err(PatternSyntaxError::UnbalancedGroup { offset });
        }
        self.flush_literal();

        Ok(PathPattern {
            source: self.source.to_string(),
            nodes: self.nodes,
            names: self.names,
        })
    }

    fn read_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            let valid = c == '_' || c == '$' || c.is_ascii_alphabetic() || (!name.is_empty() && c.is_ascii_digit());
            if !valid {
                break;
            }
            name.push(c);
            self.chars.next();
        }
        name
    }

    fn read_modifier(&mut self) -> Modifier {
        let modifier = match self.chars.peek() {
            Some(&(_, '?')) => Modifier::Optional,
            Some(&(_, '*')) => Modifier::ZeroOrMore,
            Some(&(_, '+')) => Modifier::OneOrMore,
            _ => return Modifier::One,
        };
        self.chars.next();
        modifier
    }

    fn push_capture(&mut self, name: String, kind: CaptureKind) {
        let prefix = if self.literal.ends_with('/') {
            self.literal.pop();
            "/".to_string()
        } else {
            String::new()
        };
        self.flush_literal();
        let modifier = self.read_modifier();
        self.nodes.push(Node::Capture {
            slot: self.names.len(),
            prefix,
            kind,
            modifier,
        });
        self.names.push(name);
    }

    fn flush_literal(&mut self) {
        if !self.literal.is_empty() {
            let literal = std::mem::take(&mut self.literal);
            self.nodes
                .push(Node::Literal(utf8_percent_encode(&literal, PATH).to_string()));
        }
    }
}
