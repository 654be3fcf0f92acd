//! CSS selector subset used to re-resolve captured selectors against a
//! [`Document`](crate::dom::Document), with the same semantics a browser's
//! `querySelector` applies.
//!
//! Supported: type and universal selectors, `#id`, `.class`, `[attr]`,
//! `[attr=value]`, `:first-child`, `:last-child`, `:nth-child(n|odd|even)`,
//! descendant and `>` combinators, and `,` lists.

use thiserror::Error;

use crate::dom::{Document, NodeId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("empty selector")]
    Empty,

    #[error("unexpected '{found}' at offset {offset} in selector")]
    Unexpected { found: char, offset: usize },

    #[error("unsupported selector syntax: {0}")]
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NthChild {
    Index(usize),
    Odd,
    Even,
}

impl NthChild {
    fn matches(&self, position: usize) -> bool {
        match self {
            NthChild::Index(n) => position == *n,
            NthChild::Odd => position % 2 == 1,
            NthChild::Even => position % 2 == 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Simple {
    Id(String),
    Class(String),
    HasAttr(String),
    AttrEquals(String, String),
    FirstChild,
    LastChild,
    Nth(NthChild),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    filters: Vec<Simple>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// One comma-separated alternative, stored right-most compound first.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    subject: Compound,
    ancestors: Vec<(Combinator, Compound)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    alternatives: Vec<Complex>,
}

impl SelectorList {
    pub fn parse(input: &str) -> Result<Self, QueryError> {
        let mut alternatives = Vec::new();
        for part in split_top_level(input)? {
            alternatives.push(parse_complex(part.0, part.1)?);
        }
        if alternatives.is_empty() {
            return Err(QueryError::Empty);
        }
        Ok(Self { alternatives })
    }

    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        doc.is_element(node) && self.alternatives.iter().any(|c| matches_complex(c, doc, node))
    }
}

// Splits on commas outside brackets/parentheses; yields (slice, offset).
fn split_top_level(input: &str) -> Result<Vec<(&str, usize)>, QueryError> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, ch) in input.char_indices() {
        match ch {
            '[' | '(' => depth += 1,
            ']' | ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push((&input[start..i], start));
                start = i + 1;
            }
            _ => {}
        }
        if depth < 0 {
            return Err(QueryError::Unexpected { found: ch, offset: i });
        }
    }
    parts.push((&input[start..], start));
    for (part, offset) in &parts {
        if part.trim().is_empty() && parts.len() > 1 {
            return Err(QueryError::Unexpected { found: ',', offset: *offset });
        }
    }
    Ok(parts.into_iter().filter(|(p, _)| !p.trim().is_empty()).collect())
}

struct Cursor {
    chars: Vec<(usize, char)>,
    pos: usize,
    base: usize,
}

impl Cursor {
    fn new(src: &str, base: usize) -> Self {
        Self {
            chars: src.char_indices().collect(),
            pos: 0,
            base,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        self.pos += 1;
        c
    }

    fn offset(&self) -> usize {
        self.base + self.chars.get(self.pos).map(|(i, _)| *i).unwrap_or_else(|| {
            self.chars.last().map(|(i, c)| i + c.len_utf8()).unwrap_or(0)
        })
    }

    fn unexpected(&self) -> QueryError {
        match self.peek() {
            Some(found) => QueryError::Unexpected {
                found,
                offset: self.offset(),
            },
            None => QueryError::Unsupported("selector ends unexpectedly".to_string()),
        }
    }

    fn skip_ws(&mut self) -> bool {
        let mut skipped = false;
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
            skipped = true;
        }
        skipped
    }

    fn ident(&mut self) -> Result<String, QueryError> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() {
                out.push(c);
                self.pos += 1;
            } else if c == '\\' {
                self.pos += 1;
                match self.bump() {
                    Some(escaped) => out.push(escaped),
                    None => return Err(self.unexpected()),
                }
            } else {
                break;
            }
        }
        if out.is_empty() {
            return Err(self.unexpected());
        }
        Ok(out)
    }
}

fn parse_complex(src: &str, base: usize) -> Result<Complex, QueryError> {
    let mut cur = Cursor::new(src, base);
    let mut compounds: Vec<Compound> = Vec::new();
    let mut combinators: Vec<Combinator> = Vec::new();

    cur.skip_ws();
    loop {
        compounds.push(parse_compound(&mut cur)?);
        let had_ws = cur.skip_ws();
        match cur.peek() {
            None => break,
            Some('>') => {
                cur.bump();
                cur.skip_ws();
                combinators.push(Combinator::Child);
            }
            Some(_) if had_ws => combinators.push(Combinator::Descendant),
            Some(_) => return Err(cur.unexpected()),
        }
    }

    let subject = compounds.pop().ok_or(QueryError::Empty)?;
    let ancestors = combinators.into_iter().rev().zip(compounds.into_iter().rev()).collect();
    Ok(Complex { subject, ancestors })
}

fn parse_compound(cur: &mut Cursor) -> Result<Compound, QueryError> {
    let mut compound = Compound::default();
    let mut universal = false;
    match cur.peek() {
        Some('*') => {
            cur.bump();
            universal = true;
        }
        Some(c) if c.is_alphabetic() => compound.tag = Some(cur.ident()?.to_ascii_lowercase()),
        _ => {}
    }

    loop {
        match cur.peek() {
            Some('#') => {
                cur.bump();
                compound.filters.push(Simple::Id(cur.ident()?));
            }
            Some('.') => {
                cur.bump();
                compound.filters.push(Simple::Class(cur.ident()?));
            }
            Some('[') => {
                cur.bump();
                compound.filters.push(parse_attr(cur)?);
            }
            Some(':') => {
                cur.bump();
                compound.filters.push(parse_pseudo(cur)?);
            }
            _ => break,
        }
    }

    if !universal && compound.tag.is_none() && compound.filters.is_empty() {
        return Err(cur.unexpected());
    }
    Ok(compound)
}

fn parse_attr(cur: &mut Cursor) -> Result<Simple, QueryError> {
    cur.skip_ws();
    let name = cur.ident()?.to_ascii_lowercase();
    cur.skip_ws();
    match cur.bump() {
        Some(']') => Ok(Simple::HasAttr(name)),
        Some('=') => {
            cur.skip_ws();
            let value = match cur.peek() {
                Some(q @ '"') | Some(q @ '\'') => {
                    cur.bump();
                    let mut value = String::new();
                    loop {
                        match cur.bump() {
                            Some(c) if c == q => break,
                            Some(c) => value.push(c),
                            None => {
                                return Err(QueryError::Unsupported(
                                    "unterminated attribute value".to_string(),
                                ))
                            }
                        }
                    }
                    value
                }
                _ => cur.ident()?,
            };
            cur.skip_ws();
            match cur.bump() {
                Some(']') => Ok(Simple::AttrEquals(name, value)),
                _ => Err(QueryError::Unsupported(format!("attribute operator on [{}]", name))),
            }
        }
        _ => Err(QueryError::Unsupported(format!("attribute operator on [{}]", name))),
    }
}

fn parse_pseudo(cur: &mut Cursor) -> Result<Simple, QueryError> {
    let name = cur.ident()?.to_ascii_lowercase();
    match name.as_str() {
        "first-child" => Ok(Simple::FirstChild),
        "last-child" => Ok(Simple::LastChild),
        "nth-child" => {
            if cur.bump() != Some('(') {
                return Err(QueryError::Unsupported(":nth-child without argument".to_string()));
            }
            let mut arg = String::new();
            loop {
                match cur.bump() {
                    Some(')') => break,
                    Some(c) => arg.push(c),
                    None => return Err(QueryError::Unsupported("unterminated :nth-child".to_string())),
                }
            }
            let arg = arg.trim().to_ascii_lowercase();
            let nth = match arg.as_str() {
                "odd" => NthChild::Odd,
                "even" => NthChild::Even,
                other => match other.parse::<usize>() {
                    Ok(n) if n > 0 => NthChild::Index(n),
                    _ => return Err(QueryError::Unsupported(format!(":nth-child({})", other))),
                },
            };
            Ok(Simple::Nth(nth))
        }
        other => Err(QueryError::Unsupported(format!(":{}", other))),
    }
}

fn matches_compound(compound: &Compound, doc: &Document, node: NodeId) -> bool {
    let tag = match doc.tag(node) {
        Some(tag) => tag,
        None => return false,
    };
    if let Some(want) = &compound.tag {
        if !tag.eq_ignore_ascii_case(want) {
            return false;
        }
    }
    compound.filters.iter().all(|filter| match filter {
        Simple::Id(id) => doc.attr(node, "id") == Some(id.as_str()),
        Simple::Class(class) => doc.classes(node).iter().any(|c| c == class),
        Simple::HasAttr(name) => doc.attr(node, name).is_some(),
        Simple::AttrEquals(name, value) => doc.attr(node, name) == Some(value.as_str()),
        Simple::FirstChild => doc.child_position(node).map(|(i, _)| i == 1).unwrap_or(false),
        Simple::LastChild => doc.child_position(node).map(|(i, n)| i == n).unwrap_or(false),
        Simple::Nth(nth) => doc.child_position(node).map(|(i, _)| nth.matches(i)).unwrap_or(false),
    })
}

fn matches_complex(complex: &Complex, doc: &Document, node: NodeId) -> bool {
    matches_compound(&complex.subject, doc, node) && matches_ancestors(&complex.ancestors, doc, node)
}

// Backtracking walk over the ancestor chain.
fn matches_ancestors(rest: &[(Combinator, Compound)], doc: &Document, node: NodeId) -> bool {
    let ((combinator, compound), tail) = match rest.split_first() {
        Some(split) => split,
        None => return true,
    };
    let mut current = doc.parent_element(node);
    while let Some(candidate) = current {
        if matches_compound(compound, doc, candidate) && matches_ancestors(tail, doc, candidate) {
            return true;
        }
        if *combinator == Combinator::Child {
            return false;
        }
        current = doc.parent_element(candidate);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
        <div id="app" class="shell">
          <ul class="menu">
            <li>One</li><li class="active">Two</li><li data-x="3">Three</li>
          </ul>
          <p>First</p>
          <section><p>Nested</p></section>
        </div>
    </body></html>"#;

    fn texts(doc: &Document, selector: &str) -> Vec<String> {
        doc.query_selector_all(selector)
            .unwrap()
            .into_iter()
            .map(|n| doc.text_content(n).trim().to_string())
            .collect()
    }

    #[test]
    fn test_compound_and_combinators() {
        let doc = Document::parse(PAGE);
        assert_eq!(texts(&doc, "li.active"), vec!["Two"]);
        assert_eq!(texts(&doc, "#app > p"), vec!["First"]);
        assert_eq!(texts(&doc, "#app p"), vec!["First", "Nested"]);
        assert_eq!(texts(&doc, "ul.menu li[data-x='3']"), vec!["Three"]);
        assert_eq!(texts(&doc, "li:first-child, li:last-child"), vec!["One", "Three"]);
    }

    #[test]
    fn test_nth_child_counts_all_siblings() {
        let doc = Document::parse(
            "<html><body><div><span>s</span><p>a</p><p>b</p></div></body></html>",
        );
        // Native semantics: position among all element siblings.
        assert_eq!(texts(&doc, "div > p:nth-child(2)"), vec!["a"]);
        assert_eq!(texts(&doc, "div > p:nth-child(3)"), vec!["b"]);
        assert_eq!(texts(&doc, "div > :nth-child(odd)"), vec!["s", "b"]);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(SelectorList::parse("   "), Err(QueryError::Empty));
        assert!(matches!(SelectorList::parse("div >"), Err(_)));
        assert!(matches!(SelectorList::parse("a:hover"), Err(QueryError::Unsupported(_))));
        assert!(matches!(SelectorList::parse("a,,b"), Err(_)));
        assert!(SelectorList::parse("*").is_ok());
    }
}
