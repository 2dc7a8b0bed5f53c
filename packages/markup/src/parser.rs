use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::tokenizer::{parse_start_tag, tokenize, Token};

/// Parser for stored template markup
pub struct Parser<'src> {
    source: &'src str,
    stack: Vec<OpenElement>,
    root: Vec<Node>,
}

struct OpenElement {
    element: Element,
    pos: usize,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            stack: Vec::new(),
            root: Vec::new(),
        }
    }

    /// Parse a complete page payload
    pub fn parse_content(mut self) -> ParseResult<Content> {
        for (token, span) in tokenize(self.source)? {
            match token {
                Token::Comment(text) => self.push_node(Node::Comment(text.to_string())),
                Token::Text(text) => self.push_text(&decode_entities(text)),
                Token::Lt => self.push_text("<"),
                Token::StartTag(raw) => {
                    let tag = parse_start_tag(raw);
                    let mut element = Element::new(tag.name);
                    element.attributes = tag
                        .attributes
                        .into_iter()
                        .map(|attr| Attribute {
                            name: attr.name,
                            value: attr.value.as_deref().map(decode_entities),
                        })
                        .collect();

                    if element.is_void() || tag.self_closing {
                        self.push_node(finish_element(element));
                    } else {
                        self.stack.push(OpenElement {
                            element,
                            pos: span.start,
                        });
                    }
                }
                Token::EndTag(name) => {
                    let name = name.to_ascii_lowercase();
                    if VOID_ELEMENTS.contains(&name.as_str()) {
                        continue;
                    }
                    match self.stack.pop() {
                        Some(open) if open.element.tag == name => {
                            self.push_node(finish_element(open.element));
                        }
                        _ => return Err(ParseError::unexpected_end_tag(span.start, name)),
                    }
                }
            }
        }

        if let Some(open) = self.stack.pop() {
            return Err(ParseError::unclosed_element(open.pos, open.element.tag));
        }

        Ok(Content::new(self.root))
    }

    fn siblings(&mut self) -> &mut Vec<Node> {
        match self.stack.last_mut() {
            Some(open) => &mut open.element.children,
            None => &mut self.root,
        }
    }

    fn push_node(&mut self, node: Node) {
        self.siblings().push(node);
    }

    /// Adjacent text runs are merged into one node
    fn push_text(&mut self, text: &str) {
        let siblings = self.siblings();
        if let Some(Node::Text(previous)) = siblings.last_mut() {
            previous.push_str(text);
        } else {
            siblings.push(Node::text(text));
        }
    }
}

/// Parse a page payload into structured content
pub fn parse(source: &str) -> ParseResult<Content> {
    Parser::new(source).parse_content()
}

fn is_placeholder_span(element: &Element) -> bool {
    element.tag == "span" && element.attribute("data-type") == Some("variable")
}

fn finish_element(element: Element) -> Node {
    if is_placeholder_span(&element) {
        Node::Placeholder(placeholder_from_span(element))
    } else {
        Node::Element(element)
    }
}

/// Build a placeholder from a closed `span[data-type=variable]`.
///
/// Children were finished first, so a nested placeholder span already arrives
/// here as a `Node::Placeholder`. The outer attributes win; the outer text is
/// replaced by the inner placeholder text.
fn placeholder_from_span(element: Element) -> Placeholder {
    let mut nested = Vec::new();
    collect_nested(&element.children, &mut nested);

    let text: String = if nested.is_empty() {
        element.children.iter().map(Node::text_content).collect()
    } else {
        nested.concat()
    };

    let label = element
        .attribute("data-label")
        .filter(|label| !label.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| text.replace("{{", "").replace("}}", "").trim().to_string());
    let key = element
        .attribute("data-key")
        .filter(|key| !key.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| derive_key(&label));
    let field_type = FieldType::from(element.attribute("data-var-type").unwrap_or("text"));
    let extra = element
        .attributes
        .into_iter()
        .filter(|attr| {
            !PLACEHOLDER_ATTRIBUTES
                .iter()
                .any(|owned| attr.name.eq_ignore_ascii_case(owned))
        })
        .collect();

    Placeholder {
        key,
        label,
        field_type,
        text,
        extra,
    }
}

fn collect_nested(nodes: &[Node], out: &mut Vec<String>) {
    for node in nodes {
        match node {
            Node::Placeholder(placeholder) => out.push(placeholder.text.clone()),
            Node::Element(element) => collect_nested(&element.children, out),
            _ => {}
        }
    }
}

/// Decode the named and numeric character references used by stored markup
pub fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest
            .find(';')
            .filter(|end| *end <= 10)
            .and_then(|end| decode_entity(&rest[1..end]).map(|c| (c, end)));

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" | "#39" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_paragraph() {
        let content = parse("<p>Hello <b>world</b></p>").unwrap();
        assert_eq!(content.nodes.len(), 1);
        let p = content.nodes[0].as_element().unwrap();
        assert_eq!(p.tag, "p");
        assert_eq!(p.children[0], Node::text("Hello "));
        assert_eq!(content.text_content(), "Hello world");
    }

    #[test]
    fn test_void_and_self_closing() {
        let content = parse("<p>a<br>b<br/>c<img src=\"x.png\"></p><div/>").unwrap();
        let p = content.nodes[0].as_element().unwrap();
        assert_eq!(p.children.len(), 6);
        assert_eq!(p.children[5].as_element().unwrap().attribute("src"), Some("x.png"));
        assert!(content.nodes[1].as_element().unwrap().children.is_empty());
    }

    #[test]
    fn test_placeholder_span_becomes_placeholder() {
        let source = r#"<p><span class="contract-variable" data-type="variable" data-var-type="date" data-key="계약_일자" data-label="계약 일자" style="margin: 0 2px;">{{계약 일자}}</span></p>"#;
        let content = parse(source).unwrap();
        let found = content.placeholders();
        let (path, placeholder) = &found[0];
        assert_eq!(*path, vec![0, 0]);
        assert_eq!(placeholder.key, "계약_일자");
        assert_eq!(placeholder.label, "계약 일자");
        assert_eq!(placeholder.field_type, FieldType::Date);
        assert_eq!(placeholder.text, "{{계약 일자}}");
        assert_eq!(placeholder.extra, vec![Attribute::new("style", "margin: 0 2px;")]);
    }

    #[test]
    fn test_nested_placeholder_spans_flatten() {
        let source = concat!(
            r#"<span data-type="variable" data-var-type="currency" data-key="price" data-label="price" style="font-weight: 500;">"#,
            r#"<span class="contract-variable" data-type="variable" data-var-type="text" data-key="price" data-label="매매 대금">{{매매 대금}}</span>"#,
            r#"</span>"#
        );
        let content = parse(source).unwrap();
        assert_eq!(content.nodes.len(), 1);
        let Node::Placeholder(placeholder) = &content.nodes[0] else {
            panic!("expected placeholder");
        };
        assert_eq!(placeholder.field_type, FieldType::Currency);
        assert_eq!(placeholder.label, "price");
        assert_eq!(placeholder.text, "{{매매 대금}}");
        assert_eq!(placeholder.extra, vec![Attribute::new("style", "font-weight: 500;")]);
    }

    #[test]
    fn test_placeholder_without_metadata_uses_text() {
        let content = parse(r#"<span data-type="variable">{{ 임차인 성명 }}</span>"#).unwrap();
        let placeholder = content.nodes[0].as_placeholder().unwrap();
        assert_eq!(placeholder.label, "임차인 성명");
        assert_eq!(placeholder.key, "임차인_성명");
        assert_eq!(placeholder.field_type, FieldType::Text);
    }

    #[test]
    fn test_mismatched_end_tag() {
        assert_eq!(
            parse("<p><b>x</p>"),
            Err(ParseError::unexpected_end_tag(7, "p"))
        );
        assert_eq!(parse("<p>x"), Err(ParseError::unclosed_element(0, "p")));
        assert!(parse("</p>").is_err());
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a&nbsp;&amp;&lt;b&gt;"), "a\u{a0}&<b>");
        assert_eq!(decode_entities("&#44592;&#x41;"), "기A");
        assert_eq!(decode_entities("AT&T &unknown;"), "AT&T &unknown;");
    }
}
