use crate::ast::*;

/// Token separating page payloads inside a stored document
pub const PAGE_DELIMITER: &str = "<!-- GENUINE_PAGE_BREAK -->";

/// Serializer converts structured content back to stored markup.
///
/// Placeholders are written as `span[data-type=variable]` elements carrying
/// their key, label and type as attributes, since the visible `{{label}}`
/// text alone cannot restore them.
pub struct Serializer {
    output: String,
}

impl Serializer {
    pub fn new() -> Self {
        Self {
            output: String::new(),
        }
    }

    /// Serialize a page's content to markup
    pub fn serialize(mut self, content: &Content) -> String {
        for node in &content.nodes {
            self.serialize_node(node);
        }
        self.output
    }

    fn serialize_node(&mut self, node: &Node) {
        match node {
            Node::Element(element) => self.serialize_element(element),
            Node::Text(text) => escape_text(text, &mut self.output),
            Node::Placeholder(placeholder) => self.serialize_placeholder(placeholder),
            Node::Comment(text) => {
                self.output.push_str("<!--");
                self.output.push_str(text);
                self.output.push_str("-->");
            }
        }
    }

    fn serialize_element(&mut self, element: &Element) {
        self.output.push('<');
        self.output.push_str(&element.tag);
        for attr in &element.attributes {
            self.serialize_attribute(&attr.name, attr.value.as_deref());
        }
        self.output.push('>');

        if element.is_void() {
            return;
        }

        for child in &element.children {
            self.serialize_node(child);
        }
        self.output.push_str("</");
        self.output.push_str(&element.tag);
        self.output.push('>');
    }

    fn serialize_placeholder(&mut self, placeholder: &Placeholder) {
        self.output.push_str("<span");
        self.serialize_attribute("class", Some(PLACEHOLDER_CLASS));
        self.serialize_attribute("data-type", Some("variable"));
        self.serialize_attribute("data-var-type", Some(placeholder.field_type.as_str()));
        self.serialize_attribute("data-key", Some(&placeholder.key));
        self.serialize_attribute("data-label", Some(&placeholder.label));
        for attr in &placeholder.extra {
            self.serialize_attribute(&attr.name, attr.value.as_deref());
        }
        self.output.push('>');
        escape_text(&placeholder.text, &mut self.output);
        self.output.push_str("</span>");
    }

    fn serialize_attribute(&mut self, name: &str, value: Option<&str>) {
        self.output.push(' ');
        self.output.push_str(name);
        if let Some(value) = value {
            self.output.push_str("=\"");
            escape_attribute(value, &mut self.output);
            self.output.push('"');
        }
    }
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize a page's content to markup
pub fn serialize(content: &Content) -> String {
    Serializer::new().serialize(content)
}

/// Split a stored document into its page payloads (always at least one)
pub fn split_pages(document: &str) -> Vec<&str> {
    document.split(PAGE_DELIMITER).collect()
}

/// Join page payloads into a single stored document
pub fn join_pages<S: AsRef<str>>(pages: &[S]) -> String {
    pages
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(PAGE_DELIMITER)
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}
