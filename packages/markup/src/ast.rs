use serde::{Deserialize, Serialize};
use std::fmt;

/// Index path from the root node list down through element children
pub type NodePath = Vec<usize>;

/// Elements that never take an end tag
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "hr", "img", "input", "link", "meta", "source", "wbr",
];

/// Elements that count as blocks for block-level styling
pub const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "td", "th", "blockquote",
];

/// Class carried by every placeholder span
pub const PLACEHOLDER_CLASS: &str = "contract-variable";

/// Attributes owned by the placeholder variant itself (everything else is kept in `extra`)
pub(crate) const PLACEHOLDER_ATTRIBUTES: &[&str] =
    &["class", "data-type", "data-var-type", "data-key", "data-label"];

/// Structured content of a single page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub nodes: Vec<Node>,
}

/// A node in the content tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Element(Element),
    Text(String),
    Placeholder(Placeholder),
    Comment(String),
}

/// Element with attributes and children (`<p>`, `<table>`, `<img>`, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

/// Attribute in source order; `value` is `None` for bare attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
}

/// Named, typed inline field rendered as `{{label}}`.
///
/// A placeholder is a leaf: it holds display text, never child nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placeholder {
    pub key: String,
    pub label: String,
    pub field_type: FieldType,
    pub text: String,
    /// Presentation attributes kept verbatim (`style`, ...)
    pub extra: Vec<Attribute>,
}

/// Kind of value a variable field collects
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    #[default]
    Text,
    Date,
    Currency,
    Signature,
    /// Legacy kinds found in stored schemas (`number`, `money`, `section`, ...)
    Other(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Text => "text",
            FieldType::Date => "date",
            FieldType::Currency => "currency",
            FieldType::Signature => "signature",
            FieldType::Other(kind) => kind,
        }
    }

    /// Section headers in legacy schemas describe form layout, not content
    pub fn is_section(&self) -> bool {
        matches!(self, FieldType::Other(kind) if kind == "section")
    }
}

impl From<&str> for FieldType {
    fn from(value: &str) -> Self {
        match value.trim() {
            "" | "text" => FieldType::Text,
            "date" => FieldType::Date,
            "currency" => FieldType::Currency,
            "signature" => FieldType::Signature,
            other => FieldType::Other(other.to_string()),
        }
    }
}

impl From<String> for FieldType {
    fn from(value: String) -> Self {
        FieldType::from(value.as_str())
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive a field key from a label: trimmed, whitespace runs replaced with `_`
pub fn derive_key(label: &str) -> String {
    label.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Literal display text of a placeholder: `{{label}}`
pub fn display_text(label: &str) -> String {
    format!("{{{{{}}}}}", label)
}

impl Placeholder {
    pub fn new(field_type: FieldType, label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            key: derive_key(&label),
            text: display_text(&label),
            label,
            field_type,
            extra: Vec::new(),
        }
    }

    /// Visible text with the `{{`/`}}` markers removed and trimmed
    pub fn visible_label(&self) -> String {
        self.text.replace("{{", "").replace("}}", "").trim().to_string()
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.tag.as_str())
    }

    pub fn is_block(&self) -> bool {
        BLOCK_ELEMENTS.contains(&self.tag.as_str())
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
            .map(|attr| attr.value.as_deref().unwrap_or(""))
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) {
        match self
            .attributes
            .iter_mut()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
        {
            Some(attr) => attr.value = Some(value.to_string()),
            None => self.attributes.push(Attribute::new(name, value)),
        }
    }

    pub fn remove_attribute(&mut self, name: &str) {
        self.attributes
            .retain(|attr| !attr.name.eq_ignore_ascii_case(name));
    }

    /// Read one property of the inline `style` attribute
    pub fn style(&self, property: &str) -> Option<String> {
        parse_style(self.attribute("style")?)
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(property))
            .map(|(_, value)| value)
    }

    /// Set one property of the inline `style` attribute, keeping the others in order
    pub fn set_style(&mut self, property: &str, value: &str) {
        let mut declarations = self.attribute("style").map(parse_style).unwrap_or_default();
        match declarations
            .iter_mut()
            .find(|(name, _)| name.eq_ignore_ascii_case(property))
        {
            Some(entry) => entry.1 = value.to_string(),
            None => declarations.push((property.to_string(), value.to_string())),
        }
        self.write_style(declarations);
    }

    pub fn remove_style(&mut self, property: &str) {
        let Some(style) = self.attribute("style") else {
            return;
        };
        let mut declarations = parse_style(style);
        declarations.retain(|(name, _)| !name.eq_ignore_ascii_case(property));
        self.write_style(declarations);
    }

    fn write_style(&mut self, declarations: Vec<(String, String)>) {
        if declarations.is_empty() {
            self.remove_attribute("style");
            return;
        }
        let style = declarations
            .iter()
            .map(|(name, value)| format!("{}: {};", name, value))
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attribute("style", &style);
    }
}

fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|declaration| {
            let (name, value) = declaration.split_once(':')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

impl Node {
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(value.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_placeholder(&self) -> Option<&Placeholder> {
        match self {
            Node::Placeholder(placeholder) => Some(placeholder),
            _ => None,
        }
    }

    /// Concatenated visible text of this node and its descendants
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Element(element) => {
                for child in &element.children {
                    child.collect_text(out);
                }
            }
            Node::Text(text) => out.push_str(text),
            Node::Placeholder(placeholder) => out.push_str(&placeholder.text),
            Node::Comment(_) => {}
        }
    }
}

impl Content {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Empty editable page: a single paragraph holding a line break
    pub fn blank() -> Self {
        Self::new(vec![Node::Element(
            Element::new("p").with_children(vec![Node::Element(Element::new("br"))]),
        )])
    }

    /// Page a brand-new template opens with
    pub fn starter() -> Self {
        let paragraph = |text: &str| {
            Node::Element(Element::new("p").with_children(vec![Node::text(text)]))
        };
        Self::new(vec![
            Node::Element(
                Element::new("h1")
                    .with_attribute("style", "text-align: center;")
                    .with_children(vec![Node::text("계약서 제목")]),
            ),
            Node::Element(Element::new("p").with_children(vec![Node::Element(Element::new("br"))])),
            paragraph("제 1 조 (목적)"),
            paragraph("본 계약은 ..."),
        ])
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn text_content(&self) -> String {
        self.nodes.iter().map(Node::text_content).collect()
    }

    pub fn node(&self, path: &[usize]) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.nodes.get(*first)?;
        for index in rest {
            node = node.as_element()?.children.get(*index)?;
        }
        Some(node)
    }

    pub fn node_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.nodes.get_mut(*first)?;
        for index in rest {
            node = node.as_element_mut()?.children.get_mut(*index)?;
        }
        Some(node)
    }

    /// Child list of the element at `path` (the root list for an empty path)
    pub fn children_mut(&mut self, path: &[usize]) -> Option<&mut Vec<Node>> {
        if path.is_empty() {
            return Some(&mut self.nodes);
        }
        self.node_mut(path)?
            .as_element_mut()
            .map(|element| &mut element.children)
    }

    pub fn children(&self, path: &[usize]) -> Option<&Vec<Node>> {
        if path.is_empty() {
            return Some(&self.nodes);
        }
        self.node(path)?.as_element().map(|element| &element.children)
    }

    /// Every placeholder with its path, in document order
    pub fn placeholders(&self) -> Vec<(NodePath, &Placeholder)> {
        let mut found = Vec::new();
        let mut path = Vec::new();
        collect_placeholders(&self.nodes, &mut path, &mut found);
        found
    }
}

fn collect_placeholders<'a>(
    nodes: &'a [Node],
    path: &mut NodePath,
    found: &mut Vec<(NodePath, &'a Placeholder)>,
) {
    for (index, node) in nodes.iter().enumerate() {
        path.push(index);
        match node {
            Node::Placeholder(placeholder) => found.push((path.clone(), placeholder)),
            Node::Element(element) => collect_placeholders(&element.children, path, found),
            _ => {}
        }
        path.pop();
    }
}
