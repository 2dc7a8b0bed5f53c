//! # Variable Engine
//!
//! Creates placeholders at the caret, derives the field schema from page
//! content on save, and turns stored `{{key}}` text back into placeholders on
//! load.
//!
//! Hydration works on the parsed tree: only text nodes outside placeholders
//! are scanned, so a placeholder can never end up inside another one.

use crate::errors::EditorError;
use crate::surface::{LiveSurface, Position, Selection, SurfaceError};
use clause_markup::{derive_key, display_text, parse, split_pages, Content, FieldType, Node, Placeholder};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Spacer inserted after a new placeholder so the caret can leave it
pub const SPACER: &str = "\u{a0}";

/// Schema entry describing one fillable field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableField {
    pub key: String,
    pub label: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default, alias = "placeholder")]
    pub placeholder_hint: String,
}

impl VariableField {
    pub fn new(field_type: FieldType, label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            key: derive_key(&label),
            placeholder_hint: placeholder_hint(&label),
            label,
            field_type,
        }
    }

    /// Placeholder node carrying this field's metadata
    pub fn to_placeholder(&self) -> Placeholder {
        Placeholder {
            key: self.key.clone(),
            label: self.label.clone(),
            field_type: self.field_type.clone(),
            text: display_text(&self.label),
            extra: Vec::new(),
        }
    }
}

/// Prompt shown in the fill-in form
pub fn placeholder_hint(label: &str) -> String {
    format!("{} 을(를) 입력하세요", label)
}

/// Validate a label and build the placeholder to insert
pub fn prepare_placeholder(field_type: FieldType, label: &str) -> Result<Placeholder, EditorError> {
    let label = label.trim();
    if label.is_empty() {
        return Err(EditorError::EmptyVariableLabel);
    }
    Ok(Placeholder::new(field_type, label))
}

/// Splice a placeholder and its spacer at the caret; the caret ends after the spacer
pub fn insert_placeholder(surface: &mut LiveSurface, placeholder: Placeholder) -> Result<(), SurfaceError> {
    let nodes = vec![Node::Placeholder(placeholder), Node::text(SPACER)];
    let (mut spacer, first) = surface.splice_at_caret(nodes)?;
    spacer.push(first + 1);
    surface.place_caret(Position::new(spacer, SPACER.chars().count()))
}

/// Outcome of a pointer press on a placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerSelection {
    /// Whole placeholder text selected; the next key replaces it
    WholeNode,
    /// Caret handling left to the default behavior
    Default,
}

/// Pointer pressed on the placeholder at `path`.
///
/// Coming from outside the node selects its whole text; a press while the
/// selection is already inside keeps default caret placement.
pub fn select_on_pointer(surface: &mut LiveSurface, path: &[usize]) -> Result<PointerSelection, SurfaceError> {
    let len = match surface.placeholder(path) {
        Some(placeholder) => placeholder.char_len(),
        None => return Ok(PointerSelection::Default),
    };
    let selection: &Selection = surface.selection();
    if selection.anchor.path == path || selection.focus.path == path {
        return Ok(PointerSelection::Default);
    }

    surface.select(Position::new(path.to_vec(), 0), Position::new(path.to_vec(), len))?;
    Ok(PointerSelection::WholeNode)
}

/// Schema of every non-empty placeholder across `pages`, in document order.
///
/// Entries are derived from what the placeholder currently shows, so a
/// placeholder whose text was overtyped yields a field for the new text.
pub fn collect_schema(pages: &[Content]) -> Vec<VariableField> {
    pages
        .iter()
        .flat_map(|page| page.placeholders())
        .filter_map(|(_, placeholder)| {
            let label = placeholder.visible_label();
            if label.is_empty() {
                return None;
            }
            Some(VariableField::new(placeholder.field_type.clone(), label))
        })
        .collect()
}

/// Keys used by more than one schema entry, in first-seen order
pub fn duplicate_keys(schema: &[VariableField]) -> Vec<&str> {
    let mut duplicates: Vec<&str> = Vec::new();
    for (i, field) in schema.iter().enumerate() {
        let repeated = schema[..i].iter().any(|earlier| earlier.key == field.key);
        if repeated && !duplicates.contains(&field.key.as_str()) {
            duplicates.push(&field.key);
        }
    }
    duplicates
}

/// Replace `{{key}}` text outside placeholders with placeholders for the matching field
pub fn hydrate(content: Content, schema: &[VariableField]) -> Content {
    let tokens: Vec<(String, &VariableField)> = schema
        .iter()
        .filter(|field| !field.key.is_empty() && !field.field_type.is_section())
        .map(|field| (display_text(&field.key), field))
        .collect();

    if tokens.is_empty() {
        return content;
    }
    Content::new(hydrate_nodes(content.nodes, &tokens))
}

fn hydrate_nodes(nodes: Vec<Node>, tokens: &[(String, &VariableField)]) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Text(text) => split_text(&text, tokens, &mut out),
            Node::Element(mut element) => {
                element.children = hydrate_nodes(std::mem::take(&mut element.children), tokens);
                out.push(Node::Element(element));
            }
            other => out.push(other),
        }
    }
    out
}

fn split_text(text: &str, tokens: &[(String, &VariableField)], out: &mut Vec<Node>) {
    let mut rest = text;
    // Earliest match wins; on a tie the longer token
    while let Some((at, len, field)) = tokens
        .iter()
        .filter_map(|(token, field)| rest.find(token.as_str()).map(|at| (at, token.len(), *field)))
        .min_by_key(|(at, len, _)| (*at, std::cmp::Reverse(*len)))
    {
        if at > 0 {
            out.push(Node::text(&rest[..at]));
        }
        out.push(Node::Placeholder(field.to_placeholder()));
        rest = &rest[at + len..];
    }
    if !rest.is_empty() {
        out.push(Node::text(rest));
    }
}

/// Parse and hydrate one stored page; an unparseable page comes back blank
pub fn deserialize_page(markup: &str, schema: &[VariableField]) -> Content {
    match parse(markup) {
        Ok(content) => hydrate(content, schema),
        Err(err) => {
            warn!(error = %err, "unparseable page replaced with a blank page");
            Content::blank()
        }
    }
}

/// Split a stored document into hydrated pages (always at least one)
pub fn deserialize_document(document: &str, schema: &[VariableField]) -> Vec<Content> {
    split_pages(document)
        .into_iter()
        .map(|page| deserialize_page(page, schema))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clause_markup::serialize;

    fn field(key: &str, label: &str, field_type: FieldType) -> VariableField {
        VariableField {
            key: key.to_string(),
            label: label.to_string(),
            field_type,
            placeholder_hint: placeholder_hint(label),
        }
    }

    #[test]
    fn test_prepare_placeholder_derives_key() {
        let placeholder = prepare_placeholder(FieldType::Date, "  계약  일자 ").unwrap();
        assert_eq!(placeholder.key, "계약_일자");
        assert_eq!(placeholder.text, "{{계약  일자}}");
        assert!(matches!(
            prepare_placeholder(FieldType::Text, " \t "),
            Err(EditorError::EmptyVariableLabel)
        ));
    }

    #[test]
    fn test_insert_placeholder_places_caret_after_spacer() {
        let mut surface = LiveSurface::new(parse("<p>AB</p>").unwrap());
        surface.place_caret(Position::new(vec![0, 0], 1)).unwrap();
        let placeholder = prepare_placeholder(FieldType::Text, "name").unwrap();
        insert_placeholder(&mut surface, placeholder).unwrap();

        assert_eq!(
            serialize(surface.content()),
            concat!(
                r#"<p>A<span class="contract-variable" data-type="variable" data-var-type="text" "#,
                r#"data-key="name" data-label="name">{{name}}</span>&nbsp;B</p>"#
            )
        );
        assert_eq!(surface.selection().focus, Position::new(vec![0, 2], 1));
    }

    #[test]
    fn test_pointer_from_outside_selects_whole_node() {
        let mut surface = LiveSurface::new(Content::new(vec![
            Node::text("x "),
            Node::Placeholder(Placeholder::new(FieldType::Text, "성명")),
        ]));
        surface.place_caret(Position::new(vec![0], 1)).unwrap();

        assert_eq!(select_on_pointer(&mut surface, &[1]).unwrap(), PointerSelection::WholeNode);
        assert_eq!(surface.selection().single_node_range(), Some((vec![1], 0, 6)));

        // Already inside: default behavior
        assert_eq!(select_on_pointer(&mut surface, &[1]).unwrap(), PointerSelection::Default);

        // Typing now replaces the placeholder text
        surface.insert_text("홍").unwrap();
        assert_eq!(surface.placeholder(&[1]).unwrap().text, "홍");
    }

    #[test]
    fn test_collect_schema_skips_empty_labels() {
        let mut empty = Placeholder::new(FieldType::Text, "gone");
        empty.text = "{{ }}".to_string();
        let pages = vec![
            Content::new(vec![
                Node::Placeholder(Placeholder::new(FieldType::Currency, "보증 금")),
                Node::Placeholder(empty),
            ]),
            Content::new(vec![Node::Placeholder(Placeholder::new(FieldType::Signature, "서명"))]),
        ];

        let schema = collect_schema(&pages);
        assert_eq!(
            schema,
            vec![
                field("보증_금", "보증 금", FieldType::Currency),
                field("서명", "서명", FieldType::Signature),
            ]
        );
        assert_eq!(schema[0].placeholder_hint, "보증 금 을(를) 입력하세요");
    }

    #[test]
    fn test_duplicate_keys_reported() {
        let schema = vec![
            field("a_b", "a b", FieldType::Text),
            field("c", "c", FieldType::Text),
            field("a_b", "a  b", FieldType::Date),
            field("a_b", "a b", FieldType::Text),
        ];
        assert_eq!(duplicate_keys(&schema), vec!["a_b"]);
    }

    #[test]
    fn test_hydrate_wraps_text_tokens() {
        let schema = vec![field("client_name", "client_name", FieldType::Text)];
        let content = hydrate(parse("<p>Hello {{client_name}}!</p>").unwrap(), &schema);
        let placeholders = content.placeholders();
        assert_eq!(placeholders.len(), 1);
        assert_eq!(placeholders[0].0, vec![0, 1]);
        assert_eq!(placeholders[0].1.key, "client_name");
        assert_eq!(content.text_content(), "Hello {{client_name}}!");
    }

    #[test]
    fn test_hydrate_never_touches_existing_placeholders() {
        let schema = vec![field("price", "매매 대금", FieldType::Currency)];
        let mut existing = Placeholder::new(FieldType::Currency, "매매 대금");
        existing.text = "{{price}}".to_string();
        let content = hydrate(Content::new(vec![Node::Placeholder(existing.clone())]), &schema);
        assert_eq!(content.nodes, vec![Node::Placeholder(existing)]);
    }

    #[test]
    fn test_hydrate_skips_sections() {
        let schema = vec![field("header", "header", FieldType::Other("section".into()))];
        let content = hydrate(parse("<p>{{header}}</p>").unwrap(), &schema);
        assert!(content.placeholders().is_empty());
    }

    #[test]
    fn test_deserialize_document_degrades_bad_pages() {
        let schema = vec![field("a", "a", FieldType::Text)];
        let pages = deserialize_document(
            "<p>{{a}}</p><!-- GENUINE_PAGE_BREAK --><p><b>broken</p>",
            &schema,
        );
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].placeholders().len(), 1);
        assert_eq!(pages[1], Content::blank());
    }
}
