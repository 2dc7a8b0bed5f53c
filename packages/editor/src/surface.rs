//! # Live Surface
//!
//! The single live editing surface: the active page's content plus the
//! current selection. The content tree is the source of truth; rendering is
//! a projection the host derives from it.
//!
//! Positions address a node by index path. Inside text and placeholder nodes
//! the offset counts chars; inside elements it is a child index. The empty
//! path addresses the page root.

use clause_markup::{Content, Element, Node, NodePath, Placeholder};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SurfaceError {
    #[error("No editable position at {0:?}")]
    InvalidPosition(NodePath),

    #[error("Node at {0:?} is not an element")]
    NotAnElement(NodePath),

    #[error("Caret is not inside a table")]
    NotInTable,
}

/// Caret location
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Position {
    pub path: NodePath,
    pub offset: usize,
}

impl Position {
    pub fn new(path: NodePath, offset: usize) -> Self {
        Self { path, offset }
    }
}

/// Anchor is where the selection started, focus where it ends
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Position,
    pub focus: Position,
}

impl Selection {
    pub fn caret(position: Position) -> Self {
        Self {
            anchor: position.clone(),
            focus: position,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// `(path, start, end)` when both ends sit in the same node
    pub fn single_node_range(&self) -> Option<(NodePath, usize, usize)> {
        if self.anchor.path != self.focus.path {
            return None;
        }
        let start = self.anchor.offset.min(self.focus.offset);
        let end = self.anchor.offset.max(self.focus.offset);
        Some((self.anchor.path.clone(), start, end))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaretMove {
    Left,
    Right,
    Home,
    End,
}

/// What the caret path points at
enum Target {
    Root,
    Text,
    Placeholder,
    Void,
    Container,
}

/// Node adjacent to a caret, as seen by deletion
enum Neighbor {
    Text,
    Atomic,
    Boundary,
}

const CELL_TAGS: &[&str] = &["td", "th"];
const EMPTY_CELL: &str = "\u{a0}";
const TABLE_STYLE: &str = "width: 100%; border-collapse: collapse; margin: 10px 0;";
const CELL_STYLE: &str = "border: 1px solid #ddd; padding: 4px;";
const DIVIDER_STYLE: &str = "border-bottom: 2px dashed #adb5bd; margin: 20px 0; display: flex; align-items: center; justify-content: center; color: #868e96; font-size: 12px;";
const HANGING_INDENT: &str = "21px";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveSurface {
    content: Content,
    selection: Selection,
}

impl LiveSurface {
    pub fn new(content: Content) -> Self {
        let selection = Selection::caret(start_of(&content));
        Self { content, selection }
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    /// Programmatic write; the caret returns to the start of the first block
    pub fn set_content(&mut self, content: Content) {
        self.selection = Selection::caret(start_of(&content));
        self.content = content;
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn place_caret(&mut self, position: Position) -> Result<(), SurfaceError> {
        self.check(&position)?;
        self.selection = Selection::caret(position);
        Ok(())
    }

    pub fn select(&mut self, anchor: Position, focus: Position) -> Result<(), SurfaceError> {
        self.check(&anchor)?;
        self.check(&focus)?;
        self.selection = Selection { anchor, focus };
        Ok(())
    }

    pub fn placeholder(&self, path: &[usize]) -> Option<&Placeholder> {
        self.content.node(path).and_then(Node::as_placeholder)
    }

    /// Length of the addressed node in position units
    pub fn node_len(&self, path: &[usize]) -> Result<usize, SurfaceError> {
        if path.is_empty() {
            return Ok(self.content.nodes.len());
        }
        match self.content.node(path) {
            Some(Node::Text(text)) => Ok(text.chars().count()),
            Some(Node::Placeholder(placeholder)) => Ok(placeholder.char_len()),
            Some(Node::Element(element)) => Ok(element.children.len()),
            _ => Err(SurfaceError::InvalidPosition(path.to_vec())),
        }
    }

    fn check(&self, position: &Position) -> Result<(), SurfaceError> {
        if position.offset <= self.node_len(&position.path)? {
            Ok(())
        } else {
            Err(SurfaceError::InvalidPosition(position.path.clone()))
        }
    }

    fn target(&self, path: &[usize]) -> Result<Target, SurfaceError> {
        if path.is_empty() {
            return Ok(Target::Root);
        }
        match self.content.node(path) {
            Some(Node::Text(_)) => Ok(Target::Text),
            Some(Node::Placeholder(_)) => Ok(Target::Placeholder),
            Some(Node::Element(element)) if element.is_void() => Ok(Target::Void),
            Some(Node::Element(_)) => Ok(Target::Container),
            _ => Err(SurfaceError::InvalidPosition(path.to_vec())),
        }
    }

    fn children_mut(&mut self, parent: &[usize]) -> Result<&mut Vec<Node>, SurfaceError> {
        self.content
            .children_mut(parent)
            .ok_or_else(|| SurfaceError::NotAnElement(parent.to_vec()))
    }

    fn text_mut(&mut self, path: &[usize]) -> Result<&mut String, SurfaceError> {
        match self.content.node_mut(path) {
            Some(Node::Text(text)) => Ok(text),
            Some(Node::Placeholder(placeholder)) => Ok(&mut placeholder.text),
            _ => Err(SurfaceError::InvalidPosition(path.to_vec())),
        }
    }

    pub fn element_mut(&mut self, path: &[usize]) -> Result<&mut Element, SurfaceError> {
        self.content
            .node_mut(path)
            .and_then(Node::as_element_mut)
            .ok_or_else(|| SurfaceError::NotAnElement(path.to_vec()))
    }

    // ---------------------------------------------------------------
    // Typing
    // ---------------------------------------------------------------

    /// Insert text at the caret, replacing a single-node selection first
    pub fn insert_text(&mut self, text: &str) -> Result<(), SurfaceError> {
        if text.is_empty() {
            return Ok(());
        }
        self.delete_selection()?;
        let caret = self.selection.focus.clone();
        let inserted = text.chars().count();

        match self.target(&caret.path)? {
            Target::Text | Target::Placeholder => {
                insert_chars(self.text_mut(&caret.path)?, caret.offset, text);
                self.selection = Selection::caret(Position::new(caret.path, caret.offset + inserted));
                Ok(())
            }
            Target::Void => {
                let (parent, index) = split_last(&caret.path);
                self.insert_text_at(parent, index + 1, text)
            }
            Target::Root | Target::Container => self.insert_text_at(&caret.path, caret.offset, text),
        }
    }

    fn insert_text_at(&mut self, parent: &[usize], index: usize, text: &str) -> Result<(), SurfaceError> {
        let children = self.children_mut(parent)?;
        let index = index.min(children.len());
        let mut path = parent.to_vec();

        if index > 0 {
            if let Node::Text(previous) = &mut children[index - 1] {
                previous.push_str(text);
                let len = previous.chars().count();
                path.push(index - 1);
                self.selection = Selection::caret(Position::new(path, len));
                return Ok(());
            }
        }

        children.insert(index, Node::text(text));
        path.push(index);
        self.selection = Selection::caret(Position::new(path, text.chars().count()));
        Ok(())
    }

    /// Delete a single-node selection; a selection spanning nodes collapses to its focus
    pub fn delete_selection(&mut self) -> Result<bool, SurfaceError> {
        if self.selection.is_collapsed() {
            return Ok(false);
        }
        let Some((path, start, end)) = self.selection.single_node_range() else {
            self.selection = Selection::caret(self.selection.focus.clone());
            return Ok(false);
        };

        match self.target(&path)? {
            Target::Text | Target::Placeholder => remove_chars(self.text_mut(&path)?, start, end),
            Target::Root | Target::Container => {
                let children = self.children_mut(&path)?;
                let end = end.min(children.len());
                children.drain(start.min(end)..end);
            }
            Target::Void => {}
        }
        self.selection = Selection::caret(Position::new(path, start));
        Ok(true)
    }

    /// Backspace. A placeholder right before the caret goes as a whole.
    pub fn delete_backward(&mut self) -> Result<bool, SurfaceError> {
        if !self.selection.is_collapsed() {
            return self.delete_selection();
        }
        let caret = self.selection.focus.clone();

        match self.target(&caret.path)? {
            Target::Text | Target::Placeholder if caret.offset > 0 => {
                remove_chars(self.text_mut(&caret.path)?, caret.offset - 1, caret.offset);
                self.selection = Selection::caret(Position::new(caret.path, caret.offset - 1));
                Ok(true)
            }
            Target::Text | Target::Placeholder => {
                let (parent, index) = split_last(&caret.path);
                self.remove_before(parent, index)
            }
            Target::Void => {
                let (parent, index) = split_last(&caret.path);
                self.remove_before(parent, index + 1)
            }
            Target::Root | Target::Container => self.remove_before(&caret.path, caret.offset),
        }
    }

    /// Forward delete
    pub fn delete_forward(&mut self) -> Result<bool, SurfaceError> {
        if !self.selection.is_collapsed() {
            return self.delete_selection();
        }
        let caret = self.selection.focus.clone();

        match self.target(&caret.path)? {
            Target::Text | Target::Placeholder if caret.offset < self.node_len(&caret.path)? => {
                remove_chars(self.text_mut(&caret.path)?, caret.offset, caret.offset + 1);
                Ok(true)
            }
            Target::Text | Target::Placeholder | Target::Void => {
                let (parent, index) = split_last(&caret.path);
                self.remove_at(parent, index + 1)
            }
            Target::Root | Target::Container => self.remove_at(&caret.path, caret.offset),
        }
    }

    fn neighbor(&mut self, parent: &[usize], index: usize) -> Result<Option<Neighbor>, SurfaceError> {
        let children = self.children_mut(parent)?;
        Ok(match children.get(index) {
            Some(Node::Text(text)) if !text.is_empty() => Some(Neighbor::Text),
            Some(Node::Element(element)) if !element.is_void() => Some(Neighbor::Boundary),
            Some(_) => Some(Neighbor::Atomic),
            None => None,
        })
    }

    fn remove_before(&mut self, parent: &[usize], index: usize) -> Result<bool, SurfaceError> {
        if index == 0 {
            return Ok(false);
        }
        let mut path = parent.to_vec();
        match self.neighbor(parent, index - 1)? {
            Some(Neighbor::Text) => {
                path.push(index - 1);
                let text = self.text_mut(&path)?;
                text.pop();
                let len = text.chars().count();
                self.selection = Selection::caret(Position::new(path, len));
                Ok(true)
            }
            Some(Neighbor::Atomic) => {
                self.children_mut(parent)?.remove(index - 1);
                self.selection = Selection::caret(Position::new(path, index - 1));
                Ok(true)
            }
            Some(Neighbor::Boundary) | None => Ok(false),
        }
    }

    fn remove_at(&mut self, parent: &[usize], index: usize) -> Result<bool, SurfaceError> {
        let mut path = parent.to_vec();
        match self.neighbor(parent, index)? {
            Some(Neighbor::Text) => {
                path.push(index);
                remove_chars(self.text_mut(&path)?, 0, 1);
                Ok(true)
            }
            Some(Neighbor::Atomic) => {
                self.children_mut(parent)?.remove(index);
                Ok(true)
            }
            Some(Neighbor::Boundary) | None => Ok(false),
        }
    }

    /// Move the caret within its node; vertical movement is left to the host
    pub fn move_caret(&mut self, direction: CaretMove) -> Result<(), SurfaceError> {
        let focus = self.selection.focus.clone();
        let len = self.node_len(&focus.path)?;
        let offset = match direction {
            CaretMove::Left => focus.offset.saturating_sub(1),
            CaretMove::Right => (focus.offset + 1).min(len),
            CaretMove::Home => 0,
            CaretMove::End => len,
        };
        self.selection = Selection::caret(Position::new(focus.path, offset));
        Ok(())
    }

    // ---------------------------------------------------------------
    // Node insertion
    // ---------------------------------------------------------------

    /// Splice nodes in at the caret, splitting a text node if needed.
    ///
    /// Nothing is ever inserted inside a placeholder: with the caret in one,
    /// the nodes land right after it. Returns the parent path and the index of
    /// the first inserted node.
    pub fn splice_at_caret(&mut self, mut nodes: Vec<Node>) -> Result<(NodePath, usize), SurfaceError> {
        self.delete_selection()?;
        let caret = self.selection.focus.clone();

        match self.target(&caret.path)? {
            Target::Text => {
                let (parent, index) = split_last(&caret.path);
                let text = std::mem::take(self.text_mut(&caret.path)?);
                let split = char_to_byte(&text, caret.offset);
                let (before, after) = text.split_at(split);

                if !after.is_empty() {
                    match nodes.last_mut() {
                        Some(Node::Text(last)) => last.push_str(after),
                        _ => nodes.push(Node::text(after)),
                    }
                }
                let mut replacement = Vec::with_capacity(nodes.len() + 1);
                if !before.is_empty() {
                    replacement.push(Node::text(before));
                }
                let first = index + replacement.len();
                replacement.extend(nodes);

                self.children_mut(parent)?.splice(index..=index, replacement);
                Ok((parent.to_vec(), first))
            }
            Target::Placeholder | Target::Void => {
                let (parent, index) = split_last(&caret.path);
                self.insert_children(parent, index + 1, nodes)
            }
            Target::Root | Target::Container => self.insert_children(&caret.path, caret.offset, nodes),
        }
    }

    fn insert_children(
        &mut self,
        parent: &[usize],
        index: usize,
        nodes: Vec<Node>,
    ) -> Result<(NodePath, usize), SurfaceError> {
        let children = self.children_mut(parent)?;
        let index = index.min(children.len());
        children.splice(index..index, nodes);
        Ok((parent.to_vec(), index))
    }

    /// Insert a block right after the top-level node holding the caret
    fn insert_block(&mut self, nodes: Vec<Node>) -> Result<NodePath, SurfaceError> {
        let focus = &self.selection.focus;
        let index = match focus.path.first() {
            Some(top) => top + 1,
            None => focus.offset,
        };
        let (_, first) = self.insert_children(&[], index, nodes)?;
        Ok(vec![first])
    }

    /// Insert a single node at the caret and put the caret after it
    pub fn insert_node(&mut self, node: Node) -> Result<NodePath, SurfaceError> {
        let (mut path, index) = self.splice_at_caret(vec![node])?;
        self.selection = Selection::caret(Position::new(path.clone(), index + 1));
        path.push(index);
        Ok(path)
    }

    // ---------------------------------------------------------------
    // Styling
    // ---------------------------------------------------------------

    pub fn set_style(&mut self, path: &[usize], property: &str, value: &str) -> Result<(), SurfaceError> {
        self.element_mut(path)?.set_style(property, value);
        Ok(())
    }

    /// Nearest block element containing `path` (inclusive)
    pub fn closest_block(&self, path: &[usize]) -> Option<NodePath> {
        self.find_ancestor(path, |element| element.is_block())
    }

    fn find_ancestor(&self, path: &[usize], predicate: impl Fn(&Element) -> bool) -> Option<NodePath> {
        (1..=path.len())
            .rev()
            .map(|len| &path[..len])
            .find(|prefix| {
                matches!(self.content.node(prefix), Some(Node::Element(element)) if predicate(element))
            })
            .map(<[usize]>::to_vec)
    }

    /// Apply an inline style to the selected range of one node.
    ///
    /// A text range is split out into a styled `span`; a placeholder is
    /// wrapped whole. Returns `false` when there is nothing to style.
    pub fn apply_inline_style(&mut self, property: &str, value: &str) -> Result<bool, SurfaceError> {
        let Some((path, start, end)) = self.selection.single_node_range() else {
            return Ok(false);
        };

        match self.target(&path)? {
            Target::Placeholder => {
                let (parent, index) = split_last(&path);
                let children = self.children_mut(parent)?;
                let placeholder = children.remove(index);
                let span = Element::new("span")
                    .with_attribute("style", &format!("{}: {};", property, value))
                    .with_children(vec![placeholder]);
                children.insert(index, Node::Element(span));

                let mut wrapped = path.clone();
                wrapped.push(0);
                self.selection = Selection {
                    anchor: Position::new(wrapped.clone(), start),
                    focus: Position::new(wrapped, end),
                };
                Ok(true)
            }
            Target::Text if start < end => {
                let (parent, index) = split_last(&path);
                let text = self.text_mut(&path)?.clone();
                let (from, to) = (char_to_byte(&text, start), char_to_byte(&text, end));

                if from == 0 && to == text.len() && self.is_sole_span_child(&path) {
                    self.set_style(parent, property, value)?;
                    return Ok(true);
                }

                let span = Element::new("span")
                    .with_attribute("style", &format!("{}: {};", property, value))
                    .with_children(vec![Node::text(&text[from..to])]);
                let mut replacement = Vec::new();
                if from > 0 {
                    replacement.push(Node::text(&text[..from]));
                }
                let span_index = index + replacement.len();
                replacement.push(Node::Element(span));
                if to < text.len() {
                    replacement.push(Node::text(&text[to..]));
                }
                self.children_mut(parent)?.splice(index..=index, replacement);

                let mut selected = parent.to_vec();
                selected.extend([span_index, 0]);
                self.selection = Selection {
                    anchor: Position::new(selected.clone(), 0),
                    focus: Position::new(selected, end - start),
                };
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn is_sole_span_child(&self, path: &[usize]) -> bool {
        let (parent, _) = split_last(path);
        matches!(
            self.content.node(parent),
            Some(Node::Element(element)) if element.tag == "span" && element.children.len() == 1
        )
    }

    /// Apply a block style to every block the selection touches. Returns the count styled.
    pub fn apply_block_style(&mut self, property: &str, value: &str) -> Result<usize, SurfaceError> {
        let start = self.closest_block(&self.selection.anchor.path);
        let end = self.closest_block(&self.selection.focus.path);

        let targets: Vec<NodePath> = match (start, end) {
            (Some(a), Some(b)) if a == b => vec![a],
            (Some(a), Some(b)) if a.len() == b.len() && a[..a.len() - 1] == b[..b.len() - 1] => {
                let (parent, first) = split_last(&a);
                let last = *b.last().unwrap_or(&first);
                let (low, high) = (first.min(last), first.max(last));
                let children = self.content.children(parent).cloned().unwrap_or_default();
                (low..=high)
                    .filter(|i| matches!(children.get(*i), Some(Node::Element(e)) if e.is_block()))
                    .map(|i| {
                        let mut path = parent.to_vec();
                        path.push(i);
                        path
                    })
                    .collect()
            }
            (a, b) => a.into_iter().chain(b).collect(),
        };

        for path in &targets {
            self.set_style(path, property, value)?;
        }
        Ok(targets.len())
    }

    /// Toggle a hanging indent on the caret's block. Returns `true` when applied.
    pub fn toggle_hanging_indent(&mut self) -> Result<bool, SurfaceError> {
        let Some(block) = self.closest_block(&self.selection.focus.path) else {
            return Ok(false);
        };
        let element = self.element_mut(&block)?;
        let hanging = element
            .style("text-indent")
            .is_some_and(|indent| indent.starts_with('-'));

        if hanging {
            element.remove_style("text-indent");
            element.remove_style("padding-left");
            element.remove_style("margin-left");
            Ok(false)
        } else {
            element.set_style("text-indent", &format!("-{}", HANGING_INDENT));
            element.set_style("padding-left", HANGING_INDENT);
            Ok(true)
        }
    }

    // ---------------------------------------------------------------
    // Tables, images, dividers
    // ---------------------------------------------------------------

    /// Insert a `rows` x `cols` table after the caret's block; the caret moves to the first cell
    pub fn insert_table(&mut self, rows: usize, cols: usize) -> Result<NodePath, SurfaceError> {
        let cell = || {
            Node::Element(
                Element::new("td")
                    .with_attribute("style", CELL_STYLE)
                    .with_children(vec![Node::text(EMPTY_CELL)]),
            )
        };
        let body = (0..rows.max(1))
            .map(|_| Node::Element(Element::new("tr").with_children((0..cols.max(1)).map(|_| cell()).collect())))
            .collect();
        let table = Element::new("table")
            .with_attribute("style", TABLE_STYLE)
            .with_children(vec![Node::Element(Element::new("tbody").with_children(body))]);

        let path = self.insert_block(vec![Node::Element(table)])?;
        let mut first_cell = path.clone();
        first_cell.extend([0, 0, 0, 0]);
        self.selection = Selection::caret(Position::new(first_cell, 0));
        Ok(path)
    }

    fn caret_cell(&self) -> Result<(NodePath, NodePath), SurfaceError> {
        let cell = self
            .find_ancestor(&self.selection.focus.path, |e| CELL_TAGS.contains(&e.tag.as_str()))
            .ok_or(SurfaceError::NotInTable)?;
        let row = self
            .find_ancestor(&cell, |e| e.tag == "tr")
            .ok_or(SurfaceError::NotInTable)?;
        Ok((cell, row))
    }

    fn caret_table(&self) -> Result<NodePath, SurfaceError> {
        self.find_ancestor(&self.selection.focus.path, |e| e.tag == "table")
            .ok_or(SurfaceError::NotInTable)
    }

    fn table_rows(&self, table: &[usize]) -> Vec<NodePath> {
        let mut rows = Vec::new();
        let Some(children) = self.content.children(table) else {
            return rows;
        };
        for (i, child) in children.iter().enumerate() {
            let Some(element) = child.as_element() else { continue };
            let mut path = table.to_vec();
            path.push(i);
            if element.tag == "tr" {
                rows.push(path);
            } else if matches!(element.tag.as_str(), "tbody" | "thead" | "tfoot") {
                for (j, row) in element.children.iter().enumerate() {
                    if row.as_element().is_some_and(|r| r.tag == "tr") {
                        let mut row_path = path.clone();
                        row_path.push(j);
                        rows.push(row_path);
                    }
                }
            }
        }
        rows
    }

    /// Duplicate the caret's row (cells emptied) right below it
    pub fn add_table_row(&mut self) -> Result<NodePath, SurfaceError> {
        let (_, row) = self.caret_cell()?;
        let mut copy = self.element_mut(&row)?.clone();
        for cell in copy.children.iter_mut().filter_map(Node::as_element_mut) {
            cell.children = vec![Node::text(EMPTY_CELL)];
        }
        let (parent, index) = split_last(&row);
        let (mut path, at) = self.insert_children(parent, index + 1, vec![Node::Element(copy)])?;
        path.push(at);
        Ok(path)
    }

    /// Add an empty column right of the caret's column, in every row
    pub fn add_table_column(&mut self) -> Result<usize, SurfaceError> {
        let (cell, row) = self.caret_cell()?;
        let table = self.caret_table()?;
        let cell_index = *cell.last().ok_or(SurfaceError::NotInTable)?;
        let column = self
            .content
            .children(&row)
            .map(|cells| cells[..cell_index].iter().filter(|n| is_cell(n)).count())
            .unwrap_or(0);

        let mut added = 0;
        for row_path in self.table_rows(&table) {
            let cells = self.children_mut(&row_path)?;
            let Some(position) = cells
                .iter()
                .enumerate()
                .filter(|(_, n)| is_cell(n))
                .nth(column)
                .map(|(i, _)| i)
            else {
                continue;
            };
            let mut copy = cells[position].clone();
            if let Some(element) = copy.as_element_mut() {
                element.children = vec![Node::text(EMPTY_CELL)];
            }
            cells.insert(position + 1, copy);
            added += 1;
        }
        Ok(added)
    }

    /// Remove the table holding the caret
    pub fn delete_table(&mut self) -> Result<(), SurfaceError> {
        let table = self.caret_table()?;
        let (parent, index) = split_last(&table);
        self.children_mut(parent)?.remove(index);
        self.selection = Selection::caret(Position::new(parent.to_vec(), index));
        Ok(())
    }

    /// Insert an image at the caret
    pub fn insert_image(&mut self, src: &str) -> Result<NodePath, SurfaceError> {
        self.insert_node(Node::Element(Element::new("img").with_attribute("src", src)))
    }

    /// Insert a visual in-page divider followed by an empty line
    pub fn insert_page_divider(&mut self) -> Result<NodePath, SurfaceError> {
        let divider = Element::new("div")
            .with_attribute("contenteditable", "false")
            .with_attribute("style", DIVIDER_STYLE)
            .with_children(vec![Node::text("-- 페이지 나누기 --")]);
        let line = Element::new("div").with_children(vec![Node::Element(Element::new("br"))]);
        let path = self.insert_block(vec![Node::Element(divider), Node::Element(line)])?;
        self.selection = Selection::caret(Position::new(vec![path[0] + 1], 0));
        Ok(path)
    }
}

/// First caret slot of `content`: descend through leading containers, stopping in a text node
fn start_of(content: &Content) -> Position {
    let mut path = Vec::new();
    let mut nodes = &content.nodes;
    loop {
        match nodes.first() {
            Some(Node::Element(element)) if !element.is_void() => {
                path.push(0);
                nodes = &element.children;
            }
            Some(Node::Text(_)) => {
                path.push(0);
                return Position::new(path, 0);
            }
            _ => return Position::new(path, 0),
        }
    }
}

fn is_cell(node: &Node) -> bool {
    node.as_element()
        .is_some_and(|e| CELL_TAGS.contains(&e.tag.as_str()))
}

/// Split a non-empty path into parent path and last index
fn split_last(path: &[usize]) -> (&[usize], usize) {
    match path.split_last() {
        Some((last, parent)) => (parent, *last),
        None => (path, 0),
    }
}

fn char_to_byte(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}

fn insert_chars(text: &mut String, offset: usize, insert: &str) {
    let at = char_to_byte(text, offset);
    text.insert_str(at, insert);
}

fn remove_chars(text: &mut String, start: usize, end: usize) {
    let from = char_to_byte(text, start);
    let to = char_to_byte(text, end);
    text.replace_range(from..to, "");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clause_markup::{parse, serialize, FieldType};

    fn surface(markup: &str) -> LiveSurface {
        LiveSurface::new(parse(markup).unwrap())
    }

    #[test]
    fn test_insert_text_in_text_node() {
        let mut surface = surface("<p>Helo</p>");
        surface.place_caret(Position::new(vec![0, 0], 3)).unwrap();
        surface.insert_text("l").unwrap();
        assert_eq!(serialize(surface.content()), "<p>Hello</p>");
        assert_eq!(surface.selection().focus, Position::new(vec![0, 0], 4));
    }

    #[test]
    fn test_insert_text_in_empty_paragraph() {
        let mut surface = LiveSurface::new(Content::blank());
        surface.place_caret(Position::new(vec![0], 0)).unwrap();
        surface.insert_text("가").unwrap();
        surface.insert_text("나").unwrap();
        assert_eq!(serialize(surface.content()), "<p>가나<br></p>");
    }

    #[test]
    fn test_replace_single_node_selection() {
        let mut surface = surface("<p>Hello world</p>");
        surface
            .select(Position::new(vec![0, 0], 6), Position::new(vec![0, 0], 11))
            .unwrap();
        surface.insert_text("there").unwrap();
        assert_eq!(serialize(surface.content()), "<p>Hello there</p>");
    }

    #[test]
    fn test_backspace_removes_placeholder_atomically() {
        let mut surface = LiveSurface::new(Content::new(vec![Node::Element(
            Element::new("p").with_children(vec![
                Node::text("A "),
                Node::Placeholder(Placeholder::new(FieldType::Text, "name")),
                Node::text("\u{a0}B"),
            ]),
        )]));
        surface.place_caret(Position::new(vec![0, 2], 0)).unwrap();
        assert!(surface.delete_backward().unwrap());
        assert!(surface.content().placeholders().is_empty());
        assert_eq!(surface.selection().focus, Position::new(vec![0], 1));
    }

    #[test]
    fn test_backspace_stops_at_block_boundary() {
        let mut surface = surface("<p>a</p><p>b</p>");
        surface.place_caret(Position::new(vec![1, 0], 0)).unwrap();
        assert!(!surface.delete_backward().unwrap());
        surface.place_caret(Position::new(vec![1], 0)).unwrap();
        assert!(!surface.delete_backward().unwrap());
        assert_eq!(serialize(surface.content()), "<p>a</p><p>b</p>");
    }

    #[test]
    fn test_delete_forward_in_text() {
        let mut surface = surface("<p>abc</p>");
        surface.place_caret(Position::new(vec![0, 0], 1)).unwrap();
        assert!(surface.delete_forward().unwrap());
        assert_eq!(serialize(surface.content()), "<p>ac</p>");
    }

    #[test]
    fn test_splice_inside_placeholder_lands_after_it() {
        let mut surface = LiveSurface::new(Content::new(vec![Node::Placeholder(Placeholder::new(
            FieldType::Text,
            "a",
        ))]));
        surface.place_caret(Position::new(vec![0], 2)).unwrap();
        let (parent, first) = surface.splice_at_caret(vec![Node::text("x")]).unwrap();
        assert!(parent.is_empty());
        assert_eq!(first, 1);
        assert_eq!(surface.content().nodes.len(), 2);
    }

    #[test]
    fn test_font_size_wraps_selected_text() {
        let mut surface = surface("<p>Hello world</p>");
        surface
            .select(Position::new(vec![0, 0], 0), Position::new(vec![0, 0], 5))
            .unwrap();
        assert!(surface.apply_inline_style("font-size", "14pt").unwrap());
        assert_eq!(
            serialize(surface.content()),
            r#"<p><span style="font-size: 14pt;">Hello</span> world</p>"#
        );

        // Restyling the same run reuses the span
        assert!(surface.apply_inline_style("font-size", "18pt").unwrap());
        assert_eq!(
            serialize(surface.content()),
            r#"<p><span style="font-size: 18pt;">Hello</span> world</p>"#
        );
    }

    #[test]
    fn test_styled_placeholder_keeps_selection_on_it() {
        let mut surface = LiveSurface::new(Content::new(vec![Node::Element(
            Element::new("p").with_children(vec![
                Node::text("A "),
                Node::Placeholder(Placeholder::new(FieldType::Text, "name")),
            ]),
        )]));
        surface
            .select(Position::new(vec![0, 1], 0), Position::new(vec![0, 1], 8))
            .unwrap();
        assert!(surface.apply_inline_style("font-size", "14pt").unwrap());
        assert_eq!(surface.selection().single_node_range(), Some((vec![0, 1, 0], 0, 8)));

        surface.insert_text("x").unwrap();
        let placeholders = surface.content().placeholders();
        assert_eq!(placeholders.len(), 1);
        assert_eq!(placeholders[0].0, vec![0, 1, 0]);
        assert_eq!(placeholders[0].1.text, "x");
    }

    #[test]
    fn test_set_content_puts_caret_in_first_block() {
        let mut surface = surface("<p>a</p>");
        surface.set_content(Content::blank());
        assert_eq!(surface.selection().focus, Position::new(vec![0], 0));
        surface.insert_text("x").unwrap();
        assert_eq!(serialize(surface.content()), "<p>x<br></p>");

        surface.set_content(Content::starter());
        assert_eq!(surface.selection().focus, Position::new(vec![0, 0], 0));
        surface.insert_text("새 ").unwrap();
        assert_eq!(surface.content().nodes.len(), 4);
        assert!(surface.content().text_content().starts_with("새 계약서 제목"));

        surface.set_content(Content::default());
        assert_eq!(surface.selection().focus, Position::default());
    }

    #[test]
    fn test_block_style_across_paragraphs() {
        let mut surface = surface("<p>a</p><p>b</p><p>c</p>");
        surface
            .select(Position::new(vec![0, 0], 0), Position::new(vec![2, 0], 1))
            .unwrap();
        assert_eq!(surface.apply_block_style("line-height", "2.0").unwrap(), 3);
        assert_eq!(
            serialize(surface.content()),
            r#"<p style="line-height: 2.0;">a</p><p style="line-height: 2.0;">b</p><p style="line-height: 2.0;">c</p>"#
        );
    }

    #[test]
    fn test_hanging_indent_toggles() {
        let mut surface = surface("<p>1. 조항</p>");
        surface.place_caret(Position::new(vec![0, 0], 0)).unwrap();
        assert!(surface.toggle_hanging_indent().unwrap());
        assert_eq!(
            serialize(surface.content()),
            r#"<p style="text-indent: -21px; padding-left: 21px;">1. 조항</p>"#
        );
        assert!(!surface.toggle_hanging_indent().unwrap());
        assert_eq!(serialize(surface.content()), "<p>1. 조항</p>");
    }

    #[test]
    fn test_table_operations() {
        let mut surface = surface("<p>intro</p>");
        surface.place_caret(Position::new(vec![0, 0], 5)).unwrap();
        let table = surface.insert_table(2, 2).unwrap();
        assert_eq!(table, vec![1]);

        let row = surface.add_table_row().unwrap();
        assert_eq!(row, vec![1, 0, 1]);
        assert_eq!(surface.add_table_column().unwrap(), 3);

        let tbody = surface.content().node(&[1, 0]).and_then(Node::as_element).unwrap();
        assert_eq!(tbody.children.len(), 3);
        assert!(tbody
            .children
            .iter()
            .all(|row| row.as_element().unwrap().children.len() == 3));

        surface.delete_table().unwrap();
        assert_eq!(serialize(surface.content()), "<p>intro</p>");
    }

    #[test]
    fn test_table_ops_outside_table_fail() {
        let mut surface = surface("<p>x</p>");
        surface.place_caret(Position::new(vec![0, 0], 0)).unwrap();
        assert_eq!(surface.add_table_row(), Err(SurfaceError::NotInTable));
        assert_eq!(surface.delete_table(), Err(SurfaceError::NotInTable));
    }

    #[test]
    fn test_insert_image_and_divider() {
        let mut surface = surface("<p>ab</p>");
        surface.place_caret(Position::new(vec![0, 0], 1)).unwrap();
        let image = surface.insert_image("data:image/png;base64,AAAA").unwrap();
        assert_eq!(image, vec![0, 1]);
        assert_eq!(
            serialize(surface.content()),
            r#"<p>a<img src="data:image/png;base64,AAAA">b</p>"#
        );

        surface.insert_page_divider().unwrap();
        assert_eq!(surface.content().nodes.len(), 3);
        assert_eq!(surface.selection().focus, Position::new(vec![2], 0));
    }

    #[test]
    fn test_invalid_caret_rejected() {
        let mut surface = surface("<p>ab</p>");
        assert!(surface.place_caret(Position::new(vec![0, 0], 3)).is_err());
        assert!(surface.place_caret(Position::new(vec![4], 0)).is_err());
    }
}
