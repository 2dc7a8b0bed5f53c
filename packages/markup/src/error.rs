use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unterminated tag or comment at {pos}")]
    UnterminatedTag { pos: usize },

    #[error("Unexpected end tag </{tag}> at {pos}")]
    UnexpectedEndTag { pos: usize, tag: String },

    #[error("Element <{tag}> opened at {pos} is never closed")]
    UnclosedElement { pos: usize, tag: String },
}

impl ParseError {
    pub fn unterminated_tag(pos: usize) -> Self {
        Self::UnterminatedTag { pos }
    }

    pub fn unexpected_end_tag(pos: usize, tag: impl Into<String>) -> Self {
        Self::UnexpectedEndTag {
            pos,
            tag: tag.into(),
        }
    }

    pub fn unclosed_element(pos: usize, tag: impl Into<String>) -> Self {
        Self::UnclosedElement {
            pos,
            tag: tag.into(),
        }
    }

    /// Byte offset the error points at
    pub fn pos(&self) -> usize {
        match self {
            Self::UnterminatedTag { pos }
            | Self::UnexpectedEndTag { pos, .. }
            | Self::UnclosedElement { pos, .. } => *pos,
        }
    }
}
