use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{IonError, IonResult};

/// Symbol ID. IDs are 1-based; `0` is the reserved "no text" symbol.
pub type Sid = u32;

/// A symbol as seen by readers and writers: text, a SID, or both.
///
/// Two tokens are equal when both carry text and the texts match, or when
/// neither carries text and the SIDs match. A token with text never equals a
/// token without text.
#[derive(Debug, Clone)]
pub struct SymbolToken {
    text: Option<String>,
    sid: Option<Sid>,
}

impl SymbolToken {
    pub fn new(text: impl Into<String>, sid: Sid) -> Self {
        Self {
            text: Some(text.into()),
            sid: Some(sid),
        }
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            sid: None,
        }
    }

    pub fn with_sid(sid: Sid) -> Self {
        Self {
            text: None,
            sid: Some(sid),
        }
    }

    pub(crate) fn from_parts(text: Option<String>, sid: Option<Sid>) -> Self {
        Self { text, sid }
    }

    /// Returns the text, failing with [`IonError::UnknownSymbol`] when the
    /// token only carries a SID.
    pub fn text(&self) -> IonResult<&str> {
        self.text
            .as_deref()
            .ok_or(IonError::UnknownSymbol(self.sid.unwrap_or(0)))
    }

    pub fn text_opt(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn sid(&self) -> Option<Sid> {
        self.sid
    }

    pub fn is_unknown(&self) -> bool {
        self.text.is_none()
    }

    /// True when the token names `text`, either directly or through `sid`.
    pub(crate) fn matches(&self, text: &str, sid: Sid) -> bool {
        match &self.text {
            Some(own) => own == text,
            None => self.sid == Some(sid),
        }
    }
}

impl PartialEq for SymbolToken {
    fn eq(&self, other: &Self) -> bool {
        match (&self.text, &other.text) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.sid == other.sid,
            _ => false,
        }
    }
}

impl Eq for SymbolToken {}

impl Hash for SymbolToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.text {
            Some(text) => {
                state.write_u8(1);
                text.hash(state);
            }
            None => {
                state.write_u8(0);
                self.sid.hash(state);
            }
        }
    }
}

impl fmt::Display for SymbolToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.text, self.sid) {
            (Some(text), _) => f.write_str(text),
            (None, Some(sid)) => write!(f, "${sid}"),
            (None, None) => f.write_str("$0"),
        }
    }
}

impl From<&str> for SymbolToken {
    fn from(text: &str) -> Self {
        Self::with_text(text)
    }
}

impl From<String> for SymbolToken {
    fn from(text: String) -> Self {
        Self::with_text(text)
    }
}

impl From<Sid> for SymbolToken {
    fn from(sid: Sid) -> Self {
        Self::with_sid(sid)
    }
}
