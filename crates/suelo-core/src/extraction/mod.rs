pub mod pdftotext;

use crate::error::SueloError;

/// A positioned fragment of page text with its bounding box, in page
/// coordinates (top-left origin, y grows downward).
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub text: String,
    pub x0: f32,
    pub x1: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Token {
    pub fn new(text: impl Into<String>, x0: f32, x1: f32, top: f32, bottom: f32) -> Self {
        Token {
            text: text.into(),
            x0,
            x1,
            top,
            bottom,
        }
    }

    /// Vertical midpoint, used for row clustering.
    pub fn ymid(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }

    /// Horizontal midpoint, used for column bucketing.
    pub fn xmid(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }
}

/// Content extracted from a single page of a document.
#[derive(Debug, Clone)]
pub struct PageContent {
    pub page_number: usize,
    /// Plain text of the page, used for relevance checks and field patterns.
    pub text: String,
    /// Positioned word tokens, used for table layout reconstruction.
    pub tokens: Vec<Token>,
}

/// Trait for document decoding backends.
pub trait DocumentDecoder: Send + Sync {
    /// Decode raw document bytes, returning one PageContent per page.
    fn decode_pages(&self, bytes: &[u8]) -> Result<Vec<PageContent>, SueloError>;

    /// Name of this decoding backend (for diagnostics).
    fn backend_name(&self) -> &str;
}
