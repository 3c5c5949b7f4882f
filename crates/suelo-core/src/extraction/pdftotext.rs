use crate::error::SueloError;
use crate::extraction::{DocumentDecoder, PageContent, Token};
use std::io::Write;
use std::process::Command;

/// Document decoding backend using pdftotext (from poppler-utils).
///
/// Uses `pdftotext -bbox-layout`, which reports word-level bounding
/// boxes: exactly the token geometry the layout extractor needs. Page
/// plain text is rebuilt from the same words, line by line.
pub struct PdftotextDecoder;

impl PdftotextDecoder {
    pub fn new() -> Self {
        PdftotextDecoder
    }

    /// Check if pdftotext is available on the system.
    pub fn is_available() -> bool {
        Command::new("pdftotext")
            .arg("-v")
            .output()
            .map(|o| o.status.success() || !o.stderr.is_empty())
            .unwrap_or(false)
    }
}

impl Default for PdftotextDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentDecoder for PdftotextDecoder {
    fn decode_pages(&self, bytes: &[u8]) -> Result<Vec<PageContent>, SueloError> {
        // Write PDF bytes to a temp file
        let mut tmpfile =
            tempfile::NamedTempFile::new().map_err(|e| SueloError::Decode(e.to_string()))?;
        tmpfile
            .write_all(bytes)
            .map_err(|e| SueloError::Decode(e.to_string()))?;

        let output = Command::new("pdftotext")
            .arg("-bbox-layout")
            .arg(tmpfile.path())
            .arg("-") // output to stdout
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    SueloError::PdftotextNotFound
                } else {
                    SueloError::Decode(format!("pdftotext failed: {}", e))
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(SueloError::PdftotextFailed { code, stderr });
        }

        let xml = String::from_utf8_lossy(&output.stdout);
        let pages = parse_bbox_pages(&xml);
        tracing::debug!(pages = pages.len(), "decoded document with pdftotext");
        Ok(pages)
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

/// Parse `pdftotext -bbox-layout` XML into pages of word tokens.
///
/// The output is line-oriented, one tag per line, so plain attribute
/// scanning is enough; no XML parser needed.
fn parse_bbox_pages(xml: &str) -> Vec<PageContent> {
    let mut pages: Vec<PageContent> = Vec::new();
    let mut tokens: Vec<Token> = Vec::new();
    let mut text_lines: Vec<String> = Vec::new();
    let mut line_words: Vec<String> = Vec::new();
    let mut in_page = false;

    for raw in xml.lines() {
        let line = raw.trim();

        if line.starts_with("<page") {
            in_page = true;
            continue;
        }

        if line.starts_with("</page>") {
            if in_page {
                pages.push(PageContent {
                    page_number: pages.len() + 1,
                    text: text_lines.join("\n"),
                    tokens: std::mem::take(&mut tokens),
                });
                text_lines.clear();
            }
            in_page = false;
            continue;
        }

        if line.starts_with("<word ") {
            if let Some(token) = parse_word(line) {
                line_words.push(token.text.clone());
                tokens.push(token);
            }
            continue;
        }

        if line.starts_with("</line>") && !line_words.is_empty() {
            text_lines.push(line_words.join(" "));
            line_words.clear();
        }
    }

    pages
}

fn parse_word(word_tag: &str) -> Option<Token> {
    let start = word_tag.find('>')? + 1;
    let end = word_tag.rfind("</word>")?;
    let text = decode_xml_entities(word_tag[start..end].trim());
    if text.is_empty() {
        return None;
    }
    Some(Token {
        text,
        x0: parse_attr_f32(word_tag, "xMin")?,
        x1: parse_attr_f32(word_tag, "xMax")?,
        top: parse_attr_f32(word_tag, "yMin")?,
        bottom: parse_attr_f32(word_tag, "yMax")?,
    })
}

fn parse_attr_f32(tag: &str, name: &str) -> Option<f32> {
    parse_attr(tag, name)?.parse().ok()
}

fn parse_attr<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!("{}=\"", name);
    let start = tag.find(&needle)? + needle.len();
    let rest = &tag[start..];
    let end = rest.find('"')?;
    Some(&rest[..end])
}

fn decode_xml_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
}
