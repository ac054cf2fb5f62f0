//! multipart/form-data decoding.
//!
//! The decoder works on raw bytes: part boundaries are located by searching
//! for the delimiter, and part contents are sliced by offset, so binary
//! payloads (NUL bytes, stray CR/LF, invalid UTF-8) come through untouched.

use std::collections::HashMap;

use thiserror::Error;

/// Content type assumed for file parts that don't declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

const CRLF: &[u8] = b"\r\n";
const HEADER_END: &[u8] = b"\r\n\r\n";

/// Errors raised while decoding a multipart body.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MultipartError {
    /// The boundary token is empty.
    #[error("multipart boundary is empty")]
    EmptyBoundary,

    /// The Content-Type header carries no usable boundary.
    #[error("missing multipart boundary in content type")]
    MissingBoundary,
}

/// A plain form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartField {
    pub name: String,
    pub value: String,
}

/// An uploaded file part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartFile {
    /// Form field name.
    pub name: String,
    /// Client-side filename.
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

/// Decoded multipart body, parts kept in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartData {
    pub fields: Vec<MultipartField>,
    pub files: Vec<MultipartFile>,
}

impl MultipartData {
    /// Get the value of the first field with this name.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    /// Get the first file part with this field name.
    pub fn file(&self, name: &str) -> Option<&MultipartFile> {
        self.files.iter().find(|f| f.name == name)
    }
}

/// Extract the boundary parameter from a Content-Type header value.
///
/// Returns `None` when there is no boundary or it is empty. Quoted boundaries
/// are unquoted.
pub fn extract_boundary(content_type: &str) -> Option<String> {
    let lower = content_type.to_ascii_lowercase();
    // Only a parameter name counts: the match must directly follow a `;`
    let start = lower
        .match_indices("boundary=")
        .map(|(i, _)| i)
        .find(|&i| lower[..i].trim_end_matches([' ', '\t']).ends_with(';'))?
        + "boundary=".len();
    let rest = &content_type[start..];

    let boundary = if let Some(quoted) = rest.strip_prefix('"') {
        let end = quoted.find('"')?;
        &quoted[..end]
    } else {
        let end = rest
            .find(|c: char| matches!(c, ';' | ' ' | '\t' | '\r' | '\n'))
            .unwrap_or(rest.len());
        &rest[..end]
    };

    if boundary.is_empty() {
        None
    } else {
        Some(boundary.to_string())
    }
}

/// Decode a multipart body.
///
/// Parts without headers or without a `name` disposition parameter are
/// skipped. A body with no terminating delimiter yields the parts found
/// before the truncation.
pub fn decode(body: &[u8], boundary: &str) -> Result<MultipartData, MultipartError> {
    if boundary.is_empty() {
        return Err(MultipartError::EmptyBoundary);
    }

    let delimiter = [b"--", boundary.as_bytes()].concat();
    // Every delimiter after the first starts on its own line
    let separator = [CRLF, delimiter.as_slice()].concat();

    let mut data = MultipartData::default();

    let Some(mut pos) = find(body, &delimiter, 0) else {
        return Ok(data);
    };

    loop {
        let after = pos + delimiter.len();
        if body[after..].starts_with(b"--") {
            break;
        }

        let Some(line_end) = find(body, CRLF, after) else {
            break;
        };
        let content_start = line_end + CRLF.len();

        // An empty part places the separator's CRLF right before content_start
        let Some(content_end) = find(body, &separator, content_start - CRLF.len()) else {
            break;
        };
        let part = &body[content_start..content_end.max(content_start)];

        decode_part(part, &mut data);

        pos = content_end + CRLF.len();
    }

    Ok(data)
}

fn decode_part(part: &[u8], data: &mut MultipartData) {
    let Some(header_end) = find(part, HEADER_END, 0) else {
        return;
    };
    let headers = parse_headers(&part[..header_end]);
    let content = &part[header_end + HEADER_END.len()..];

    let Some(disposition) = headers.get("content-disposition") else {
        return;
    };
    let params = parse_disposition_params(disposition);
    let Some(name) = params.get("name") else {
        return;
    };

    match params.get("filename") {
        Some(filename) => data.files.push(MultipartFile {
            name: name.clone(),
            filename: filename.clone(),
            content_type: headers
                .get("content-type")
                .filter(|ct| !ct.is_empty())
                .cloned()
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            content: content.to_vec(),
        }),
        None => data.fields.push(MultipartField {
            name: name.clone(),
            value: String::from_utf8_lossy(content).into_owned(),
        }),
    }
}

/// Parse header lines into a map keyed by lowercased name. Later duplicates win.
fn parse_headers(section: &[u8]) -> HashMap<String, String> {
    let text = String::from_utf8_lossy(section);
    text.split("\r\n")
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_ascii_lowercase(), value.trim().to_string()))
        .collect()
}

/// Parse the `key=value` parameters of a Content-Disposition value.
///
/// Values may be quoted; inside quotes `;` is literal and `\` escapes the
/// next character.
fn parse_disposition_params(value: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    let mut chars = value.chars().peekable();

    // Skip the disposition type ("form-data")
    for c in chars.by_ref() {
        if c == ';' {
            break;
        }
    }

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace() || *c == ';') {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(&c) = chars.peek() {
            if c == '=' || c == ';' {
                break;
            }
            key.push(c);
            chars.next();
        }

        if chars.next_if_eq(&'=').is_none() {
            // Bare token without a value
            continue;
        }
        while chars.next_if(|c| *c == ' ' || *c == '\t').is_some() {}

        let mut val = String::new();
        if chars.next_if_eq(&'"').is_some() {
            while let Some(c) = chars.next() {
                match c {
                    '"' => break,
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            val.push(escaped);
                        }
                    }
                    _ => val.push(c),
                }
            }
            // Discard anything between the closing quote and the next ';'
            while chars.next_if(|c| *c != ';').is_some() {}
        } else {
            while let Some(c) = chars.next_if(|c| *c != ';') {
                val.push(c);
            }
            val = val.trim_end().to_string();
        }

        params.insert(key.trim().to_ascii_lowercase(), val);
    }

    params
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}
