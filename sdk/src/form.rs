use bytes::{BufMut, Bytes, BytesMut};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters escaped in `Content-Disposition` names, following the HTML
/// form submission rules: quotes and line breaks.
const DISPOSITION_ENCODE_SET: &AsciiSet = &CONTROLS.add(b'"');

/// Multipart payload sent by [`Client::upload`](crate::Client::upload).
///
/// ```
/// use airx_sdk::FormData;
///
/// let form = FormData::new()
///     .text("album", "hangar")
///     .file("photo", "drone.png", "image/png", vec![0x89, 0x50, 0x4e, 0x47]);
/// assert_eq!(form.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Part {
    name: String,
    filename: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

impl FormData {
    /// Create an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text field.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(Part {
            name: name.into(),
            filename: None,
            content_type: None,
            data: Bytes::from(value.into()),
        });
        self
    }

    /// Append a file.
    pub fn file(
        mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        self.parts.push(Part {
            name: name.into(),
            filename: Some(filename.into()),
            content_type: Some(content_type.into()),
            data: data.into(),
        });
        self
    }

    /// Number of parts.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether the form has no part.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Get the value of the first text field with given name.
    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.parts
            .iter()
            .filter(|p| p.filename.is_none() && p.name == name)
            .find_map(|p| std::str::from_utf8(&p.data).ok())
    }

    /// Encode the form as a `multipart/form-data` body.
    pub fn encode(&self, boundary: &str) -> Bytes {
        let mut buf = BytesMut::new();

        for part in &self.parts {
            buf.put_slice(b"--");
            buf.put_slice(boundary.as_bytes());
            buf.put_slice(b"\r\nContent-Disposition: form-data; name=\"");
            buf.put_slice(escape(&part.name).as_bytes());
            buf.put_slice(b"\"");
            if let Some(filename) = &part.filename {
                buf.put_slice(b"; filename=\"");
                buf.put_slice(escape(filename).as_bytes());
                buf.put_slice(b"\"");
            }
            buf.put_slice(b"\r\n");
            if let Some(content_type) = &part.content_type {
                buf.put_slice(b"Content-Type: ");
                buf.put_slice(content_type.as_bytes());
                buf.put_slice(b"\r\n");
            }
            buf.put_slice(b"\r\n");
            buf.put_slice(&part.data);
            buf.put_slice(b"\r\n");
        }
        buf.put_slice(b"--");
        buf.put_slice(boundary.as_bytes());
        buf.put_slice(b"--\r\n");

        buf.freeze()
    }
}

fn escape(s: &str) -> String {
    utf8_percent_encode(s, DISPOSITION_ENCODE_SET).to_string()
}

/// Generate a random multipart boundary.
pub fn generate_boundary() -> String {
    format!("airx-boundary-{}", hex::encode(rand::random::<[u8; 12]>()))
}

/// Content type header value for given boundary.
pub fn multipart_content_type(boundary: &str) -> String {
    format!("multipart/form-data; boundary={boundary}")
}
