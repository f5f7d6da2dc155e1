//! Core message data structures

/// Header lines longer than this are folded at spaces on output
const FOLD_WIDTH: usize = 78;

/// Ordered header fields
///
/// Unlike a map, this keeps every occurrence of a field in the order it was
/// received, which matters for trace headers such as `Received` and for
/// writing the article back out. Name lookups are case-insensitive.
///
/// # Examples
///
/// ```
/// use mail2news::message::Headers;
///
/// let mut headers = Headers::new();
/// headers.append("Received", "from a");
/// headers.append("Subject", "Hello");
/// headers.append("Received", "from b");
///
/// assert_eq!(headers.get("subject"), Some("Hello"));
/// assert_eq!(headers.get_all("RECEIVED").collect::<Vec<_>>(), vec!["from a", "from b"]);
///
/// assert_eq!(headers.remove("received"), 2);
/// assert_eq!(headers.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    fields: Vec<(String, String)>,
}

impl Headers {
    /// Create an empty header list
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fields, counting duplicates
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether there are no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over `(name, value)` pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// First value of the named field
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).next()
    }

    /// Every value of the named field, in order
    pub fn get_all<'a, 'n>(
        &'a self,
        name: &'n str,
    ) -> impl Iterator<Item = &'a str> + use<'a, 'n> {
        self.fields
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether the named field occurs at least once
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Add a field at the end
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// Remove every occurrence of the named field, returning how many were removed
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.fields.len();
        self.fields.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        before - self.fields.len()
    }

    /// Replace every occurrence of the named field with a single one at the end
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.remove(&name);
        self.append(name, value);
    }
}

/// An inbound email on its way to becoming a news article
///
/// Header names and order are kept as received; the stages of the gateway
/// edit the message in place and the delivery stage serializes it once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// Header fields
    pub headers: Headers,
    /// Body text with the original line endings
    pub body: String,
}

impl Message {
    /// Create a message from parts
    pub fn new(headers: Headers, body: impl Into<String>) -> Self {
        Self {
            headers,
            body: body.into(),
        }
    }

    /// The Message-ID header, if present
    pub fn message_id(&self) -> Option<&str> {
        self.headers.get("Message-ID")
    }

    /// The Content-Type header, if present
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("Content-Type")
    }

    /// The Content-Transfer-Encoding token, lowercased
    pub fn transfer_encoding(&self) -> Option<String> {
        self.headers
            .get("Content-Transfer-Encoding")
            .map(|v| v.trim().to_ascii_lowercase())
    }

    /// Whether this is a MIME multipart message
    ///
    /// # Examples
    ///
    /// ```
    /// use mail2news::message::{Headers, Message};
    ///
    /// let mut headers = Headers::new();
    /// headers.append("Content-Type", "Multipart/Mixed; boundary=\"xyz\"");
    /// assert!(Message::new(headers, "").is_multipart());
    ///
    /// assert!(!Message::default().is_multipart());
    /// ```
    pub fn is_multipart(&self) -> bool {
        self.content_type()
            .map(|ct| ct.trim_start().to_ascii_lowercase().starts_with("multipart/"))
            .unwrap_or(false)
    }

    /// Serialize to NNTP wire format
    ///
    /// - CRLF line endings
    /// - Headers longer than 78 characters folded at spaces
    /// - Headers, blank line, body
    /// - Dot-stuffing: body lines starting with '.' get an extra '.'
    ///
    /// The terminating `.` line is not included; the client sends it.
    ///
    /// # Examples
    ///
    /// ```
    /// use mail2news::message::{Headers, Message};
    ///
    /// let mut headers = Headers::new();
    /// headers.append("Subject", "dots");
    /// let message = Message::new(headers, ".hidden\nplain\n");
    ///
    /// assert_eq!(message.to_wire(), "Subject: dots\r\n\r\n..hidden\r\nplain\r\n");
    /// ```
    pub fn to_wire(&self) -> String {
        let mut result = String::with_capacity(self.body.len() + 64 * (self.headers.len() + 1));

        for (name, value) in self.headers.iter() {
            push_folded(&mut result, name, value);
        }

        // Blank line separates headers from body
        result.push_str("\r\n");

        for line in self.body.lines() {
            if line.starts_with('.') {
                result.push('.');
            }
            result.push_str(line);
            result.push_str("\r\n");
        }

        result
    }
}

/// Append `name: value` to `out`, folding before a space where the line
/// would pass [`FOLD_WIDTH`]
///
/// Unfolding removes only the inserted CRLF, so the value reads back
/// unchanged. A single word longer than the limit stays on one line.
fn push_folded(out: &mut String, name: &str, value: &str) {
    out.push_str(name);
    out.push(':');
    let mut line_len = name.len() + 1;

    for (index, word) in value.split(' ').enumerate() {
        if index > 0
            && !word.is_empty()
            && line_len + 1 + word.len() > FOLD_WIDTH
            && line_len > name.len() + 1
        {
            out.push_str("\r\n");
            line_len = 0;
        }
        out.push(' ');
        out.push_str(word);
        line_len += 1 + word.len();
    }

    out.push_str("\r\n");
}
