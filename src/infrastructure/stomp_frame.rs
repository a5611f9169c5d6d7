// STOMP 1.2 frame encoding and decoding
use bytes::{Buf, BufMut, BytesMut};
use thiserror::Error;

const NUL: u8 = 0;
const LF: u8 = b'\n';
const CR: u8 = b'\r';

/// Upper bound for one encoded frame, NUL terminator included.
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame is not valid UTF-8")]
    InvalidUtf8,
    #[error("malformed header line: {0}")]
    InvalidHeader(String),
    #[error("invalid content-length: {0}")]
    InvalidContentLength(String),
    #[error("frame body is not terminated by NUL")]
    MissingNul,
    #[error("frame exceeds {} bytes", MAX_FRAME_SIZE)]
    FrameTooLarge,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// One item read off the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Frame(Frame),
    /// A bare end-of-line sent to keep the connection alive.
    Heartbeat,
}

impl Frame {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn connect(virtual_host: &str, heartbeat_ms: u64) -> Self {
        Frame::new("CONNECT")
            .with_header("accept-version", "1.2")
            .with_header("host", virtual_host)
            .with_header("heart-beat", &format!("{},{}", heartbeat_ms, heartbeat_ms))
    }

    pub fn subscribe(id: &str, destination: &str) -> Self {
        Frame::new("SUBSCRIBE")
            .with_header("id", id)
            .with_header("destination", destination)
            .with_header("ack", "auto")
    }

    /// First occurrence wins when a header is repeated.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn body_text(&self) -> Result<String, FrameError> {
        String::from_utf8(self.body.clone()).map_err(|_| FrameError::InvalidUtf8)
    }

    /// `(outgoing, incoming)` heart-beat intervals in ms from the `heart-beat`
    /// header; `(0, 0)` when absent.
    pub fn heartbeat(&self) -> (u64, u64) {
        self.header("heart-beat")
            .and_then(|value| value.split_once(','))
            .and_then(|(x, y)| Some((x.trim().parse().ok()?, y.trim().parse().ok()?)))
            .unwrap_or((0, 0))
    }

    pub fn encode(&self, buffer: &mut BytesMut) {
        let escape = escapes_headers(&self.command);
        buffer.put_slice(self.command.as_bytes());
        buffer.put_u8(LF);
        for (name, value) in &self.headers {
            if escape {
                buffer.put_slice(escape_header(name).as_bytes());
                buffer.put_u8(b':');
                buffer.put_slice(escape_header(value).as_bytes());
            } else {
                buffer.put_slice(name.as_bytes());
                buffer.put_u8(b':');
                buffer.put_slice(value.as_bytes());
            }
            buffer.put_u8(LF);
        }
        if !self.body.is_empty() && self.header("content-length").is_none() {
            buffer.put_slice(format!("content-length:{}", self.body.len()).as_bytes());
            buffer.put_u8(LF);
        }
        buffer.put_u8(LF);
        buffer.put_slice(&self.body);
        buffer.put_u8(NUL);
    }
}

/// Takes the next frame or heart-beat off the front of `buffer`. Returns
/// `Ok(None)` and leaves the buffer untouched while the frame is incomplete,
/// and fails once the pending frame can no longer fit in [`MAX_FRAME_SIZE`].
pub fn decode(buffer: &mut BytesMut) -> Result<Option<Decoded>, FrameError> {
    if buffer.first() == Some(&LF) {
        buffer.advance(1);
        return Ok(Some(Decoded::Heartbeat));
    }
    if buffer.starts_with(&[CR, LF]) {
        buffer.advance(2);
        return Ok(Some(Decoded::Heartbeat));
    }

    let mut lines: Vec<&[u8]> = Vec::new();
    let mut position = 0;
    let body_start = loop {
        let Some(offset) = buffer[position..].iter().position(|b| *b == LF) else {
            return incomplete(buffer);
        };
        let mut line = &buffer[position..position + offset];
        if line.last() == Some(&CR) {
            line = &line[..line.len() - 1];
        }
        position += offset + 1;
        if line.is_empty() {
            break position;
        }
        lines.push(line);
    };

    let Some((command_line, header_lines)) = lines.split_first() else {
        return Err(FrameError::InvalidHeader(String::new()));
    };
    let command = std::str::from_utf8(command_line)
        .map_err(|_| FrameError::InvalidUtf8)?
        .to_string();
    let escape = escapes_headers(&command);

    let mut headers = Vec::with_capacity(header_lines.len());
    for line in header_lines {
        let line = std::str::from_utf8(line).map_err(|_| FrameError::InvalidUtf8)?;
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| FrameError::InvalidHeader(line.to_string()))?;
        if escape {
            headers.push((unescape_header(name)?, unescape_header(value)?));
        } else {
            headers.push((name.to_string(), value.to_string()));
        }
    }

    let content_length = headers
        .iter()
        .find(|(name, _)| name == "content-length")
        .map(|(_, value)| {
            value
                .trim()
                .parse::<usize>()
                .map_err(|_| FrameError::InvalidContentLength(value.clone()))
        })
        .transpose()?;

    let body_end = match content_length {
        Some(length) => {
            let body_end = body_start
                .checked_add(length)
                .filter(|end| *end < MAX_FRAME_SIZE)
                .ok_or(FrameError::FrameTooLarge)?;
            if buffer.len() <= body_end {
                return Ok(None);
            }
            if buffer[body_end] != NUL {
                return Err(FrameError::MissingNul);
            }
            body_end
        }
        None => match buffer[body_start..].iter().position(|b| *b == NUL) {
            Some(offset) => body_start + offset,
            None => return incomplete(buffer),
        },
    };

    let body = buffer[body_start..body_end].to_vec();
    buffer.advance(body_end + 1);

    Ok(Some(Decoded::Frame(Frame {
        command,
        headers,
        body,
    })))
}

fn incomplete(buffer: &BytesMut) -> Result<Option<Decoded>, FrameError> {
    if buffer.len() >= MAX_FRAME_SIZE {
        return Err(FrameError::FrameTooLarge);
    }
    Ok(None)
}

/// CONNECT and CONNECTED frames carry their headers verbatim.
fn escapes_headers(command: &str) -> bool {
    command != "CONNECT" && command != "CONNECTED"
}

fn escape_header(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\r' => escaped.push_str("\\r"),
            '\n' => escaped.push_str("\\n"),
            ':' => escaped.push_str("\\c"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn unescape_header(value: &str) -> Result<String, FrameError> {
    let mut unescaped = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => unescaped.push('\\'),
            Some('r') => unescaped.push('\r'),
            Some('n') => unescaped.push('\n'),
            Some('c') => unescaped.push(':'),
            _ => return Err(FrameError::InvalidHeader(value.to_string())),
        }
    }
    Ok(unescaped)
}
