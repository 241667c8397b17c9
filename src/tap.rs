use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Cap on the decoded text preview. Hex dumps of binary payloads are
/// intentionally not capped
pub const PREVIEW_CAP: usize = 1024;

/// Direction labels a one-directional leg of a relayed session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ClientToTarget,
    TargetToClient,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::ClientToTarget => write!(f, "client -> target"),
            Direction::TargetToClient => write!(f, "target -> client"),
        }
    }
}

/// Classification is the result of inspecting a payload chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Text,
    Binary,
}

/// TrafficEvent records one observed payload chunk. Ephemeral: produced,
/// logged, never persisted
#[derive(Debug, Clone)]
pub struct TrafficEvent {
    pub domain: Arc<str>,
    pub direction: Direction,
    pub size: usize,
    pub classification: Classification,
    pub preview: String,
}

/// TrafficTap is a read-only inspector attached to one direction of a
/// watched session. It observes each chunk without consuming, delaying,
/// or mutating it
#[derive(Debug, Clone)]
pub struct TrafficTap {
    domain: Arc<str>,
    direction: Direction,
}

/// TrafficTap implementation block
impl TrafficTap {
    /// new is a constructor for the TrafficTap type
    pub fn new(domain: Arc<str>, direction: Direction) -> Self {
        Self { domain, direction }
    }

    /// observe inspects and logs one payload chunk. The caller keeps the
    /// chunk: same bytes, same boundaries, same order flow onward
    pub fn observe(&self, chunk: &[u8]) -> TrafficEvent {
        let size = chunk.len();

        // Decode at most the first PREVIEW_CAP bytes for preview purposes
        let capped = &chunk[..size.min(PREVIEW_CAP)];
        let preview = String::from_utf8_lossy(capped).into_owned();
        let classification = classify(&preview);

        match classification {
            Classification::Text => info!(
                domain = %self.domain,
                direction = %self.direction,
                size,
                "text payload:\n{preview}"
            ),
            Classification::Binary => info!(
                domain = %self.domain,
                direction = %self.direction,
                size,
                "binary payload, hex dump:\n{}",
                hex::encode(chunk)
            ),
        }

        TrafficEvent {
            domain: Arc::clone(&self.domain),
            direction: self.direction,
            size,
            classification,
            preview,
        }
    }
}

/// classify decides whether decoded content is text or binary: strictly more
/// than 10% non-whitespace control characters means binary. Empty content is
/// text by convention
pub fn classify(text: &str) -> Classification {
    let mut total = 0usize;
    let mut control = 0usize;

    for c in text.chars() {
        total += 1;
        if c.is_control() && !c.is_whitespace() {
            control += 1;
        }
    }

    // Strictly more than 10%, in integer arithmetic
    if total > 0 && control * 10 > total {
        Classification::Binary
    } else {
        Classification::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tap(direction: Direction) -> TrafficTap {
        TrafficTap::new(Arc::from("example.com"), direction)
    }

    #[test]
    fn printable_text_is_text() {
        assert_eq!(
            classify("GET / HTTP/1.1\r\nHost: example.com\r\n\r\n"),
            Classification::Text
        );
    }

    #[test]
    fn control_heavy_content_is_binary() {
        // 2 control chars out of 10 -> 20% > 10%
        let content = "\u{1}\u{2}aaaaaaaa";
        assert_eq!(classify(content), Classification::Binary);
    }

    #[test]
    fn exactly_ten_percent_is_text() {
        // 1 control char out of 10 -> 10%, strict inequality keeps it text
        let content = "\u{1}aaaaaaaaa";
        assert_eq!(content.chars().count(), 10);
        assert_eq!(classify(content), Classification::Text);
    }

    #[test]
    fn whitespace_control_chars_do_not_count() {
        assert_eq!(classify("\n\n\t\r ab"), Classification::Text);
    }

    #[test]
    fn empty_content_is_text() {
        assert_eq!(classify(""), Classification::Text);
    }

    #[test]
    fn observe_records_size_and_labels() {
        let event = tap(Direction::ClientToTarget).observe(b"hello world");

        assert_eq!(event.size, 11);
        assert_eq!(event.classification, Classification::Text);
        assert_eq!(event.direction, Direction::ClientToTarget);
        assert_eq!(&*event.domain, "example.com");
        assert_eq!(event.preview, "hello world");
    }

    #[test]
    fn observe_caps_preview_not_size() {
        let chunk = vec![b'a'; 4096];
        let event = tap(Direction::TargetToClient).observe(&chunk);

        assert_eq!(event.size, 4096);
        assert_eq!(event.preview.len(), PREVIEW_CAP);
        assert_eq!(event.classification, Classification::Text);
    }

    #[test]
    fn observe_empty_chunk_is_text() {
        let event = tap(Direction::ClientToTarget).observe(b"");
        assert_eq!(event.size, 0);
        assert_eq!(event.classification, Classification::Text);
    }
}
