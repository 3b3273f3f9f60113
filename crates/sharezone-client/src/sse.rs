use tracing::warn;

/// One `event:`/`data:` block from a Server-Sent Events stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: String,
}

/// Incremental SSE parser. Chunks may split frames, lines and even UTF-8
/// sequences anywhere; bytes are only decoded once a whole frame is buffered.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes, returning every frame completed by them.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        // CR only appears as part of CRLF line endings
        self.buf.extend(chunk.iter().copied().filter(|&b| b != b'\r'));

        let mut frames = Vec::new();
        while let Some(end) = self.buf.windows(2).position(|w| w == b"\n\n") {
            let block: Vec<u8> = self.buf.drain(..end + 2).collect();
            match std::str::from_utf8(&block) {
                Ok(block) => frames.extend(parse_block(block)),
                Err(e) => warn!("Dropping SSE frame that is not UTF-8: {}", e),
            }
        }
        frames
    }
}

fn parse_block(block: &str) -> Option<SseFrame> {
    let mut event = None;
    let mut data: Vec<&str> = Vec::new();

    for line in block.lines() {
        // Comment lines are keep-alives
        if line.starts_with(':') {
            continue;
        }
        let (field, value) = line.split_once(':').unwrap_or((line, ""));
        let value = value.strip_prefix(' ').unwrap_or(value);
        match field {
            "event" => event = Some(value.to_string()),
            "data" => data.push(value),
            _ => {}
        }
    }

    if data.is_empty() {
        return None;
    }
    Some(SseFrame {
        event,
        data: data.join("\n"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"event: message\nda").is_empty());
        let frames = decoder.push(b"ta: {\"a\":1}\n\nevent: ready\ndata: {}\n\n");

        assert_eq!(
            frames,
            [
                SseFrame { event: Some("message".into()), data: "{\"a\":1}".into() },
                SseFrame { event: Some("ready".into()), data: "{}".into() },
            ]
        );
    }

    #[test]
    fn keep_alive_comments_produce_nothing() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b":\n\n").is_empty());
    }

    #[test]
    fn crlf_and_multiline_data() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.push(b"data: one\r\ndata: two\r\n\r\n");
        assert_eq!(frames[0].data, "one\ntwo");
        assert_eq!(frames[0].event, None);
    }

    #[test]
    fn multibyte_text_split_inside_a_character() {
        let frame = "event: message\ndata: {\"text\":\"héllo 😀\"}\n\n".as_bytes();
        // Split between the two bytes of 'é'
        let split = frame.iter().position(|&b| b == 0xC3).unwrap() + 1;

        let mut decoder = SseDecoder::new();
        assert!(decoder.push(&frame[..split]).is_empty());
        let frames = decoder.push(&frame[split..]);

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "{\"text\":\"héllo 😀\"}");
    }

    #[test]
    fn crlf_split_between_cr_and_lf() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: one\r\n\r").is_empty());
        let frames = decoder.push(b"\ndata: two\r\n\r\n");
        let data: Vec<&str> = frames.iter().map(|f| f.data.as_str()).collect();
        assert_eq!(data, ["one", "two"]);
    }
}
