//! Newline framing for the device byte stream.

/// Accumulates chunks of device output and yields complete lines.
///
/// Chunks may split anywhere, including inside a multi-byte UTF-8
/// character. Bytes are held until a `\n` arrives and only complete
/// lines are decoded, so a split character is reassembled before
/// decoding. The pending buffer is unbounded.
#[derive(Debug, Default, Clone)]
pub struct LineFramer {
    pending: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a text chunk, returning every line it completes.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        self.push_bytes(chunk.as_bytes())
    }

    /// Feed a raw byte chunk, returning every line it completes.
    ///
    /// Lines are trimmed of surrounding whitespace (including `\r`) and
    /// empty lines are dropped.
    pub fn push_bytes(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let Some(last_newline) = self.pending.iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };

        // Everything after the final newline stays pending
        let rest = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, rest);

        complete
            .split(|&b| b == b'\n')
            .map(|segment| String::from_utf8_lossy(segment).trim().to_string())
            .filter(|line| !line.is_empty())
            .collect()
    }

    /// The partial line waiting for its newline.
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// Drop any partial line.
    pub fn reset(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_chunk_multiple_lines() {
        let mut framer = LineFramer::new();
        let lines = framer.push("10,20,30\n40,50,60\n");
        assert_eq!(lines, vec!["10,20,30", "40,50,60"]);
        assert!(framer.pending().is_empty());
    }

    #[test]
    fn test_partial_line_is_retained() {
        let mut framer = LineFramer::new();
        assert!(framer.push("GAS=4").is_empty());
        assert_eq!(framer.pending(), b"GAS=4");

        let lines = framer.push("50\nGAS=1");
        assert_eq!(lines, vec!["GAS=450"]);
        assert_eq!(framer.pending(), b"GAS=1");
    }

    #[test]
    fn test_byte_granular_chunks_match_single_chunk() {
        let input = "10,20,30\n40,50,60\n";

        let mut whole = LineFramer::new();
        let expected = whole.push(input);

        let mut framer = LineFramer::new();
        let mut lines = Vec::new();
        for byte in input.as_bytes() {
            lines.extend(framer.push_bytes(std::slice::from_ref(byte)));
        }

        assert_eq!(lines, expected);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_every_split_point_yields_same_lines() {
        let input = "10,20,30\n40,50,60\n";
        for split in 0..=input.len() {
            let mut framer = LineFramer::new();
            let mut lines = framer.push(&input[..split]);
            lines.extend(framer.push(&input[split..]));
            assert_eq!(lines, vec!["10,20,30", "40,50,60"], "split at {split}");
        }
    }

    #[test]
    fn test_blank_lines_and_crlf_are_dropped() {
        let mut framer = LineFramer::new();
        let lines = framer.push("\r\n   \nGAS=12\r\n\n");
        assert_eq!(lines, vec!["GAS=12"]);
    }

    #[test]
    fn test_multibyte_character_split_across_chunks() {
        let bytes = "µ=1\n".as_bytes();
        let mut framer = LineFramer::new();
        assert!(framer.push_bytes(&bytes[..1]).is_empty());
        assert_eq!(framer.push_bytes(&bytes[1..]), vec!["µ=1"]);
    }

    #[test]
    fn test_reset_discards_partial_line() {
        let mut framer = LineFramer::new();
        framer.push("1,2");
        framer.reset();
        assert_eq!(framer.push(",3\n"), vec![",3"]);
    }
}
