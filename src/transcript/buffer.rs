use tracing::debug;

/// Trim once the buffer grows past this many bytes
pub const DEFAULT_TRIM_THRESHOLD: usize = 50_000;

/// Bytes kept (most recent suffix) when trimming
pub const DEFAULT_KEEP_SUFFIX: usize = 40_000;

/// Append-only transcript text with a processed cursor
///
/// Lengths and the cursor are byte offsets into the UTF-8 text and always sit on a
/// char boundary. Invariant after every mutation:
/// `processed_cursor <= text.len()` and, once trimmed, `text.len() <= keep_suffix`.
///
/// `end_offset` is a position in the whole transcript, counting bytes trimmed away,
/// so it stays meaningful across trims.
#[derive(Debug, Clone)]
pub struct TranscriptBuffer {
    text: String,
    processed_cursor: usize,
    trim_threshold: usize,
    keep_suffix: usize,
    segments: usize,
    /// Bytes removed from the front by trims over the buffer's lifetime
    trimmed_bytes: usize,
}

impl Default for TranscriptBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_TRIM_THRESHOLD, DEFAULT_KEEP_SUFFIX)
    }
}

impl TranscriptBuffer {
    pub fn new(trim_threshold: usize, keep_suffix: usize) -> Self {
        Self {
            text: String::new(),
            processed_cursor: 0,
            trim_threshold,
            keep_suffix: keep_suffix.min(trim_threshold),
            segments: 0,
            trimmed_bytes: 0,
        }
    }

    /// Append a finalized segment, separated by a single space, then trim if needed
    pub fn append(&mut self, segment: &str) {
        self.text.push(' ');
        self.text.push_str(segment);
        self.segments += 1;
        self.trim();
    }

    /// Unprocessed suffix since the processed cursor
    pub fn delta(&self) -> &str {
        self.delta_from(self.processed_cursor)
    }

    /// Text from `cursor` to the end; empty if `cursor` is past the end
    pub fn delta_from(&self, cursor: usize) -> &str {
        self.text.get(cursor..).unwrap_or("")
    }

    /// Keep only the last `keep_suffix` bytes when the text exceeds the trim threshold
    ///
    /// The cursor is clamped to `min(cursor, keep_suffix)` and never ends up past the
    /// new end of the text. Returns true if anything was removed.
    pub fn trim(&mut self) -> bool {
        if self.text.len() <= self.trim_threshold {
            return false;
        }

        let mut start = self.text.len() - self.keep_suffix;
        while !self.text.is_char_boundary(start) {
            start += 1;
        }
        let before = self.text.len();
        self.text.drain(..start);
        self.trimmed_bytes += start;

        let cursor = self.processed_cursor.min(self.keep_suffix).min(self.text.len());
        self.processed_cursor = floor_char_boundary(&self.text, cursor);

        debug!(
            "Trimmed transcript buffer from {} to {} bytes (cursor={})",
            before,
            self.text.len(),
            self.processed_cursor
        );
        true
    }

    /// Advance the cursor to `position` (typically the length captured when an
    /// extraction call was issued). Clamped to the current text length.
    pub fn mark_processed(&mut self, position: usize) {
        let position = position.min(self.text.len());
        self.processed_cursor = floor_char_boundary(&self.text, position);
    }

    /// Advance the cursor to a transcript-wide offset taken from `end_offset`
    ///
    /// The offset is rebased past any trims since it was taken, so text appended
    /// after that point stays unprocessed.
    pub fn mark_processed_through(&mut self, end_offset: usize) {
        self.mark_processed(end_offset.saturating_sub(self.trimmed_bytes));
    }

    /// End of the text as a transcript-wide offset (trimmed bytes included)
    pub fn end_offset(&self) -> usize {
        self.trimmed_bytes + self.text.len()
    }

    pub fn trimmed_bytes(&self) -> usize {
        self.trimmed_bytes
    }

    /// Forget what has been processed so the next extraction re-scans everything
    pub fn reset_cursor(&mut self) {
        self.processed_cursor = 0;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn processed_cursor(&self) -> usize {
        self.processed_cursor
    }

    /// Number of segments appended over the buffer's lifetime
    pub fn segment_count(&self) -> usize {
        self.segments
    }
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}
