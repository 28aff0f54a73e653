//! Stateful sentence segmenter.
//!
//! Boundaries are found with the rules of the `pragmatic_segmenter` crate,
//! which knows about abbreviations and decimal numbers. Text arrives in
//! arbitrary fragments, so the last detected segment is never released: it
//! may still grow. The segment before it is only released once that tail
//! ends in terminal punctuation itself, which keeps a half-received
//! sentence from confirming the one in front of it.

use pragmatic_segmenter::Segmenter as PragmaticSegmenter;
use thiserror::Error;
use tracing::trace;

/// Errors raised while preparing the segmenter.
#[derive(Debug, Error)]
pub enum SegmenterError {
    #[error("failed to build sentence rules: {0}")]
    Init(String),
}

/// Convenience result type used throughout this crate.
pub type Result<T> = std::result::Result<T, SegmenterError>;

const TERMINALS: &[char] = &['.', '!', '?', '…', '。', '！', '？', '؟', '।', '॥'];
const CLOSERS: &[char] = &['"', '\'', '”', '’', ')', ']', '»'];

/// A stateful sentence segmenter.
///
/// Feed fragments with [`add_fragment`](Self::add_fragment) and collect the
/// sentences it completes. Call [`finish`](Self::finish) to flush whatever
/// never reached a boundary.
pub struct SentenceSegmenter {
    pending: String,
    inner: PragmaticSegmenter,
}

impl SentenceSegmenter {
    /// Create a new `SentenceSegmenter`.
    pub fn new() -> Result<Self> {
        let inner = PragmaticSegmenter::new().map_err(|e| SegmenterError::Init(e.to_string()))?;
        Ok(Self {
            pending: String::new(),
            inner,
        })
    }

    /// Push a text fragment and return any completed sentences.
    ///
    /// ```
    /// use lingproc::SentenceSegmenter;
    ///
    /// let mut seg = SentenceSegmenter::new().unwrap();
    /// assert!(seg.add_fragment("Hello world. How are").is_empty());
    /// assert_eq!(seg.add_fragment(" you? Fine."), vec!["Hello world.", "How are you?"]);
    /// assert_eq!(seg.finish(), "Fine.");
    /// ```
    pub fn add_fragment(&mut self, fragment: &str) -> Vec<String> {
        self.pending.push_str(fragment);
        let mut segments: Vec<String> = self
            .inner
            .segment(&self.pending)
            .map(|s| s.to_string())
            .collect();
        let tail = segments.pop();
        if !tail.as_deref().is_some_and(is_terminated) {
            segments.pop();
        }

        let mut consumed = 0;
        let mut out = Vec::new();
        for segment in &segments {
            let sentence = segment.trim();
            if sentence.is_empty() {
                continue;
            }
            match self.pending[consumed..].find(sentence) {
                Some(pos) => consumed += pos + sentence.len(),
                None => break,
            }
            let sentence = strip_emphasis(sentence);
            if !sentence.is_empty() {
                out.push(sentence);
            }
        }
        self.pending.drain(..consumed);
        trace!(released = out.len(), held = self.pending.len(), "segmented fragment");
        out
    }

    /// Return and clear the text that never reached a sentence boundary.
    pub fn finish(&mut self) -> String {
        let rest = std::mem::take(&mut self.pending);
        strip_emphasis(rest.trim())
    }

    /// Drop any buffered text.
    pub fn reset(&mut self) {
        self.pending.clear();
    }
}

/// Whether `segment` ends a sentence, ignoring closing quotes and brackets.
fn is_terminated(segment: &str) -> bool {
    segment
        .trim_end()
        .trim_end_matches(CLOSERS)
        .ends_with(TERMINALS)
}

fn strip_emphasis(sentence: &str) -> String {
    sentence.replace('*', "").trim().to_string()
}
