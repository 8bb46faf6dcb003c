use tracing::{debug, info};

use super::device::AudioFragment;

/// Container type of an assembled recording
pub const RECORDING_CONTENT_TYPE: &str = "audio/webm;codecs=opus";

/// One immutable recording payload assembled from captured fragments
#[derive(Debug, Clone)]
pub struct Recording {
    /// Concatenated fragment bytes, in capture order
    pub data: Vec<u8>,
    /// Audio container/codec tag
    pub content_type: &'static str,
}

/// Accumulates encoded audio fragments and assembles them into one recording
///
/// Fragments are appended in capture order while a run is active and
/// concatenated into a single payload once the capture device has fully
/// stopped. Assembly of an empty run is refused.
pub struct FragmentCollector {
    fragments: Vec<AudioFragment>,
    byte_len: usize,
}

impl FragmentCollector {
    pub fn new() -> Self {
        Self {
            fragments: Vec::new(),
            byte_len: 0,
        }
    }

    /// Append one fragment, preserving capture order
    pub fn append(&mut self, fragment: AudioFragment) {
        self.byte_len += fragment.data.len();
        debug!(
            "Fragment {} appended ({} bytes at {}ms)",
            self.fragments.len(),
            fragment.data.len(),
            fragment.timestamp_ms
        );
        self.fragments.push(fragment);
    }

    /// Concatenate all appended fragments into one recording
    ///
    /// Returns `None` when no fragments were collected; an empty run never
    /// produces a payload.
    pub fn assemble(&self) -> Option<Recording> {
        if self.fragments.is_empty() {
            return None;
        }

        let mut data = Vec::with_capacity(self.byte_len);
        for fragment in &self.fragments {
            data.extend_from_slice(&fragment.data);
        }

        info!(
            "Assembled recording: {} fragments, {} bytes",
            self.fragments.len(),
            data.len()
        );

        Some(Recording {
            data,
            content_type: RECORDING_CONTENT_TYPE,
        })
    }

    /// Discard all collected fragments
    pub fn reset(&mut self) {
        self.fragments.clear();
        self.byte_len = 0;
    }

    /// Number of fragments collected so far
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Total encoded bytes collected so far
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }
}

impl Default for FragmentCollector {
    fn default() -> Self {
        Self::new()
    }
}
