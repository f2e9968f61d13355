use crate::platform;

/// Tunables shared by the read and write paths.
#[derive(Debug, Clone)]
pub struct Options {
    pub(crate) buffer_size: usize,
    pub(crate) level: u32,
    pub(crate) external_decompressor: bool,
}

impl Options {
    pub fn new() -> Self {
        Self {
            buffer_size: platform::page_size() * 2,
            level: 6,
            external_decompressor: true,
        }
    }

    /// Capacity of each buffering layer. Values below 16 are raised to 16 so
    /// that a signature always fits.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(16);
        self
    }

    /// Gzip level used when writing `.gz` destinations, clamped to 0..=9.
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level.min(9);
        self
    }

    /// Decode gzip input with an external `zcat` when one is installed.
    pub fn with_external_decompressor(mut self, enabled: bool) -> Self {
        self.external_decompressor = enabled;
        self
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn external_decompressor(&self) -> bool {
        self.external_decompressor
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::new()
    }
}

#[test]
fn test_options_clamp() {
    let opts = Options::new().with_buffer_size(1).with_level(42);
    assert_eq!(opts.buffer_size(), 16);
    assert_eq!(opts.level(), 9);
    assert!(Options::default().buffer_size() >= 16);
    assert!(Options::default().external_decompressor());
}
