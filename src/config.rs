//! Codec configuration

/// Default maximum nesting depth for objects/arrays (prevents stack overflow)
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default initial capacity for encode buffers
pub const DEFAULT_INITIAL_CAPACITY: usize = 256;

/// Configuration shared by the AMF0 decoder and encoder
#[derive(Debug, Clone)]
pub struct CodecConfig {
    /// Maximum composite nesting depth (scalars and references don't count)
    pub max_depth: usize,

    /// Initial capacity of buffers allocated by the convenience encoders
    pub initial_capacity: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
        }
    }
}

impl CodecConfig {
    /// Set maximum composite nesting depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set initial encode buffer capacity
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }
}
