use crate::protocol::buffer::DEFAULT_BUFFER_CAPACITY;

/// Default number of headers a request may carry.
pub const DEFAULT_MAX_HEADERS: usize = 16;

/// Default maximum length of a request path in bytes.
pub const DEFAULT_MAX_PATH_LEN: usize = 32;

/// Hard upper bound for [`RequestLimits::max_headers`]; header slots live on the stack while tokenizing.
pub const MAX_HEADER_NUM: usize = 64;

/// Bounds applied to every request read from a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLimits {
    /// Capacity of the per-connection request buffer.
    pub buffer_capacity: usize,
    /// Maximum number of header lines, clamped to [`MAX_HEADER_NUM`].
    pub max_headers: usize,
    /// Maximum path length; longer paths fail the request rather than being cut.
    pub max_path_len: usize,
}

impl RequestLimits {
    #[inline]
    pub(crate) fn header_slots(&self) -> usize {
        self.max_headers.min(MAX_HEADER_NUM)
    }
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self { buffer_capacity: DEFAULT_BUFFER_CAPACITY, max_headers: DEFAULT_MAX_HEADERS, max_path_len: DEFAULT_MAX_PATH_LEN }
    }
}
