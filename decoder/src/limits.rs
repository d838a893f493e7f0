//! Limits and configuration for patch decoding.

/// Decoder limits enforced while reading untrusted patches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderLimits {
    /// Maximum number of bytes in a single patch.
    pub max_patch_bytes: usize,
    /// Maximum number of tracked references (schema instances and collections).
    pub max_refs: usize,
    /// Maximum number of bytes in a decoded string value or map key.
    pub max_string_bytes: usize,
}

impl Default for DecoderLimits {
    fn default() -> Self {
        Self {
            max_patch_bytes: 1024 * 1024,
            max_refs: 65_536,
            max_string_bytes: 64 * 1024,
        }
    }
}

impl DecoderLimits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_patch_bytes: 4096,
            max_refs: 128,
            max_string_bytes: 256,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_patch_bytes: usize::MAX,
            max_refs: usize::MAX,
            max_string_bytes: usize::MAX,
        }
    }
}

/// What the decoder does after a listener panics.
///
/// A panicking listener never stops the remaining listeners or the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListenerPolicy {
    /// Log the panic and report success.
    #[default]
    Isolate,
    /// Log the panic and fail the decode call with
    /// [`DecodeError::ListenersFailed`](crate::DecodeError::ListenersFailed)
    /// once dispatch and the sweep have completed.
    Report,
}

/// Decoder configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecoderConfig {
    pub limits: DecoderLimits,
    pub listener_policy: ListenerPolicy,
}

impl DecoderConfig {
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            limits: DecoderLimits::for_testing(),
            listener_policy: ListenerPolicy::Report,
        }
    }
}
