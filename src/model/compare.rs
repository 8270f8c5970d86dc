//! Comparison options for entry and group equality checks.

/// Controls which aspects [`crate::model::Entry::matches`] ignores.
///
/// The options combine freely; [`CompareOptions::SECONDS`] is the one the
/// merger uses almost everywhere, since merge ordering works on
/// second-truncated timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompareOptions {
    /// Truncate all timestamps to whole seconds before comparing.
    pub ignore_milliseconds: bool,
    /// Skip the history chains.
    pub ignore_history: bool,
    /// Skip the parent handle and the location-changed timestamp.
    pub ignore_location: bool,
}

impl CompareOptions {
    /// Full-precision comparison of everything.
    pub const EXACT: CompareOptions = CompareOptions {
        ignore_milliseconds: false,
        ignore_history: false,
        ignore_location: false,
    };

    /// Second-precision comparison of everything.
    pub const SECONDS: CompareOptions = CompareOptions {
        ignore_milliseconds: true,
        ignore_history: false,
        ignore_location: false,
    };

    /// Additionally skip history chains.
    pub fn and_ignore_history(mut self) -> Self {
        self.ignore_history = true;
        self
    }

    /// Additionally skip parent handles and location-changed timestamps.
    pub fn and_ignore_location(mut self) -> Self {
        self.ignore_location = true;
        self
    }
}
