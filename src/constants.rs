// src/constants.rs
//
// Application-wide constants. Each constant is documented with its purpose and
// usage context.

/// Page size used when neither the request nor the config names one.
///
/// Used in: `application/filter_browser.rs`, `infrastructure/config.rs`
pub const DEFAULT_PAGE_SIZE: usize = 24;

/// Upper bound for a single listing page. Larger requests are clamped.
///
/// Used in: `application/filter_browser.rs`
pub const MAX_PAGE_SIZE: usize = 100;

/// Longest cursor token accepted from a client before any decoding is tried.
///
/// Real cursors are well under 200 characters.
///
/// Used in: `domain/cursor.rs`
pub const MAX_CURSOR_LEN: usize = 512;

/// Popularity added when a filter is viewed.
///
/// Used in: `domain/filter.rs`
pub const POPULARITY_PER_VIEW: f64 = 1.0;

/// Popularity added when a filter is exported into the game.
///
/// Used in: `domain/filter.rs`
pub const POPULARITY_PER_EXPORT: f64 = 5.0;

/// Longest accepted name for filters and categories.
///
/// Used in: `util/text.rs`
pub const MAX_NAME_LEN: usize = 120;
