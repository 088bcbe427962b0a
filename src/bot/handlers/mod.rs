//! Discord interaction handlers
//!
//! Autocomplete suggestions for command parameters, and the direct-message handler that
//! feeds free text into whichever dialogue the author has open.

/// Autocomplete handlers for product ids and payment methods
pub mod autocomplete;
/// Direct-message dialogue router
pub mod conversation;
