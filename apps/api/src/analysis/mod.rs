// Post text analysis via pluggable chat-completion providers.
// All provider HTTP goes through provider.rs; handlers never build
// requests themselves.

pub mod handlers;
pub mod provider;
