// Registration, login and the bearer-token extractor. Deliberately thin:
// the rest of the API only needs a verified numeric user id per request.

pub mod handlers;
pub mod token;

pub use token::AuthUser;
