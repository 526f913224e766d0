// Authentication: registration, login, JWT issuance and the bearer-token extractor.

pub mod extractor;
pub mod handlers;
pub mod tokens;

pub use extractor::AuthUser;
