pub mod handlers;
pub mod matching;
