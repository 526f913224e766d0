pub mod job;
pub mod reference;
pub mod user;
