pub mod media;
pub mod user;
