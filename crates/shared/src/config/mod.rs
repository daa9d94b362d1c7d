mod database;
mod hashing;

pub use self::database::{ConnectionManager, ConnectionPool};
pub use self::hashing::Hashing;
