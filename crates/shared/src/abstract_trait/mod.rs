mod hashing;

pub use self::hashing::{DynHashing, HashingTrait};
