mod myconfig;

pub use self::myconfig::{CloudinaryConfig, Config};
