mod command;

pub use self::command::{DynUserCommandService, UserCommandServiceTrait};
