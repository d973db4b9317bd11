pub mod merge;

pub use self::merge::*;
