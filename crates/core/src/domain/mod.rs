pub mod matching;
pub mod profile;
pub mod task;
pub mod transaction;
