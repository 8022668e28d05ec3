pub mod assign;
pub mod error;
pub mod input;
pub mod render;
pub mod row;
pub mod solver;
pub mod trial;
pub mod types;

pub use error::{Error, Result};
