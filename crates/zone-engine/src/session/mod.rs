//! Editing and customization sessions built on top of persistence

mod customization;
mod editing;
mod scope;

pub use customization::*;
pub use editing::*;
pub use scope::*;
