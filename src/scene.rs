pub mod builder;
pub mod document;
