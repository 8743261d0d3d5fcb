pub mod catalog;
pub mod pose;
