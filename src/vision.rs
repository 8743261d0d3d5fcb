pub mod client;
pub mod critique;
pub mod prompts;
