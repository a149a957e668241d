pub mod history;
pub mod submissions;
pub mod token;
