pub mod fanout;
pub mod time;
