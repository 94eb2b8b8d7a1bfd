pub mod message;
pub mod publisher;
pub mod sink;
