//! Wire message types carried on queues and over HTTP

pub mod order_book;
pub mod predict;
pub mod response;
