pub mod classification;
pub mod message;
pub mod response;
pub mod ticket;
