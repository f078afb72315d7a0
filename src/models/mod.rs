pub mod agent;
pub mod chat;
pub mod device;
