pub mod error;
pub mod jwt;
pub mod logger;
pub mod password;
pub mod session;
pub mod storage;
