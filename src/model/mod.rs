pub mod quotation;
pub mod user;
