pub mod quotation_handler;
pub mod user_handler;
