pub mod quotation_filter;
pub mod quotation_service;
pub mod user_service;
