pub mod quotation_router;
pub mod user_router;
