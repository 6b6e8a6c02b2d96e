pub mod quotation_dto;
pub mod user_dto;
