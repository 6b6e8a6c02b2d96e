pub mod memory;
pub mod mongo;
pub mod quotation_repo;
pub mod repository_error;
pub mod user_repo;
