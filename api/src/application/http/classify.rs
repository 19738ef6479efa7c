pub mod handlers;
pub mod router;
pub mod summary;
pub mod validators;
