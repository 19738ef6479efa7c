pub mod classify_image;
pub mod get_homepage;
