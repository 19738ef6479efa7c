pub mod repository;

pub use repository::JsonFileLabelRepository;
