pub mod entities;
pub mod fallback;
pub mod models;
pub mod parser;
pub mod ports;
pub mod prompts;
pub mod reasoning;
pub mod schema;
pub mod services;
pub mod similarity;
pub mod value_objects;

#[cfg(test)]
pub(crate) mod testing;

pub use entities::*;
pub use ports::*;
pub use value_objects::*;
