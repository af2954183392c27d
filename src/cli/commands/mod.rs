pub mod docs;
pub mod token;
