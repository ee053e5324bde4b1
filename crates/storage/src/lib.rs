#![forbid(unsafe_code)]

pub mod bank;
pub mod json_file;
pub mod repository;
pub mod sqlite;

pub use repository::{
    InMemoryRepository, QuizResultRepository, QuizResultRow, SolvedSetStore, Storage,
    StorageError,
};
