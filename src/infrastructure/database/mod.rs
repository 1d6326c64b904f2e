pub mod connection;
pub mod experience_repo;

pub use connection::DatabaseConnection;
pub use experience_repo::ExperienceRepositoryImpl;
