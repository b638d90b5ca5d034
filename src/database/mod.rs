pub mod manager;
pub mod models;

pub use manager::{DatabaseError, DatabaseManager};
pub use models::aplicativo::Aplicativo;
pub use models::nota::{Nota, TipoNota};
