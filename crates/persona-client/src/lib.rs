pub mod backend;
pub mod config;
pub mod error;
pub mod http;
pub mod submit;
pub mod wire;

pub use backend::PersonaBackend;
pub use config::ClientConfig;
pub use error::{ClientError, DEFAULT_STORE_FAILURE};
pub use http::HttpPersonaBackend;
pub use submit::{Step, advance, resume};
pub use wire::{PersonaFields, PersonaRecord, StoreResponse};
