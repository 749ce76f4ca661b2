use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlistamientoError {
    #[error("Error de configuración: {0}")]
    Config(String),

    #[error("Registro no encontrado: {0}")]
    RecordNotFound(String),

    #[error("Entrada no válida: {0}")]
    InvalidInput(String),

    #[error("Error del almacén: {0}")]
    Store(String),

    #[error(transparent)]
    Common(#[from] alistamiento_common::Error),

    #[error("Error de JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Error de E/S: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AlistamientoError>;
