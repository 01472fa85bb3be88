use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Columna de ordenamiento no permitida: {0}")]
    InvalidColumn(String),

    #[error("Dirección de ordenamiento inválida: {0}")]
    InvalidDirection(String),

    #[error("Límite inválido: {0}")]
    InvalidLimit(String),

    #[error("Desplazamiento inválido: {0}")]
    InvalidOffset(String),
}
