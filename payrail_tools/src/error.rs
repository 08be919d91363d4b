use thiserror::Error;

#[derive(Debug, Error)]
pub enum PayrailApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST response: {0}")]
    RestResponse(String),
    #[error("Could not deserialize JSON: {0}")]
    Json(String),
    #[error("Query failed. Error {status}. {message}")]
    Query { status: u16, message: String },
}
