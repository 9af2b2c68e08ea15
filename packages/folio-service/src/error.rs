pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Conflict: {message}")]
	Conflict { message: String },
	#[error("Unavailable: {message}")]
	Unavailable { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Request cancelled.")]
	Cancelled,
}
impl From<folio_storage::Error> for Error {
	fn from(err: folio_storage::Error) -> Self {
		match err {
			folio_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			folio_storage::Error::InvalidArgument(message) => Self::Storage { message },
			folio_storage::Error::NotFound(message) => Self::NotFound { message },
			folio_storage::Error::Conflict(message) => Self::Conflict { message },
		}
	}
}
