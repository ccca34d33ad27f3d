pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Invalid event: {message}")]
	InvalidEvent { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Index build failed: {message}")]
	IndexBuild { message: String },
	#[error("Unavailable: {message}")]
	Unavailable { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<companion_storage::Error> for Error {
	fn from(err: companion_storage::Error) -> Self {
		match err {
			companion_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			companion_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			companion_storage::Error::Decode(message) => Self::Storage { message },
		}
	}
}

impl From<companion_index::Error> for Error {
	fn from(err: companion_index::Error) -> Self {
		match err {
			companion_index::Error::NotFound { message } => Self::NotFound { message },
			companion_index::Error::IndexBuild { message } => Self::IndexBuild { message },
			other => Self::IndexBuild { message: other.to_string() },
		}
	}
}
