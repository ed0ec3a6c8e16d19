pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid {field}: {message}")]
	Validation { field: String, message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<lookout_storage::Error> for Error {
	fn from(err: lookout_storage::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}
