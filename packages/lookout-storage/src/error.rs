#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Io(#[from] std::io::Error),
	#[error("Invalid key: {0}")]
	InvalidKey(String),
	#[error("Storage unavailable: {0}")]
	Unavailable(String),
}
