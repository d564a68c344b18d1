pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid arguments: {0}")]
	Arguments(#[from] serde_json::Error),
	#[error("{0}")]
	InvalidArgument(String),
	#[error(transparent)]
	Client(#[from] evermem_client::Error),
}
