pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{endpoint} request failed: {source}")]
	Transport { endpoint: &'static str, source: reqwest::Error },
	#[error("{endpoint} returned HTTP {status}: {body}")]
	Status { endpoint: &'static str, status: u16, body: String },
	#[error("{endpoint} returned a non-JSON body: {source}")]
	Decode { endpoint: &'static str, source: serde_json::Error },
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error(transparent)]
	Timestamp(#[from] time::error::Format),
}
impl Error {
	/// Whether the remote side rejected a create because the resource is already there.
	pub fn is_already_exists(&self) -> bool {
		match self {
			Self::Status { status, body, .. } =>
				*status == 409 || body.to_ascii_lowercase().contains("already exist"),
			_ => false,
		}
	}
}
