use std::path::{Component, Path as FsPath, PathBuf};

use async_trait::async_trait;
use axum::{
	body::Body,
	extract::{Path, State},
	http::header,
	response::{IntoResponse, Response},
};
use hyper::StatusCode;
use tokio::fs::{self, File};
use tokio_util::io::ReaderStream;

use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
	#[error("not an image: {0}")]
	NotAnImage(String),
	#[error("invalid object key `{0}`")]
	InvalidKey(String),
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
}

/// Object storage: put bytes under a key, get back a URL that serves them.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
	async fn upload(&self, key: &str, data: &[u8]) -> Result<String, StorageError>;
}

/// Stores objects under a local directory and serves them from `/files`.
pub struct LocalStorage {
	root: PathBuf,
	public_base_url: String,
}

impl LocalStorage {
	pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
		LocalStorage {
			root: root.into(),
			public_base_url: public_base_url.into(),
		}
	}

	pub fn root(&self) -> &FsPath {
		&self.root
	}

	pub fn resolve(&self, key: &str) -> Option<PathBuf> {
		safe_relative(key).map(|rel| self.root.join(rel))
	}
}

#[async_trait]
impl ObjectStorage for LocalStorage {
	async fn upload(&self, key: &str, data: &[u8]) -> Result<String, StorageError> {
		let path = self.resolve(key).ok_or_else(|| StorageError::InvalidKey(key.to_owned()))?;
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent).await?;
		}
		fs::write(&path, data).await?;
		log::debug!("stored {} bytes at {}", data.len(), path.display());
		Ok(format!("{}/files/{}", self.public_base_url, key))
	}
}

// Rejects absolute paths and `..` so keys stay inside the storage root.
fn safe_relative(key: &str) -> Option<PathBuf> {
	let path = FsPath::new(key);
	if key.is_empty() || !path.components().all(|c| matches!(c, Component::Normal(_))) {
		return None;
	}
	Some(path.to_path_buf())
}

/// Checks that `data` decodes as an image and returns its file extension.
pub fn image_extension(data: &[u8]) -> Result<&'static str, StorageError> {
	let format = image::guess_format(data).map_err(|e| StorageError::NotAnImage(e.to_string()))?;
	image::load_from_memory_with_format(data, format).map_err(|e| StorageError::NotAnImage(e.to_string()))?;
	Ok(format.extensions_str().first().copied().unwrap_or("img"))
}

/// Keeps the characters of a client file name that are safe inside a key.
pub fn sanitize_file_name(name: &str) -> String {
	let cleaned: String = name
		.rsplit(['/', '\\'])
		.next()
		.unwrap_or_default()
		.chars()
		.map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
		.collect();
	let cleaned = cleaned.trim_start_matches('.');
	if cleaned.is_empty() {
		"image".to_string()
	} else {
		cleaned.to_string()
	}
}

pub async fn file_handler(state: State<AppState>, Path(key): Path<String>) -> Response {
	let Some(path) = state.files.resolve(&key) else {
		return StatusCode::NOT_FOUND.into_response();
	};

	match read_file_stream(&path).await {
		Some(stream) => {
			let mime = mime_for(&path);
			([(header::CONTENT_TYPE, mime)], Body::from_stream(stream)).into_response()
		}
		None => StatusCode::NOT_FOUND.into_response(),
	}
}

pub async fn read_file_stream(path: &FsPath) -> Option<ReaderStream<File>> {
	File::open(path).await.map(ReaderStream::new).ok()
}

fn mime_for(path: &FsPath) -> &'static str {
	let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default().to_ascii_lowercase();
	match ext.as_str() {
		"png" => "image/png",
		"jpg" | "jpeg" => "image/jpeg",
		"gif" => "image/gif",
		"webp" => "image/webp",
		"bmp" => "image/bmp",
		_ => "application/octet-stream",
	}
}
