//! Viewer-wide error type
//!
//! Fatal startup failures (window, surface, adapter, device, assets, config)
//! surface as `ViewerError`. Per-frame GPU problems are logged and never
//! reach this type.

/// Errors raised while bringing the viewer up
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("Invalid configuration in {path}: {message}")]
    Config { path: String, message: String },

    #[error("Window creation failed: {0}")]
    WindowCreation(String),

    #[error("Surface creation failed: {0}")]
    SurfaceCreation(String),

    #[error("No suitable GPU adapter found")]
    NoAdapter,

    #[error("GPU device request failed: {0}")]
    DeviceRequest(String),

    #[error("GPU operation '{operation}' failed: {message}")]
    Gpu { operation: String, message: String },

    #[error("Failed to load asset {path}: {message}")]
    AssetLoad { path: String, message: String },

    #[error("Mesh '{mesh}' has no {attribute}")]
    MissingAttribute { mesh: String, attribute: &'static str },

    #[error("Skybox needs {expected} faces, got {found}")]
    SkyboxFaces { expected: usize, found: usize },
}

/// Result alias used across the crate
pub type ViewerResult<T> = Result<T, ViewerError>;

impl ViewerError {
    pub fn config(path: impl Into<String>, message: impl std::fmt::Display) -> Self {
        ViewerError::Config {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn asset(path: impl AsRef<std::path::Path>, message: impl std::fmt::Display) -> Self {
        ViewerError::AssetLoad {
            path: path.as_ref().display().to_string(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_asset() {
        let err = ViewerError::asset("objects/tree/tree.obj", "file not found");
        assert_eq!(
            err.to_string(),
            "Failed to load asset objects/tree/tree.obj: file not found"
        );
    }

    #[test]
    fn test_skybox_face_count_message() {
        let err = ViewerError::SkyboxFaces { expected: 6, found: 4 };
        assert_eq!(err.to_string(), "Skybox needs 6 faces, got 4");
    }
}
