//! Renderer subsystem error handling
//!
//! Type alias and helpers that turn foreign errors (wgpu, image, tobj) into
//! `ViewerError` with a short context string.

use crate::error::{ViewerError, ViewerResult};
use std::path::Path;

/// Type alias for renderer operation results
pub type RendererResult<T> = ViewerResult<T>;

/// Helper trait for renderer error contexts
pub trait RendererErrorContext<T> {
    fn asset_context(self, path: &Path) -> RendererResult<T>;
}

impl<T, E> RendererErrorContext<T> for Result<T, E>
where
    E: std::fmt::Display,
{
    fn asset_context(self, path: &Path) -> RendererResult<T> {
        self.map_err(|e| ViewerError::asset(path, e))
    }
}

/// Create a GPU operation error
pub fn gpu_operation_error(operation: &str, error: impl std::fmt::Display) -> ViewerError {
    ViewerError::Gpu {
        operation: operation.to_string(),
        message: error.to_string(),
    }
}

/// Settle work done inside a pushed error scope. An error the scope captured
/// takes precedence over the work's own result.
pub fn close_error_scope<T>(
    operation: &str,
    result: RendererResult<T>,
    captured: Option<impl std::fmt::Display>,
) -> RendererResult<T> {
    match captured {
        Some(error) => {
            if let Err(inner) = &result {
                log::warn!("[close_error_scope] '{}' also failed with: {}", operation, inner);
            }
            Err(gpu_operation_error(operation, error))
        }
        None => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpu_operation_error_message() {
        let err = gpu_operation_error("create render passes", "shader failed to parse");
        assert_eq!(
            err.to_string(),
            "GPU operation 'create render passes' failed: shader failed to parse"
        );
    }

    #[test]
    fn test_clean_scope_passes_result_through() {
        let ok = close_error_scope("create render passes", Ok(3), None::<&str>);
        assert_eq!(ok.unwrap(), 3);

        let failed: RendererResult<u32> = Err(ViewerError::asset(Path::new("farm.obj"), "missing"));
        let err = close_error_scope("create render passes", failed, None::<&str>).unwrap_err();
        assert!(matches!(err, ViewerError::AssetLoad { ref path, .. } if path == "farm.obj"));
    }

    #[test]
    fn test_captured_error_takes_precedence() {
        let err = close_error_scope("create render passes", Ok(()), Some("bad shader")).unwrap_err();
        assert!(matches!(err, ViewerError::Gpu { ref operation, .. } if operation == "create render passes"));

        let failed: RendererResult<()> = Err(ViewerError::asset(Path::new("sky/posx.jpg"), "missing"));
        let err = close_error_scope("create render passes", failed, Some("bad layout")).unwrap_err();
        assert_eq!(err.to_string(), "GPU operation 'create render passes' failed: bad layout");
    }

    #[test]
    fn test_asset_context_names_path() {
        let result: Result<(), &str> = Err("not found");
        let err = result.asset_context(Path::new("skybox/posx.jpg")).unwrap_err();
        assert!(matches!(err, ViewerError::AssetLoad { ref path, .. } if path == "skybox/posx.jpg"));
    }
}
