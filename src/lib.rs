pub mod camera;
pub mod config;
pub mod error;
pub mod input;
pub mod lighting;
pub mod renderer;
pub mod scene;

use anyhow::Result;
use winit::event_loop::{EventLoop, EventLoopBuilder};

pub use camera::{Camera, MoveDirection};
pub use config::ViewerConfig;
pub use error::{ViewerError, ViewerResult};
pub use input::{InputState, KeyCode, MouseLook};
pub use scene::{apply_input, FillMode, FrameRequests, SceneState};

/// Owns the event loop until `run` hands it to the renderer
pub struct Viewer {
    config: ViewerConfig,
    event_loop: EventLoop<()>,
}

impl Viewer {
    pub fn new(config: ViewerConfig) -> ViewerResult<Self> {
        // Force X11 backend for WSL compatibility
        #[cfg(target_os = "linux")]
        let event_loop = {
            use winit::platform::x11::EventLoopBuilderExtX11;
            EventLoopBuilder::new().with_x11().build()
        };

        #[cfg(not(target_os = "linux"))]
        let event_loop = EventLoopBuilder::new().build();

        let event_loop = event_loop.map_err(|e| ViewerError::WindowCreation(e.to_string()))?;

        Ok(Self { config, event_loop })
    }

    pub fn run(self) -> Result<()> {
        renderer::run(self.event_loop, self.config)
    }
}
