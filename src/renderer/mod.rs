mod depth_debug;
pub mod error;
mod forward_pass;
mod gpu_state;
pub mod model;
mod shadow_pass;
mod skybox;
pub mod texture;
pub mod uniforms;
pub mod vertex;

use crate::config::ViewerConfig;
use anyhow::Result;
use winit::event_loop::EventLoop;

pub use error::{RendererErrorContext, RendererResult};
pub use forward_pass::{supported_fill_mode, PipelineKey};
pub use gpu_state::{GpuState, MSAA_SAMPLES};
pub use model::{mesh_vertices, Model};
pub use uniforms::{align_up, object_uniforms, FrameUniform, ObjectUniform, FOG_COLOR};
pub use vertex::{cube_vertices, ModelVertex, PositionVertex, CUBE_INDICES};

pub fn run(event_loop: EventLoop<()>, config: ViewerConfig) -> Result<()> {
    log::info!("[renderer::run] Starting renderer initialization");
    log::debug!("[renderer::run] Config: {:?}", config);

    let result = pollster::block_on(gpu_state::run_app(event_loop, config));

    match &result {
        Ok(_) => log::info!("[renderer::run] gpu_state::run_app completed successfully"),
        Err(e) => log::error!("[renderer::run] gpu_state::run_app failed: {}", e),
    }

    result
}
