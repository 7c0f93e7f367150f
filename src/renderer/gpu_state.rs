use crate::camera::perspective_projection;
use crate::config::{CameraConfig, ViewerConfig, WindowConfig};
use crate::error::{ViewerError, ViewerResult};
use crate::input::InputState;
use crate::renderer::depth_debug::DepthDebugPass;
use crate::renderer::error::{close_error_scope, RendererResult};
use crate::renderer::forward_pass::{supported_fill_mode, ForwardPass, PipelineKey};
use crate::renderer::model::Model;
use crate::renderer::shadow_pass::ShadowPass;
use crate::renderer::skybox::SkyboxPass;
use crate::renderer::texture::{create_depth_texture, create_msaa_target, validate_texture_dimensions, DEPTH_FORMAT};
use crate::renderer::uniforms::{object_uniforms, ObjectBuffer};
use crate::scene::{apply_input, FillMode, SceneState};
use anyhow::Result;
use cgmath::Matrix4;
use std::sync::Arc;
use winit::{
    dpi::{LogicalSize, PhysicalSize},
    event::{DeviceEvent, Event, WindowEvent},
    event_loop::EventLoop,
    keyboard::PhysicalKey,
    window::{CursorGrabMode, Fullscreen, Window, WindowBuilder},
};

/// Sample count used when multisampling is on
pub const MSAA_SAMPLES: u32 = 4;

pub struct GpuState {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    features: wgpu::Features,
    msaa_supported: bool,
    sample_count: u32,
    depth_view: wgpu::TextureView,
    msaa_view: Option<wgpu::TextureView>,
    camera: CameraConfig,
    projection: Matrix4<f32>,
    clear_color: wgpu::Color,
    objects: ObjectBuffer,
    shadow: ShadowPass,
    forward: ForwardPass,
    skybox: SkyboxPass,
    depth_debug: DepthDebugPass,
    models: Vec<Model>,
    last_fill_request: FillMode,
    msaa_warned: bool,
    frames_rendered: u64,
    init_time: std::time::Instant,
}

impl GpuState {
    async fn new(window: Arc<Window>, viewer: &ViewerConfig) -> ViewerResult<Self> {
        log::info!("[GpuState::new] Starting GPU initialization");
        let init_time = std::time::Instant::now();

        let size = window.inner_size();
        log::debug!("[GpuState::new] Window size: {}x{}", size.width, size.height);

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone()).map_err(|e| {
            log::error!("[GpuState::new] Failed to create surface: {}", e);
            ViewerError::SurfaceCreation(e.to_string())
        })?;

        let mut adapter_options = wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        };
        let adapter = match instance.request_adapter(&adapter_options).await {
            Some(adapter) => adapter,
            None => {
                log::warn!("[GpuState::new] No hardware adapter found, trying fallback...");
                adapter_options.force_fallback_adapter = true;
                instance
                    .request_adapter(&adapter_options)
                    .await
                    .ok_or(ViewerError::NoAdapter)?
            }
        };

        let info = adapter.get_info();
        log::info!("[GpuState::new] Adapter: {} ({:?})", info.name, info.device_type);
        log::info!("[GpuState::new] Backend: {:?}", info.backend);

        // Line and point rasterisation are optional; take whichever is offered
        let features = adapter.features()
            & (wgpu::Features::POLYGON_MODE_LINE | wgpu::Features::POLYGON_MODE_POINT);
        log::info!("[GpuState::new] Optional features: {:?}", features);

        let limits = wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits());

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Farm Viewer Device"),
                    required_features: features,
                    required_limits: limits,
                },
                None,
            )
            .await
            .map_err(|e| {
                log::error!("[GpuState::new] Failed to create GPU device: {}", e);
                ViewerError::DeviceRequest(e.to_string())
            })?;

        device.on_uncaptured_error(Box::new(|error| {
            log::error!("[GPU] Uncaptured device error: {:?}", error);
            match error {
                wgpu::Error::OutOfMemory { .. } => {
                    log::error!("[GPU] Out of GPU memory");
                }
                wgpu::Error::Validation { description, .. } => {
                    log::error!("[GPU] Validation error: {}", description);
                }
                _ => {}
            }
        }));

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| ViewerError::SurfaceCreation("surface reports no formats for this adapter".to_string()))?;
        log::info!("[GpuState::new] Selected surface format: {:?}", surface_format);

        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let max_dimension = device.limits().max_texture_dimension_2d;
        let (width, height, _) = validate_texture_dimensions(size.width, size.height, max_dimension);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!("[GpuState::new] Present mode: {:?}", config.present_mode);

        let msaa_supported = adapter
            .get_texture_format_features(surface_format)
            .flags
            .sample_count_supported(MSAA_SAMPLES)
            && adapter
                .get_texture_format_features(DEPTH_FORMAT)
                .flags
                .sample_count_supported(MSAA_SAMPLES);
        if !msaa_supported {
            log::warn!("[GpuState::new] {}x multisampling unavailable for {:?}", MSAA_SAMPLES, surface_format);
        }
        let sample_count = if viewer.render.msaa && msaa_supported { MSAA_SAMPLES } else { 1 };

        let depth_view = create_depth_texture(&device, "Depth Texture", config.width, config.height, sample_count);
        let msaa_view = (sample_count > 1).then(|| create_msaa_target(&device, &config, sample_count));

        // Shader or layout mistakes surface here instead of as uncaptured errors
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let setup = (|| -> RendererResult<_> {
            let objects = ObjectBuffer::new(&device, 8);
            let shadow = ShadowPass::new(&device, viewer.shadow.resolution, &objects);
            let forward = ForwardPass::new(&device, &queue, surface_format, &shadow, &objects);
            let skybox = SkyboxPass::new(&device, &queue, surface_format, &viewer.assets.skybox)?;
            let depth_debug = DepthDebugPass::new(&device, surface_format, &shadow);

            let mut models = Vec::new();
            for (name, path) in viewer.assets.meshes() {
                models.push(Model::load(&device, &queue, forward.materials(), name, path)?);
            }
            Ok((objects, shadow, forward, skybox, depth_debug, models))
        })();
        // The scope is popped on every path, including asset failures above
        let captured = device.pop_error_scope().await;
        let (objects, shadow, forward, skybox, depth_debug, models) =
            close_error_scope("create render passes", setup, captured).map_err(|e| {
                log::error!("[GpuState::new] Render pass setup failed: {}", e);
                e
            })?;

        let camera = viewer.camera.clone();
        let projection = perspective_projection(camera.fov_degrees, config.width, config.height, camera.near, camera.far);
        let [r, g, b] = viewer.render.clear_color;

        log::info!(
            "[GpuState::new] Ready in {:?}: {} models, shadow map {}x{}, {}x sampling",
            init_time.elapsed(),
            models.len(),
            shadow.resolution(),
            shadow.resolution(),
            sample_count
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            features,
            msaa_supported,
            sample_count,
            depth_view,
            msaa_view,
            camera,
            projection,
            clear_color: wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: 1.0,
            },
            objects,
            shadow,
            forward,
            skybox,
            depth_debug,
            models,
            last_fill_request: FillMode::Fill,
            msaa_warned: false,
            frames_rendered: 0,
            init_time,
        })
    }

    /// Reconfigure the surface and rebuild size-dependent attachments.
    /// Only the projection changes; view and model matrices are untouched.
    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        let max_texture_dimension = self.device.limits().max_texture_dimension_2d;
        let (width, height, was_clamped) =
            validate_texture_dimensions(new_size.width, new_size.height, max_texture_dimension);
        if was_clamped {
            log::warn!(
                "[GpuState::resize] Window {}x{} exceeds GPU texture limit {}, clamping to {}x{}",
                new_size.width,
                new_size.height,
                max_texture_dimension,
                width,
                height
            );
        }

        self.size = PhysicalSize::new(width, height);
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.recreate_attachments();

        self.projection =
            perspective_projection(self.camera.fov_degrees, width, height, self.camera.near, self.camera.far);
        log::debug!("[GpuState::resize] Resized to {}x{}", width, height);
    }

    fn recreate_attachments(&mut self) {
        self.depth_view = create_depth_texture(
            &self.device,
            "Depth Texture",
            self.config.width,
            self.config.height,
            self.sample_count,
        );
        self.msaa_view =
            (self.sample_count > 1).then(|| create_msaa_target(&self.device, &self.config, self.sample_count));
    }

    /// Apply the scene's MSAA and polygon-mode switches to the GPU side
    fn sync_render_settings(&mut self, scene: &SceneState) -> PipelineKey {
        let wants_msaa = scene.toggles.msaa;
        if wants_msaa && !self.msaa_supported && !self.msaa_warned {
            log::warn!("[GpuState::sync_render_settings] Multisampling requested but not supported");
            self.msaa_warned = true;
        }

        let sample_count = if wants_msaa && self.msaa_supported { MSAA_SAMPLES } else { 1 };
        if sample_count != self.sample_count {
            self.sample_count = sample_count;
            self.recreate_attachments();
            log::debug!("[GpuState::sync_render_settings] Sample count now {}", sample_count);
        }

        let requested = scene.toggles.fill_mode;
        let fill_mode = supported_fill_mode(requested, self.features);
        if requested != self.last_fill_request {
            self.last_fill_request = requested;
            if fill_mode != requested {
                log::warn!(
                    "[GpuState::sync_render_settings] {:?} polygons not supported by this adapter, drawing filled",
                    requested
                );
            }
        }

        PipelineKey {
            fill_mode,
            sample_count,
        }
    }

    fn render(&mut self, scene: &SceneState) -> Result<(), wgpu::SurfaceError> {
        let frame = scene.frame(self.projection);
        let key = self.sync_render_settings(scene);
        let show_depth_map = scene.toggles.show_depth_map;

        // One upload per frame; the shadow and lit passes read the same slots
        self.objects.write(&self.device, &self.queue, &object_uniforms(&frame));
        self.shadow.prepare(&self.queue, &frame);
        if !show_depth_map {
            self.forward.prepare(&self.device, &self.queue, key, &frame, scene);
            self.skybox.prepare(&self.device, &self.queue, key.sample_count, &frame);
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.shadow.record(&mut encoder, &frame, &self.models, &self.objects);

        if show_depth_map {
            self.depth_debug.record(&mut encoder, &view, self.clear_color);
        } else {
            let (color_view, resolve_target) = match &self.msaa_view {
                Some(msaa_view) => (msaa_view, Some(&view)),
                None => (&view, None),
            };

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Forward Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            self.forward
                .record(&mut render_pass, key, &frame, &self.models, &self.objects);
            self.skybox.record(&mut render_pass, key.sample_count);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        self.frames_rendered += 1;
        if self.frames_rendered == 1 {
            log::info!(
                "[GpuState::render] First frame rendered in {:.2}ms",
                self.init_time.elapsed().as_secs_f64() * 1000.0
            );
        }
        log::trace!("[GpuState::render] Frame {} submitted", self.frames_rendered);

        Ok(())
    }

    fn toggle_fullscreen(&self, window_config: &WindowConfig) {
        if self.window.fullscreen().is_some() {
            self.window.set_fullscreen(None);
            let _ = self
                .window
                .request_inner_size(LogicalSize::new(window_config.width, window_config.height));
            log::info!("[GpuState::toggle_fullscreen] Windowed");
            return;
        }

        let [width, height] = window_config.fullscreen_size;
        let video_mode = self.window.current_monitor().and_then(|monitor| {
            monitor
                .video_modes()
                .find(|mode| mode.size() == PhysicalSize::new(width, height))
        });

        match video_mode {
            Some(mode) => {
                log::info!("[GpuState::toggle_fullscreen] Fullscreen {}x{}", width, height);
                self.window.set_fullscreen(Some(Fullscreen::Exclusive(mode)));
            }
            None => {
                log::info!("[GpuState::toggle_fullscreen] Borderless fullscreen");
                self.window.set_fullscreen(Some(Fullscreen::Borderless(None)));
            }
        }
    }

    fn set_cursor_locked(&self, input: &mut InputState, locked: bool) {
        input.set_cursor_locked(locked);
        if !locked {
            self.window.set_cursor_grab(CursorGrabMode::None).ok();
            self.window.set_cursor_visible(true);
            return;
        }

        if let Err(e) = self.window.set_cursor_grab(CursorGrabMode::Locked) {
            log::warn!("[GpuState::set_cursor_locked] Locked grab failed ({}), confining instead", e);
            self.window.set_cursor_grab(CursorGrabMode::Confined).ok();
        }
        self.window.set_cursor_visible(false);
    }
}

pub async fn run_app(event_loop: EventLoop<()>, config: ViewerConfig) -> Result<()> {
    log::info!("[gpu_state::run_app] Starting viewer");

    // The binary initialises logging; library users may not have
    if let Err(e) = env_logger::try_init() {
        log::debug!("[gpu_state::run_app] env_logger already initialized: {}", e);
    }

    let window = Arc::new(
        WindowBuilder::new()
            .with_title(&config.window.title)
            .with_inner_size(LogicalSize::new(config.window.width, config.window.height))
            .build(&event_loop)
            .map_err(|e| {
                log::error!("[gpu_state::run_app] Window creation failed: {}", e);
                ViewerError::WindowCreation(e.to_string())
            })?,
    );

    let mut gpu_state = GpuState::new(window.clone(), &config).await?;
    let mut scene = SceneState::new(&config);
    let mut input_state = InputState::new();

    gpu_state.set_cursor_locked(&mut input_state, true);
    gpu_state.window.request_redraw();

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { ref event, window_id } if window_id == gpu_state.window.id() => match event {
            WindowEvent::CloseRequested => {
                log::info!("[gpu_state::run_app] Close requested");
                elwt.exit();
            }
            WindowEvent::Resized(physical_size) => gpu_state.resize(*physical_size),
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(keycode) = event.physical_key {
                    input_state.process_key(keycode, event.state);
                }
            }
            WindowEvent::Focused(focused) => {
                if !focused {
                    input_state.release_all();
                }
                gpu_state.set_cursor_locked(&mut input_state, *focused);
            }
            WindowEvent::RedrawRequested => {
                let requests = apply_input(&mut scene, &input_state);
                input_state.end_frame();

                if requests.close {
                    elwt.exit();
                    return;
                }
                if requests.toggle_fullscreen {
                    gpu_state.toggle_fullscreen(&config.window);
                }

                scene.update();

                match gpu_state.render(&scene) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        gpu_state.resize(gpu_state.size)
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("[gpu_state::run_app] Surface out of memory, exiting");
                        elwt.exit();
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        log::warn!("[gpu_state::run_app] Surface timeout, skipping frame");
                    }
                }
            }
            _ => {}
        },
        Event::DeviceEvent {
            event: DeviceEvent::MouseMotion { delta },
            ..
        } => {
            if input_state.is_cursor_locked() {
                input_state.process_mouse_motion(delta);
            }
        }
        Event::AboutToWait => gpu_state.window.request_redraw(),
        _ => {}
    })?;

    log::info!("[gpu_state::run_app] Event loop finished");
    Ok(())
}
