use anyhow::Result;
use clap::Parser;
use egui::Context as EguiContext;
use morphogen_common::{BoundaryMode, GridExtent, InputState, ModelKind};
use morphogen_gpu::GpuContext;
use morphogen_render::{OrbitCamera, RaycastSettings, ShadingMode, VolumeRaycaster};
use morphogen_sim::{ModelParams, Simulation};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

const FOV_Y: f32 = std::f32::consts::FRAC_PI_4;
const NEAR: f32 = 0.001;
const FAR: f32 = 20.0;
const ZOOM_IN: f32 = 0.97;
const ZOOM_OUT: f32 = 1.03;

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum CliModel {
    GrayScott,
    FitzhughNagumo,
    Schnakenberg,
}

impl From<CliModel> for ModelKind {
    fn from(model: CliModel) -> Self {
        match model {
            CliModel::GrayScott => ModelKind::GrayScott,
            CliModel::FitzhughNagumo => ModelKind::FitzHughNagumo,
            CliModel::Schnakenberg => ModelKind::Schnakenberg,
        }
    }
}

#[derive(Parser)]
#[command(name = "morphogen", about = "GPU 3D reaction-diffusion sandbox")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Grid resolution per axis
    #[arg(long, default_value_t = 300)]
    size: u32,

    /// Chemical model to start with
    #[arg(long, value_enum, default_value = "gray-scott")]
    model: CliModel,

    /// Seed for source placement
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Application state: the live simulation, the camera, display settings,
/// and intents collected from the control panel for the next frame.
struct AppState {
    sim: Simulation,
    camera: OrbitCamera,
    settings: RaycastSettings,
    input: InputState,
    seed: u64,
    pending_model: Option<ModelKind>,
    pending_reset: bool,
    pending_add_source: bool,
    show_panel: bool,
}

impl AppState {
    fn new(gpu: &GpuContext, size: u32, kind: ModelKind, seed: u64) -> Result<Self> {
        let sim = Simulation::new(gpu, GridExtent::cube(size), kind, seed)?;
        Ok(Self {
            sim,
            camera: OrbitCamera::new(2.0),
            settings: RaycastSettings::default(),
            input: InputState::default(),
            seed,
            pending_model: None,
            pending_reset: false,
            pending_add_source: false,
            show_panel: true,
        })
    }

    /// Apply the per-frame input record: damped orbit, wheel zoom, held
    /// gravity trigger.
    fn apply_input(&mut self) {
        self.camera.rotate(self.input.dtheta, self.input.dphi);
        self.input.decay_rotation();
        let zoom = self.input.take_zoom();
        if zoom != 1.0 {
            self.camera.zoom(zoom);
        }
        self.sim.set_gravity_force(self.input.gravity_held);
    }

    /// Apply panel intents that need the GPU (model switch, reseed).
    fn apply_pending(&mut self, gpu: &GpuContext) {
        if let Some(kind) = self.pending_model.take() {
            match Simulation::new(gpu, self.sim.extent(), kind, self.seed) {
                Ok(sim) => {
                    self.sim = sim;
                    tracing::info!("switched model to {}", kind.name());
                }
                Err(e) => tracing::error!("model switch failed: {e}"),
            }
        }
        if std::mem::take(&mut self.pending_reset) {
            self.sim.reset(gpu);
        }
        if std::mem::take(&mut self.pending_add_source) {
            self.sim.add_source(gpu);
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        if !self.show_panel {
            return;
        }

        egui::SidePanel::left("controls")
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading("morphogen");
                ui.separator();

                let mut kind = self.sim.kind();
                egui::ComboBox::from_label("Model")
                    .selected_text(kind.name())
                    .show_ui(ui, |ui| {
                        for m in ModelKind::ALL {
                            ui.selectable_value(&mut kind, m, m.name());
                        }
                    });
                if kind != self.sim.kind() {
                    self.pending_model = Some(kind);
                }
                ui.separator();

                match &mut self.sim.params.model {
                    ModelParams::GrayScott(m) => {
                        ui.add(egui::Slider::new(&mut m.du, 0.001..=0.99).text("Reaction rate"));
                        ui.add(egui::Slider::new(&mut m.dv, 0.001..=0.99).text("Diffusion rate"));
                        ui.add(egui::Slider::new(&mut m.feed, 0.0001..=0.099).text("Feed rate"));
                        ui.add(
                            egui::Slider::new(&mut m.kill, 0.0001..=0.099).text("Conversion rate"),
                        );
                    }
                    ModelParams::FitzHughNagumo(m) => {
                        ui.add(egui::Slider::new(&mut m.du, 0.17..=0.4).text("Reaction rate"));
                        ui.add(egui::Slider::new(&mut m.dv, 0.003..=0.3).text("Diffusion rate"));
                        ui.add(egui::Slider::new(&mut m.epsilon, 0.0001..=0.99).text("Epsilon"));
                        ui.add(egui::Slider::new(&mut m.a, 0.0..=1.0).text("Alpha"));
                        ui.add(egui::Slider::new(&mut m.b, 0.0..=1.0).text("Beta"));
                    }
                    ModelParams::Schnakenberg(m) => {
                        ui.add(egui::Slider::new(&mut m.du, 0.001..=0.99).text("Reaction rate"));
                        ui.add(egui::Slider::new(&mut m.dv, 0.001..=0.99).text("Diffusion rate"));
                        ui.add(egui::Slider::new(&mut m.a, 0.0001..=0.099).text("Alpha"));
                        ui.add(egui::Slider::new(&mut m.b, 0.0001..=0.099).text("Beta"));
                    }
                }

                let shared = &mut self.sim.params.shared;
                ui.add(egui::Slider::new(&mut shared.wind, 0.0..=0.99).text("Wind force factor"));
                ui.add(
                    egui::Slider::new(&mut shared.gravity_factor, 0.0..=0.09)
                        .text("Gravity force factor"),
                );
                ui.add(egui::Slider::new(&mut shared.speed, 1..=20).text("Speed"));
                ui.add(egui::Slider::new(&mut shared.sources, 1..=100).text("Sources"));
                let mut wrap = shared.boundary == BoundaryMode::Wrap;
                ui.checkbox(&mut wrap, "Wrap");
                shared.boundary = if wrap {
                    BoundaryMode::Wrap
                } else {
                    BoundaryMode::Clamp
                };
                ui.checkbox(&mut shared.paused, "Pause");
                ui.separator();

                ui.add(
                    egui::Slider::new(&mut self.settings.threshold, 0.0..=1.0).text("Threshold"),
                );
                ui.add(egui::Slider::new(&mut self.settings.steps, 50.0..=400.0).text("Ray steps"));
                egui::ComboBox::from_label("Shading")
                    .selected_text(match self.settings.shading {
                        ShadingMode::Density => "Density",
                        ShadingMode::Normal => "Normal",
                    })
                    .show_ui(ui, |ui| {
                        ui.selectable_value(
                            &mut self.settings.shading,
                            ShadingMode::Density,
                            "Density",
                        );
                        ui.selectable_value(
                            &mut self.settings.shading,
                            ShadingMode::Normal,
                            "Normal",
                        );
                    });
                ui.separator();

                ui.horizontal(|ui| {
                    if ui.button("Reset scene").clicked() {
                        self.pending_reset = true;
                    }
                    if ui.button("Add source").clicked() {
                        self.pending_add_source = true;
                    }
                });

                ui.separator();
                ui.small("Drag: orbit | Wheel: zoom | Space: gravity | F1: panel");
            });
    }
}

struct GpuApp {
    size: u32,
    kind: ModelKind,
    seed: u64,
    state: Option<AppState>,
    window: Option<Arc<Window>>,
    surface: Option<wgpu::Surface<'static>>,
    gpu: Option<GpuContext>,
    config: Option<wgpu::SurfaceConfiguration>,
    raycaster: Option<VolumeRaycaster>,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
}

impl GpuApp {
    fn new(size: u32, kind: ModelKind, seed: u64) -> Self {
        Self {
            size,
            kind,
            seed,
            state: None,
            window: None,
            surface: None,
            gpu: None,
            config: None,
            raycaster: None,
            egui_ctx: EguiContext::default(),
            egui_winit: None,
            egui_renderer: None,
        }
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("morphogen")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs).expect("create window"));

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .expect("create surface");

        let gpu = match GpuContext::new(&instance, Some(&surface)) {
            Ok(gpu) => gpu,
            Err(e) => {
                tracing::error!("GPU startup failed: {e}");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(gpu.adapter());
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&gpu.device, &config);

        let raycaster = match VolumeRaycaster::new(&gpu, surface_format) {
            Ok(raycaster) => raycaster,
            Err(e) => {
                tracing::error!("display startup failed: {e}");
                event_loop.exit();
                return;
            }
        };

        let mut state = match AppState::new(&gpu, self.size, self.kind, self.seed) {
            Ok(state) => state,
            Err(e) => {
                tracing::error!("simulation startup failed: {e}");
                event_loop.exit();
                return;
            }
        };
        state
            .camera
            .perspective(FOV_Y, size.width as f32 / size.height.max(1) as f32, NEAR, FAR);

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&gpu.device, surface_format, None, 1, false);

        self.window = Some(window);
        self.surface = Some(surface);
        self.gpu = Some(gpu);
        self.config = Some(config);
        self.raycaster = Some(raycaster);
        self.state = Some(state);
        self.egui_winit = Some(egui_winit);
        self.egui_renderer = Some(egui_renderer);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(egui_winit) = &mut self.egui_winit {
            let response = egui_winit.on_window_event(self.window.as_ref().unwrap(), &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let (Some(surface), Some(gpu), Some(config)) =
                    (&self.surface, &self.gpu, &mut self.config)
                {
                    config.width = new_size.width.max(1);
                    config.height = new_size.height.max(1);
                    surface.configure(&gpu.device, config);
                    if let Some(state) = &mut self.state {
                        state.camera.perspective(
                            FOV_Y,
                            config.width as f32 / config.height.max(1) as f32,
                            NEAR,
                            FAR,
                        );
                    }
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                let pressed = key_state == ElementState::Pressed;
                if let Some(state) = &mut self.state {
                    match key {
                        KeyCode::Space => state.input.gravity_held = pressed,
                        KeyCode::F1 if pressed => state.show_panel = !state.show_panel,
                        _ => {}
                    }
                }
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: btn_state,
                ..
            } => {
                if let Some(state) = &mut self.state {
                    state.input.dragging = btn_state == ElementState::Pressed;
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if let Some(state) = &mut self.state {
                    let scroll = match delta {
                        MouseScrollDelta::LineDelta(_, y) => y,
                        MouseScrollDelta::PixelDelta(pos) => pos.y as f32,
                    };
                    if scroll != 0.0 {
                        state.input.zoom *= if scroll > 0.0 { ZOOM_IN } else { ZOOM_OUT };
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                let (Some(gpu), Some(surface), Some(raycaster), Some(state)) = (
                    &self.gpu,
                    &self.surface,
                    &self.raycaster,
                    &mut self.state,
                ) else {
                    return;
                };

                state.apply_pending(gpu);
                state.apply_input();
                state.sim.step(gpu);

                let output = match surface.get_current_texture() {
                    Ok(t) => t,
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        if let Some(config) = &self.config {
                            surface.configure(&gpu.device, config);
                        }
                        return;
                    }
                    Err(e) => {
                        tracing::error!("surface error: {e}");
                        return;
                    }
                };
                let view = output
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());

                let mut encoder =
                    gpu.device
                        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                            label: Some("display_encoder"),
                        });
                raycaster.render(
                    gpu,
                    &mut encoder,
                    &view,
                    state.sim.field(),
                    &state.camera,
                    &state.settings,
                );
                gpu.queue.submit(std::iter::once(encoder.finish()));

                let raw_input = self
                    .egui_winit
                    .as_mut()
                    .unwrap()
                    .take_egui_input(self.window.as_ref().unwrap());
                let full_output = self.egui_ctx.run(raw_input, |ctx| {
                    state.draw_ui(ctx);
                });

                self.egui_winit.as_mut().unwrap().handle_platform_output(
                    self.window.as_ref().unwrap(),
                    full_output.platform_output,
                );

                let paint_jobs = self
                    .egui_ctx
                    .tessellate(full_output.shapes, full_output.pixels_per_point);

                let screen_descriptor = egui_wgpu::ScreenDescriptor {
                    size_in_pixels: [
                        self.config.as_ref().unwrap().width,
                        self.config.as_ref().unwrap().height,
                    ],
                    pixels_per_point: full_output.pixels_per_point,
                };

                {
                    let egui_renderer = self.egui_renderer.as_mut().unwrap();
                    for (id, image_delta) in &full_output.textures_delta.set {
                        egui_renderer.update_texture(&gpu.device, &gpu.queue, *id, image_delta);
                    }
                    let mut encoder =
                        gpu.device
                            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                                label: Some("egui_encoder"),
                            });
                    egui_renderer.update_buffers(
                        &gpu.device,
                        &gpu.queue,
                        &mut encoder,
                        &paint_jobs,
                        &screen_descriptor,
                    );
                    {
                        let mut pass = encoder
                            .begin_render_pass(&wgpu::RenderPassDescriptor {
                                label: Some("egui_pass"),
                                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                                    view: &view,
                                    resolve_target: None,
                                    ops: wgpu::Operations {
                                        load: wgpu::LoadOp::Load,
                                        store: wgpu::StoreOp::Store,
                                    },
                                })],
                                depth_stencil_attachment: None,
                                ..Default::default()
                            })
                            .forget_lifetime();
                        egui_renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
                    }
                    gpu.queue.submit(std::iter::once(encoder.finish()));
                    for id in &full_output.textures_delta.free {
                        egui_renderer.free_texture(id);
                    }
                }

                output.present();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            let (Some(state), Some(window)) = (&mut self.state, &self.window) else {
                return;
            };
            if state.input.dragging {
                let size = window.inner_size();
                state.input.apply_drag(
                    delta.0 as f32,
                    delta.1 as f32,
                    size.width as f32,
                    size.height as f32,
                );
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("morphogen starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(cli.size, cli.model.into(), cli.seed);
    event_loop.run_app(&mut app)?;

    Ok(())
}
