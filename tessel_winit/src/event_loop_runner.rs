// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use tessel_core::app::{App, AppOptions, WindowError, WindowId, WindowOptions};
use tessel_core::debug_panic;
use tessel_core::core::{InputEvent, SceneCanvas, TextShaper};
use tessel_core::kurbo::{Affine, Point};
use tessel_core::peniko::Color;
use tessel_core::vello::{AaConfig, AaSupport, RenderParams, Renderer, RendererOptions, Scene, wgpu};
use tracing::{debug, error, info_span, trace, warn};
use winit::application::ApplicationHandler;
use winit::error::EventLoopError;
use winit::event::{StartCause, WindowEvent as WinitWindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow};
use winit::window::{Window as WindowHandle, WindowId as HandleId};

use crate::app::{AppDriver, DriverCtx};
use crate::convert_winit_event::PointerState;
use crate::native::{PlatformState, WinitPlatform};
use crate::vello_util::{RenderContext, RenderSurface};

/// Events sent to the event loop from outside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TesselUserEvent {
    /// A task was queued, possibly from another thread.
    Wake,
}

/// The type of the event loop used by Tessel.
pub type EventLoop = winit::event_loop::EventLoop<TesselUserEvent>;
/// The type of the event loop builder used by Tessel.
pub type EventLoopBuilder = winit::event_loop::EventLoopBuilder<TesselUserEvent>;
/// A proxy used to send events to the event loop.
pub type EventLoopProxy = winit::event_loop::EventLoopProxy<TesselUserEvent>;

/// Per-window state the driver keeps next to the [`App`]'s `Window`.
struct WindowEntry {
    id: WindowId,
    handle: Arc<WindowHandle>,
    surface: Option<RenderSurface<'static>>,
    pointer: PointerState,
}

/// The state of a Tessel application running on winit.
///
/// If you run Tessel from an external winit event loop, create a `TesselState`
/// with [`TesselState::new`] and forward events to it through the `handle_*` methods.
pub struct TesselState {
    pub(crate) app: App,
    pub(crate) platform: PlatformState,
    pub(crate) exit: bool,
    render_cx: RenderContext,
    renderer: Option<Renderer>,
    windows: HashMap<HandleId, WindowEntry>,
    window_id_to_handle_id: HashMap<WindowId, HandleId>,
    started: bool,
}

impl std::fmt::Debug for TesselState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TesselState")
            .field("app", &self.app)
            .field("windows", &self.window_id_to_handle_id)
            .field("exit", &self.exit)
            .finish_non_exhaustive()
    }
}

struct MainState {
    tessel_state: TesselState,
    app_driver: Box<dyn AppDriver>,
}

// --- MARK: RUN
/// Build the event loop and run `app_driver` on it until the app exits.
pub fn run(
    mut loop_builder: EventLoopBuilder,
    app_driver: impl AppDriver + 'static,
) -> Result<(), EventLoopError> {
    let event_loop = loop_builder.build()?;

    run_with(event_loop, AppOptions::default(), app_driver)
}

/// Run `app_driver` on `event_loop`, with the given application options.
pub fn run_with(
    event_loop: EventLoop,
    options: AppOptions,
    app_driver: impl AppDriver + 'static,
) -> Result<(), EventLoopError> {
    // If there is no default tracing subscriber, we set our own. If one has
    // already been set, we get an error which we swallow.
    let _ = tessel_core::app::try_init_tracing();

    let mut main_state = MainState {
        tessel_state: TesselState::new(event_loop.create_proxy(), options),
        app_driver: Box::new(app_driver),
    };

    event_loop.run_app(&mut main_state)
}

impl ApplicationHandler<TesselUserEvent> for MainState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        self.tessel_state
            .handle_resumed(event_loop, self.app_driver.as_mut());
    }

    fn suspended(&mut self, event_loop: &ActiveEventLoop) {
        self.tessel_state.handle_suspended(event_loop);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        handle_id: HandleId,
        event: WinitWindowEvent,
    ) {
        self.tessel_state.handle_window_event(
            event_loop,
            handle_id,
            event,
            self.app_driver.as_mut(),
        );
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: TesselUserEvent) {
        self.tessel_state.handle_user_event(event_loop, event);
    }

    fn new_events(&mut self, event_loop: &ActiveEventLoop, cause: StartCause) {
        self.tessel_state.handle_new_events(event_loop, cause);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.tessel_state.handle_about_to_wait(event_loop);
    }
}

impl TesselState {
    /// Create the state for an app that hasn't started yet.
    ///
    /// `event_loop_proxy` is used to wake the loop when tasks are queued from other threads.
    pub fn new(event_loop_proxy: EventLoopProxy, options: AppOptions) -> Self {
        let app = App::new(options);
        let proxy = Mutex::new(event_loop_proxy);
        app.tasks().set_waker(move || {
            let proxy = proxy.lock().unwrap_or_else(PoisonError::into_inner);
            // Only fails once the loop has exited, when nobody is left to wake.
            let _ = proxy.send_event(TesselUserEvent::Wake);
        });
        Self {
            app,
            platform: PlatformState::new(),
            exit: false,
            render_cx: RenderContext::new(),
            renderer: None,
            windows: HashMap::new(),
            window_id_to_handle_id: HashMap::new(),
            started: false,
        }
    }

    /// The application's windows and task queue.
    pub fn app(&self) -> &App {
        &self.app
    }

    /// The application's windows and task queue, mutably.
    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }

    // --- MARK: WINDOWS
    pub(crate) fn open_window(
        &mut self,
        event_loop: &ActiveEventLoop,
        options: WindowOptions,
    ) -> Result<WindowId, WindowError> {
        let id = {
            let mut platform = WinitPlatform::new(event_loop, &mut self.platform);
            self.app.open_window(&mut platform, options)?
        };
        let Some(handle) = self.platform.created.pop() else {
            debug_panic!("Window {id} was opened without a winit window");
            return Ok(id);
        };
        for orphan in self.platform.created.drain(..) {
            warn!(handle = ?orphan.id(), "dropping a window opened outside of DriverCtx::open_window");
        }
        let handle_id = handle.id();
        debug!(%id, handle = ?handle_id, "registering window");
        self.window_id_to_handle_id.insert(id, handle_id);
        self.windows.insert(
            handle_id,
            WindowEntry {
                id,
                handle,
                surface: None,
                pointer: PointerState::default(),
            },
        );
        Ok(id)
    }

    /// Drop the surfaces and handles of windows the [`App`] has disposed.
    pub(crate) fn forget_disposed(&mut self) {
        let app = &self.app;
        self.windows.retain(|_, entry| {
            let alive = app.is_valid(entry.id);
            if !alive {
                debug!(id = %entry.id, "releasing window");
            }
            alive
        });
        self.window_id_to_handle_id
            .retain(|id, _| app.is_valid(*id));
    }

    /// The winit window backing `id`.
    pub fn window_handle(&self, id: WindowId) -> Option<&WindowHandle> {
        let handle_id = self.window_id_to_handle_id.get(&id)?;
        self.windows
            .get(handle_id)
            .map(|entry| entry.handle.as_ref())
    }

    // --- MARK: RESUMED
    /// Start the app the first time, or request a redraw of every window after a suspension.
    pub fn handle_resumed(&mut self, event_loop: &ActiveEventLoop, app_driver: &mut dyn AppDriver) {
        if !self.started {
            self.started = true;
            let _span = info_span!("on_start").entered();
            app_driver.on_start(&mut DriverCtx::new(self, event_loop));
        } else {
            // Surfaces were dropped on suspend and are recreated on the next redraw.
            for entry in self.windows.values() {
                entry.handle.request_redraw();
            }
        }
        self.after_callback(event_loop);
    }

    // --- MARK: SUSPENDED
    /// Release every window's surface.
    pub fn handle_suspended(&mut self, _event_loop: &ActiveEventLoop) {
        for entry in self.windows.values_mut() {
            entry.surface = None;
        }
    }

    // --- MARK: WINDOW_EVENT
    /// Translate a winit event and dispatch it to its window.
    pub fn handle_window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        handle_id: HandleId,
        event: WinitWindowEvent,
        app_driver: &mut dyn AppDriver,
    ) {
        let Some(entry) = self.windows.get_mut(&handle_id) else {
            trace!(?event, "Got window event for unknown window {:?}", handle_id);
            return;
        };
        let id = entry.id;
        let _span = info_span!("window_event", window = %id).entered();
        let scale_factor = entry.handle.scale_factor();

        let mut inputs: Vec<InputEvent> = Vec::new();
        match event {
            WinitWindowEvent::RedrawRequested => {
                self.redraw(handle_id, app_driver.text_shaper());
            }
            WinitWindowEvent::CloseRequested => {
                app_driver.on_close_requested(id, &mut DriverCtx::new(self, event_loop));
            }
            WinitWindowEvent::Resized(_) | WinitWindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = self.app.window_mut(id) {
                    window.resized();
                }
            }
            WinitWindowEvent::Focused(focused) => {
                if focused {
                    self.app.set_active_window(Some(id));
                } else if self.app.active_window() == Some(id) {
                    self.app.set_active_window(None);
                }
            }
            WinitWindowEvent::ModifiersChanged(modifiers) => {
                entry.pointer.set_modifiers(modifiers.state());
            }
            WinitWindowEvent::CursorEntered { .. } => {
                inputs.push(entry.pointer.cursor_entered());
            }
            WinitWindowEvent::CursorMoved { position, .. } => {
                let position = position.to_logical::<f64>(scale_factor);
                inputs.push(entry.pointer.cursor_moved(Point::new(position.x, position.y)));
            }
            WinitWindowEvent::CursorLeft { .. } => {
                inputs.push(InputEvent::MouseExit);
            }
            WinitWindowEvent::MouseInput { state, button, .. } => {
                inputs.extend(entry.pointer.mouse_input(state, button, Instant::now()));
            }
            WinitWindowEvent::MouseWheel { delta, .. } => {
                inputs.push(entry.pointer.wheel(delta, scale_factor));
            }
            WinitWindowEvent::KeyboardInput {
                event,
                is_synthetic: false,
                ..
            } => {
                inputs.extend(entry.pointer.keyboard_input(
                    &event.logical_key,
                    event.text.as_deref(),
                    event.state,
                    event.repeat,
                ));
            }
            WinitWindowEvent::DroppedFile(path) => {
                inputs.push(InputEvent::FileDrop(vec![path]));
            }
            _ => (),
        }

        for input in inputs {
            if !input.is_very_frequent() {
                debug!(event = input.short_name(), "dispatching");
            }
            if let Err(err) = self.app.dispatch(id, input) {
                // The window was disposed by an earlier event in this batch.
                trace!(%err, "dropping input");
                break;
            }
        }
        self.after_callback(event_loop);
    }

    // --- MARK: USER_EVENT
    /// Handle an event sent through an [`EventLoopProxy`].
    pub fn handle_user_event(&mut self, _event_loop: &ActiveEventLoop, event: TesselUserEvent) {
        match event {
            // Queued tasks run in `handle_about_to_wait`.
            TesselUserEvent::Wake => trace!("woken by the task queue"),
        }
    }

    /// Called when the loop wakes up, before any events are delivered.
    pub fn handle_new_events(&mut self, _: &ActiveEventLoop, _: StartCause) {}

    // --- MARK: TASKS
    /// Run one due task, then sleep until the next one is due.
    ///
    /// Input is looked at again between two tasks: while tasks are pending the
    /// loop polls instead of running them back to back.
    pub fn handle_about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let control_flow = tick_once(&mut self.app);
        self.after_callback(event_loop);
        if self.exit {
            return;
        }
        event_loop.set_control_flow(control_flow);
    }

    fn after_callback(&mut self, event_loop: &ActiveEventLoop) {
        self.forget_disposed();
        if self.exit {
            event_loop.exit();
        }
    }

    // --- MARK: RENDER
    fn redraw(&mut self, handle_id: HandleId, shaper: Option<&dyn TextShaper>) {
        let Some(entry) = self.windows.get_mut(&handle_id) else {
            return;
        };
        let Some(window) = self.app.window_mut(entry.id) else {
            return;
        };
        let _span = info_span!("redraw").entered();

        let mut scene = Scene::new();
        {
            let mut canvas = SceneCanvas::new(&mut scene)
                .with_transform(Affine::scale(entry.handle.scale_factor()));
            if let Some(shaper) = shaper {
                canvas = canvas.with_shaper(shaper);
            }
            window.draw(&mut canvas);
        }

        // https://github.com/rust-windowing/winit/issues/2308
        #[cfg(target_os = "ios")]
        let size = entry.handle.outer_size();
        #[cfg(not(target_os = "ios"))]
        let size = entry.handle.inner_size();
        if size.width == 0 || size.height == 0 {
            return;
        }

        if entry.surface.is_none() {
            let surface = pollster::block_on(self.render_cx.create_surface(
                entry.handle.clone(),
                size.width,
                size.height,
                wgpu::PresentMode::AutoVsync,
            ));
            match surface {
                Ok(surface) => entry.surface = Some(surface),
                Err(err) => {
                    error!(%err, "failed to create a surface");
                    return;
                }
            }
        }
        let Some(surface) = entry.surface.as_mut() else {
            return;
        };
        Self::render(
            surface,
            &entry.handle,
            &scene,
            &self.render_cx,
            &mut self.renderer,
        );
    }

    fn render(
        surface: &mut RenderSurface<'_>,
        handle: &WindowHandle,
        scene: &Scene,
        render_cx: &RenderContext,
        renderer: &mut Option<Renderer>,
    ) {
        #[cfg(target_os = "ios")]
        let size = handle.outer_size();
        #[cfg(not(target_os = "ios"))]
        let size = handle.inner_size();
        let (width, height) = (size.width, size.height);
        if surface.config.width != width || surface.config.height != height {
            render_cx.resize_surface(surface, width, height);
        }

        let dev_id = surface.dev_id;
        let device = &render_cx.devices[dev_id].device;
        let queue = &render_cx.devices[dev_id].queue;

        if renderer.is_none() {
            let options = RendererOptions {
                antialiasing_support: AaSupport::area_only(),
                ..Default::default()
            };
            match Renderer::new(device, options) {
                Ok(new_renderer) => *renderer = Some(new_renderer),
                Err(err) => {
                    error!(%err, "failed to create the renderer");
                    return;
                }
            }
        }
        let Some(renderer) = renderer.as_mut() else {
            return;
        };

        let render_params = RenderParams {
            base_color: Color::WHITE,
            width,
            height,
            antialiasing_method: AaConfig::Area,
        };
        let _render_span = info_span!("Rendering using Vello").entered();
        if let Err(err) =
            renderer.render_to_texture(device, queue, scene, &surface.target_view, &render_params)
        {
            error!(%err, "failed to render to surface");
            return;
        }

        let Ok(surface_texture) = surface.surface.get_current_texture() else {
            error!("failed to acquire next swapchain texture");
            return;
        };

        // Copy the new surface content to the surface.
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Surface Blit"),
        });
        surface.blitter.copy(
            device,
            &mut encoder,
            &surface.target_view,
            &surface_texture
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default()),
        );
        queue.submit([encoder.finish()]);
        handle.pre_present_notify();
        surface_texture.present();
    }
}

/// Run one iteration of the UI loop and pick how long winit may sleep afterwards.
fn tick_once(app: &mut App) -> ControlFlow {
    let tick = app.tick();
    if tick.pending > 0 {
        ControlFlow::Poll
    } else if let Some(deadline) = tick.next_deadline {
        ControlFlow::WaitUntil(deadline)
    } else {
        ControlFlow::Wait
    }
}

// --- MARK: TESTS
#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    #[test]
    fn each_wake_runs_a_single_task() {
        let mut app = App::default();
        let ran = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let ran = ran.clone();
            app.tasks().invoke(move |_| {
                ran.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert_eq!(tick_once(&mut app), ControlFlow::Poll);
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert_eq!(tick_once(&mut app), ControlFlow::Poll);
        assert_eq!(ran.load(Ordering::SeqCst), 2);
        assert_eq!(tick_once(&mut app), ControlFlow::Wait);
        assert_eq!(ran.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn sleeps_until_the_next_delayed_task() {
        let mut app = App::default();
        app.tasks().invoke_after(|_| {}, Duration::from_secs(60));

        assert!(matches!(tick_once(&mut app), ControlFlow::WaitUntil(_)));
    }
}
