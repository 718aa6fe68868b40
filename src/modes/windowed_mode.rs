use softbuffer::Context;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use std::{num::NonZeroU32, rc::Rc, sync::Arc, time::Instant};

use log::{debug, warn};

use super::AppError;
use crate::{
    data::{
        config::SettingKey,
        sensor::SharedTilt,
        FrameOutcome, Program,
    },
    graphics::{PixelBuffer, Surface, SurfaceError},
};

const TILT_STEP: f32 = 5.0;

#[derive(Debug, Clone, Copy)]
pub struct WindowOptions {
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
}

type SoftSurface = softbuffer::Surface<Rc<Window>, Rc<Window>>;

/// A softbuffer surface with a CPU canvas that is lent out once per frame.
struct WindowSurface {
    window: Rc<Window>,
    surface: SoftSurface,
    pix: Option<PixelBuffer>,
    size: PhysicalSize<u32>,
}

impl WindowSurface {
    fn new(window: Rc<Window>) -> Result<Self, AppError> {
        let context = Context::new(window.clone())?;
        let surface = softbuffer::Surface::new(&context, window.clone())?;

        let mut this = Self {
            window,
            surface,
            pix: Some(PixelBuffer::new(0, 0)),
            size: PhysicalSize::new(0, 0),
        };

        let size = this.window.inner_size();
        this.resize(size);

        Ok(this)
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        let (Some(w), Some(h)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) else {
            // Minimized windows report a zero size; frames are skipped until
            // a real size comes back.
            self.size = PhysicalSize::new(0, 0);
            return;
        };

        if let Err(e) = self.surface.resize(w, h) {
            warn!("Unable to resize the surface buffer: {e}.");
            self.size = PhysicalSize::new(0, 0);
            return;
        }

        self.size = size;
    }

    fn present(&mut self, canvas: &PixelBuffer) -> Result<(), SurfaceError> {
        // A resize between acquire and commit leaves the canvas stale.
        if canvas.sizeu() != (self.size.width as usize, self.size.height as usize) {
            return Err(SurfaceError::Gone);
        }

        let mut buffer = self
            .surface
            .buffer_mut()
            .map_err(|e| SurfaceError::Present(e.to_string()))?;

        canvas.copy_to(&mut buffer);

        self.window.pre_present_notify();
        buffer
            .present()
            .map_err(|e| SurfaceError::Present(e.to_string()))
    }
}

impl Surface for WindowSurface {
    type Canvas = PixelBuffer;

    fn begin_frame(&mut self) -> Option<PixelBuffer> {
        if self.size.width == 0 || self.size.height == 0 {
            return None;
        }

        let mut pix = self.pix.take()?;
        pix.resize(self.size.width as usize, self.size.height as usize);
        Some(pix)
    }

    fn commit(&mut self, canvas: PixelBuffer) -> Result<(), SurfaceError> {
        let result = self.present(&canvas);
        self.pix = Some(canvas);
        result
    }
}

struct WindowState {
    prog: Program,
    tilt: Arc<SharedTilt>,
    options: WindowOptions,
    window: Option<Rc<Window>>,
    surface: Option<WindowSurface>,
    error: Option<AppError>,
}

impl ApplicationHandler for WindowState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            self.prog.on_became_visible();
            return;
        }

        match self.create_window(event_loop) {
            Ok(()) => {
                self.prog.print_startup_info();
                self.prog.on_became_visible();
            }

            Err(e) => {
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn suspended(&mut self, _: &ActiveEventLoop) {
        self.prog.on_became_hidden();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.prog.on_became_hidden();
                event_loop.exit();
            }

            WindowEvent::Occluded(hidden) => {
                debug!("Window occluded: {hidden}.");

                if hidden {
                    self.prog.on_became_hidden();
                } else {
                    self.prog.on_became_visible();
                }
            }

            WindowEvent::Resized(size) => {
                let Some(surface) = self.surface.as_mut() else {
                    warn!("Unable to resize the buffer, no surface yet.");
                    return;
                };

                surface.resize(size);
                self.prog.on_surface_resized(size.width, size.height);
            }

            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.tilt.set_held(state == ElementState::Pressed);
            }

            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed && !event.repeat =>
            {
                match event.logical_key.as_ref() {
                    Key::Named(NamedKey::Escape) => event_loop.exit(),

                    Key::Named(NamedKey::ArrowLeft) => self.tilt.nudge(-TILT_STEP),
                    Key::Named(NamedKey::ArrowRight) => self.tilt.nudge(TILT_STEP),

                    Key::Character("c") => self.toggle(SettingKey::ColorShift),
                    Key::Character("b") => self.toggle(SettingKey::Blur),
                    Key::Character("t") => self.toggle(SettingKey::Sensor),

                    Key::Character("=") => self.scale_count(|n| n.saturating_mul(2)),
                    Key::Character("-") => self.scale_count(|n| n / 2),

                    _ => {}
                }
            }

            WindowEvent::RedrawRequested => {
                let now = Instant::now();

                if !self.prog.is_frame_due(now) {
                    return;
                }

                let Some(surface) = self.surface.as_mut() else {
                    return;
                };

                if self.prog.draw_frame(surface, now) == FrameOutcome::Dropped {
                    // Usually a resize racing the frame; the next tick picks
                    // up the new size.
                    debug!("Frame dropped at {:?}.", self.prog.size());
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = self.window.as_ref() else {
            return;
        };

        match self.prog.next_deadline() {
            None => event_loop.set_control_flow(ControlFlow::Wait),

            Some(deadline) if deadline <= Instant::now() => {
                window.request_redraw();
                event_loop.set_control_flow(ControlFlow::Wait);
            }

            Some(deadline) => event_loop.set_control_flow(ControlFlow::WaitUntil(deadline)),
        }
    }
}

impl WindowState {
    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let attributes = Window::default_attributes()
            .with_title("Bubbles")
            .with_inner_size(PhysicalSize::new(self.options.width, self.options.height))
            .with_resizable(self.options.resizable);

        let window = Rc::new(event_loop.create_window(attributes)?);
        let surface = WindowSurface::new(window.clone())?;

        self.prog
            .on_surface_resized(surface.size.width, surface.size.height);

        self.window = Some(window);
        self.surface = Some(surface);

        Ok(())
    }

    fn toggle(&mut self, key: SettingKey) {
        if let Some(on) = self.prog.toggle_setting(key) {
            debug!("`{}` is now {on}.", key.name());
        }
    }

    fn scale_count(&mut self, f: impl FnOnce(usize) -> usize) {
        let count = self.prog.rescale_bubbles(f);
        debug!("Asked for {count} bubbles.");
    }
}

pub fn winit_main(
    prog: Program,
    tilt: Arc<SharedTilt>,
    options: WindowOptions,
) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;

    let mut state = WindowState {
        prog,
        tilt,
        options,
        window: None,
        surface: None,
        error: None,
    };

    event_loop.set_control_flow(ControlFlow::Wait);
    event_loop.run_app(&mut state)?;

    state.error.take().map_or(Ok(()), Err)
}
