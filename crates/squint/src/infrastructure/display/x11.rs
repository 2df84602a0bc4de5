//! X11 display backend built on `x11rb`.
//!
//! Implements every display port for a single X screen and runs a reader
//! thread that turns server events into [`MirrorEvent`]s.
//!
//! # What is used from the server (for beginners)
//!
//! The core protocol can open windows, copy pixels and query the pointer.
//! Everything else squint needs comes from extensions, each probed once in
//! [`X11Display::connect`]:
//!
//! | Extension   | Used for                                             | Fallback          |
//! |-------------|------------------------------------------------------|-------------------|
//! | RandR 1.5   | monitor list and layout-change notifications         | none (required)   |
//! | DAMAGE      | "this rectangle of the desktop changed" events       | fixed-rate polling|
//! | XFixes 2+   | reading the cursor bitmap and its change events      | crosshair         |
//! | SHAPE 1.1   | a cursor-shaped, click-through overlay window        | crosshair         |
//! | XInput 2.2  | raw pointer motion and key presses from any client   | pointer polling   |
//!
//! # Window layout
//!
//! ```text
//! root
//!  └─ hosting window   (top level, managed by the window manager)
//!      ├─ view         (source-sized child; background is the capture pixmap)
//!      └─ overlay      (64×64 child, shaped like the cursor; optional)
//! ```
//!
//! A capture copies the source region of the root window (including every
//! child window) into the pixmap; clearing the view makes the server repaint
//! it from that pixmap.
//!
//! # Threading
//!
//! `RustConnection` is `Send + Sync`.  The reader thread blocks in
//! `wait_for_event` on a shared connection while the control thread issues
//! requests.  The thread only needs to know which window is ours, which it
//! reads from an atomic.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;

use squint_core::domain::crosshair::{OUTLINE_RGB, OUTLINE_WIDTH};
use squint_core::{CursorImage, KeyboardMapping, Monitor, Pen, Point, Rect, Stroke, CURSOR_SIZE};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, trace, warn};
use x11rb::connection::Connection;
use x11rb::errors::{ConnectError, ConnectionError, ReplyError, ReplyOrIdError};
use x11rb::protocol::damage::{self, ConnectionExt as _};
use x11rb::protocol::randr::{self, ConnectionExt as _};
use x11rb::protocol::shape::{self, ConnectionExt as _};
use x11rb::protocol::xfixes::{self, ConnectionExt as _};
use x11rb::protocol::xinput::{self, ConnectionExt as _};
use x11rb::protocol::xproto::{
    Atom, AtomEnum, ChangeWindowAttributesAux, ClientMessageEvent, ClipOrdering,
    ConfigureWindowAux, ConnectionExt as _, CreateGCAux, CreateWindowAux, EventMask, Gcontext,
    ImageFormat, ImageOrder, Mapping, Pixmap, PropMode, Rectangle, Segment, StackMode,
    SubwindowMode, VisualClass, Window, WindowClass,
};
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;
use x11rb::{COPY_DEPTH_FROM_PARENT, COPY_FROM_PARENT, NONE};

use super::{
    Capabilities, CursorOverlay, DisplayError, DisplayProbe, EventFeeds, MirrorSurface,
    SurfaceSpec, WindowId,
};
use crate::application::events::MirrorEvent;

/// `_NET_WM_STATE` client-message actions.
const NET_WM_STATE_REMOVE: u32 = 0;
const NET_WM_STATE_ADD: u32 = 1;

/// Upper bound on parent hops when looking for a top-level ancestor.
const MAX_TREE_DEPTH: usize = 64;

// ── Error conversions ─────────────────────────────────────────────────────────

impl From<ConnectError> for DisplayError {
    fn from(e: ConnectError) -> Self {
        DisplayError::NoDisplay(e.to_string())
    }
}

impl From<ConnectionError> for DisplayError {
    fn from(e: ConnectionError) -> Self {
        DisplayError::Platform(e.to_string())
    }
}

impl From<ReplyError> for DisplayError {
    fn from(e: ReplyError) -> Self {
        DisplayError::Platform(e.to_string())
    }
}

impl From<ReplyOrIdError> for DisplayError {
    fn from(e: ReplyOrIdError) -> Self {
        DisplayError::Platform(e.to_string())
    }
}

// ── Server-side resources ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Atoms {
    net_active_window: Atom,
    net_wm_state: Atom,
    net_wm_state_fullscreen: Atom,
}

impl Atoms {
    fn intern(conn: &RustConnection) -> Result<Self, DisplayError> {
        let active = conn.intern_atom(false, b"_NET_ACTIVE_WINDOW")?;
        let state = conn.intern_atom(false, b"_NET_WM_STATE")?;
        let fullscreen = conn.intern_atom(false, b"_NET_WM_STATE_FULLSCREEN")?;
        Ok(Self {
            net_active_window: active.reply()?.atom,
            net_wm_state: state.reply()?.atom,
            net_wm_state_fullscreen: fullscreen.reply()?.atom,
        })
    }
}

/// Hosting window, view and capture pixmap.
#[derive(Debug)]
struct Surface {
    window: Window,
    view: Window,
    pixmap: Pixmap,
    copy_gc: Gcontext,
    outline_gc: Gcontext,
    core_gc: Gcontext,
}

/// Cursor overlay window with its pixel and mask pixmaps.
#[derive(Debug)]
struct Overlay {
    window: Window,
    pixels: Pixmap,
    mask: Pixmap,
    pixel_gc: Gcontext,
    mask_gc: Gcontext,
}

// ── X11Display ────────────────────────────────────────────────────────────────

/// The X11 implementation of every display port.
pub struct X11Display {
    conn: Arc<RustConnection>,
    root: Window,
    root_depth: u8,
    black_pixel: u32,
    root_size: (u16, u16),
    image_order: ImageOrder,
    bit_order: ImageOrder,
    atoms: Atoms,
    caps: Capabilities,
    /// Hosting window id shared with the reader thread; 0 when none.
    hosted: Arc<AtomicU32>,
    surface: Option<Surface>,
    overlay: Option<Overlay>,
    damage: Option<damage::Damage>,
}

impl X11Display {
    /// Connects to `$DISPLAY`, probes the optional extensions and starts the
    /// reader thread, which posts events on `events`.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::NoDisplay`] when no server can be reached and
    /// [`DisplayError::Platform`] when the initial queries fail.
    pub fn connect(events: UnboundedSender<MirrorEvent>) -> Result<Self, DisplayError> {
        let (conn, screen_num) = x11rb::connect(None)?;
        let conn = Arc::new(conn);

        let setup = conn.setup();
        let screen = setup
            .roots
            .get(screen_num)
            .ok_or_else(|| DisplayError::NoDisplay(format!("screen {screen_num} not found")))?;
        let root = screen.root;
        let root_depth = screen.root_depth;
        let black_pixel = screen.black_pixel;
        let root_size = (screen.width_in_pixels, screen.height_in_pixels);
        let true_color = root_depth == 24
            && screen
                .allowed_depths
                .iter()
                .flat_map(|d| d.visuals.iter())
                .any(|v| v.visual_id == screen.root_visual && v.class == VisualClass::TRUE_COLOR);
        let image_order = setup.image_byte_order;
        let bit_order = setup.bitmap_format_bit_order;
        let (min_keycode, max_keycode) = (setup.min_keycode, setup.max_keycode);

        let atoms = Atoms::intern(&conn)?;
        let caps = Capabilities {
            true_color,
            ..probe_extensions(&conn)
        };
        info!(?caps, root_depth, "connected to X display");

        watch_topology(&conn, root);

        let keymap = match load_keymap(&conn, min_keycode, max_keycode) {
            Ok(k) => k,
            Err(e) => {
                warn!("cannot read keyboard mapping: {e}");
                KeyboardMapping::default()
            }
        };
        let hosted = Arc::new(AtomicU32::new(0));
        let pump = EventPump {
            conn: Arc::clone(&conn),
            root,
            hosted: Arc::clone(&hosted),
            net_active_window: atoms.net_active_window,
            min_keycode,
            max_keycode,
            keymap,
            events,
        };
        thread::Builder::new()
            .name("x11-events".to_string())
            .spawn(move || pump.run())
            .map_err(|e| DisplayError::Platform(format!("cannot spawn event thread: {e}")))?;

        Ok(Self {
            conn,
            root,
            root_depth,
            black_pixel,
            root_size,
            image_order,
            bit_order,
            atoms,
            caps,
            hosted,
            surface: None,
            overlay: None,
            damage: None,
        })
    }

    fn flush(&self) {
        if let Err(e) = self.conn.flush() {
            warn!("X11 flush failed: {e}");
        }
    }

    /// Asks the window manager to add or remove the fullscreen state.
    fn set_fullscreen(&self, window: Window, on: bool) -> Result<(), DisplayError> {
        let action = if on { NET_WM_STATE_ADD } else { NET_WM_STATE_REMOVE };
        let event = ClientMessageEvent::new(
            32,
            window,
            self.atoms.net_wm_state,
            [action, self.atoms.net_wm_state_fullscreen, 0, 1, 0],
        );
        self.conn.send_event(
            false,
            self.root,
            EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
            event,
        )?;
        Ok(())
    }

    fn restack(&self, fullscreen: bool, mode: StackMode) -> Result<(), DisplayError> {
        let Some(s) = &self.surface else {
            return Err(DisplayError::SurfaceMissing);
        };
        self.conn
            .configure_window(s.window, &ConfigureWindowAux::new().stack_mode(mode))?;
        if fullscreen {
            self.set_fullscreen(s.window, mode == StackMode::ABOVE)?;
        }
        Ok(())
    }

    fn build_surface(&self, spec: &SurfaceSpec) -> Result<Surface, DisplayError> {
        let conn = &*self.conn;
        let window = conn.generate_id()?;
        let view = conn.generate_id()?;
        let pixmap = conn.generate_id()?;
        let copy_gc = conn.generate_id()?;
        let outline_gc = conn.generate_id()?;
        let core_gc = conn.generate_id()?;

        let w = spec.window;
        conn.create_window(
            COPY_DEPTH_FROM_PARENT,
            window,
            self.root,
            coord(w.x),
            coord(w.y),
            extent(w.width),
            extent(w.height),
            0,
            WindowClass::INPUT_OUTPUT,
            COPY_FROM_PARENT,
            &CreateWindowAux::new()
                .background_pixel(self.black_pixel)
                .event_mask(EventMask::STRUCTURE_NOTIFY | EventMask::BUTTON_PRESS),
        )?;
        conn.change_property8(PropMode::REPLACE, window, AtomEnum::WM_NAME, AtomEnum::STRING, b"squint")?;
        conn.change_property8(
            PropMode::REPLACE,
            window,
            AtomEnum::WM_CLASS,
            AtomEnum::STRING,
            b"squint\0Squint\0",
        )?;
        if spec.fullscreen {
            conn.change_property32(
                PropMode::REPLACE,
                window,
                self.atoms.net_wm_state,
                AtomEnum::ATOM,
                &[self.atoms.net_wm_state_fullscreen],
            )?;
        }

        let src = spec.source;
        conn.create_pixmap(self.root_depth, pixmap, self.root, extent(src.width), extent(src.height))?;
        conn.create_window(
            COPY_DEPTH_FROM_PARENT,
            view,
            window,
            0,
            0,
            extent(src.width),
            extent(src.height),
            0,
            WindowClass::INPUT_OUTPUT,
            COPY_FROM_PARENT,
            &CreateWindowAux::new().background_pixmap(pixmap),
        )?;

        conn.create_gc(
            copy_gc,
            self.root,
            &CreateGCAux::new()
                .subwindow_mode(SubwindowMode::INCLUDE_INFERIORS)
                .graphics_exposures(0u32),
        )?;
        conn.create_gc(
            outline_gc,
            pixmap,
            &CreateGCAux::new().foreground(OUTLINE_RGB).line_width(OUTLINE_WIDTH),
        )?;
        conn.create_gc(core_gc, pixmap, &CreateGCAux::new().foreground(self.black_pixel))?;

        conn.map_window(view)?;
        conn.map_window(window)?;

        Ok(Surface {
            window,
            view,
            pixmap,
            copy_gc,
            outline_gc,
            core_gc,
        })
    }

    fn build_overlay(&self, parent: Window) -> Result<Overlay, DisplayError> {
        let conn = &*self.conn;
        let window = conn.generate_id()?;
        let pixels = conn.generate_id()?;
        let mask = conn.generate_id()?;
        let pixel_gc = conn.generate_id()?;
        let mask_gc = conn.generate_id()?;
        let side = CURSOR_SIZE as u16;

        conn.create_pixmap(self.root_depth, pixels, self.root, side, side)?;
        conn.create_pixmap(1, mask, self.root, side, side)?;
        conn.create_gc(pixel_gc, pixels, &CreateGCAux::new())?;
        conn.create_gc(mask_gc, mask, &CreateGCAux::new())?;
        conn.create_window(
            COPY_DEPTH_FROM_PARENT,
            window,
            parent,
            0,
            0,
            side,
            side,
            0,
            WindowClass::INPUT_OUTPUT,
            COPY_FROM_PARENT,
            &CreateWindowAux::new().background_pixmap(pixels),
        )?;
        // Clicks fall through to the view underneath.
        conn.shape_rectangles(
            shape::SO::SET,
            shape::SK::INPUT,
            ClipOrdering::UNSORTED,
            window,
            0,
            0,
            &[],
        )?;
        conn.xfixes_select_cursor_input(self.root, xfixes::CursorNotifyMask::DISPLAY_CURSOR)?;

        Ok(Overlay {
            window,
            pixels,
            mask,
            pixel_gc,
            mask_gc,
        })
    }
}

impl DisplayProbe for X11Display {
    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn monitors(&self) -> Result<Vec<Monitor>, DisplayError> {
        let reply = self.conn.randr_get_monitors(self.root, true)?.reply()?;
        let mut monitors = Vec::with_capacity(reply.monitors.len());
        for m in reply.monitors {
            let name = match self.conn.get_atom_name(m.name)?.reply() {
                Ok(n) => String::from_utf8_lossy(&n.name).into_owned(),
                Err(_) => format!("monitor-{}", m.name),
            };
            let rect = Rect::new(m.x.into(), m.y.into(), m.width.into(), m.height.into());
            debug!(%name, ?rect, primary = m.primary, "output");
            monitors.push(Monitor::new(name, rect));
        }
        Ok(monitors)
    }

    fn root_rect(&self) -> Rect {
        match self.conn.get_geometry(self.root).map(|c| c.reply()) {
            Ok(Ok(g)) => Rect::new(0, 0, g.width.into(), g.height.into()),
            _ => Rect::new(0, 0, self.root_size.0.into(), self.root_size.1.into()),
        }
    }

    fn query_pointer(&self) -> Result<Point, DisplayError> {
        let reply = self.conn.query_pointer(self.root)?.reply()?;
        Ok(Point::new(reply.root_x.into(), reply.root_y.into()))
    }

    fn active_window(&self) -> Option<WindowId> {
        let from_wm = self
            .conn
            .get_property(false, self.root, self.atoms.net_active_window, AtomEnum::WINDOW, 0, 1)
            .ok()?
            .reply()
            .ok()
            .and_then(|r| r.value32().and_then(|mut v| v.next()))
            .filter(|w| *w != NONE);
        if from_wm.is_some() {
            return from_wm;
        }
        // Without an EWMH window manager, fall back to the input focus.
        // Values 0 and 1 are None and PointerRoot.
        let focus = self.conn.get_input_focus().ok()?.reply().ok()?.focus;
        (focus > 1 && focus != self.root).then_some(focus)
    }

    fn top_level_geometry(&self, window: WindowId) -> Option<Rect> {
        let mut top = window;
        for _ in 0..MAX_TREE_DEPTH {
            let tree = self.conn.query_tree(top).ok()?.reply().ok()?;
            if tree.parent == tree.root || tree.parent == NONE {
                break;
            }
            top = tree.parent;
        }
        let geometry = self.conn.get_geometry(top).ok()?.reply().ok()?;
        let origin = self
            .conn
            .translate_coordinates(top, self.root, 0, 0)
            .ok()?
            .reply()
            .ok()?;
        Some(Rect::new(
            origin.dst_x.into(),
            origin.dst_y.into(),
            geometry.width.into(),
            geometry.height.into(),
        ))
    }
}

impl MirrorSurface for X11Display {
    fn create_surface(&mut self, spec: &SurfaceSpec) -> Result<(), DisplayError> {
        if self.surface.is_some() {
            self.destroy_surface();
        }
        let surface = self.build_surface(spec)?;
        self.hosted.store(surface.window, Ordering::Release);
        debug!(window = surface.window, ?spec, "mirror surface created");
        self.surface = Some(surface);
        self.conn.flush()?;
        Ok(())
    }

    fn destroy_surface(&mut self) {
        let Some(s) = self.surface.take() else {
            return;
        };
        self.hosted.store(0, Ordering::Release);
        let conn = &*self.conn;
        let _ = conn.free_gc(s.core_gc);
        let _ = conn.free_gc(s.outline_gc);
        let _ = conn.free_gc(s.copy_gc);
        let _ = conn.destroy_window(s.window);
        let _ = conn.free_pixmap(s.pixmap);
        self.flush();
        debug!(window = s.window, "mirror surface destroyed");
    }

    fn set_window_geometry(&mut self, rect: Rect) -> Result<(), DisplayError> {
        let Some(s) = &self.surface else {
            return Err(DisplayError::SurfaceMissing);
        };
        self.conn.configure_window(
            s.window,
            &ConfigureWindowAux::new()
                .x(rect.x)
                .y(rect.y)
                .width(u32::from(extent(rect.width)))
                .height(u32::from(extent(rect.height))),
        )?;
        self.conn.flush()?;
        Ok(())
    }

    fn place_view(&mut self, offset: Point) {
        let Some(s) = &self.surface else {
            return;
        };
        if let Err(e) = self
            .conn
            .configure_window(s.view, &ConfigureWindowAux::new().x(offset.x).y(offset.y))
        {
            debug!("cannot move view: {e}");
        }
        self.flush();
    }

    fn raise(&mut self, fullscreen: bool) {
        if let Err(e) = self.restack(fullscreen, StackMode::ABOVE) {
            debug!("cannot raise mirror window: {e}");
        }
        self.flush();
    }

    fn lower(&mut self, fullscreen: bool) {
        if let Err(e) = self.restack(fullscreen, StackMode::BELOW) {
            debug!("cannot lower mirror window: {e}");
        }
        self.flush();
    }

    fn capture(&mut self, source: Rect) -> Result<(), DisplayError> {
        let Some(s) = &self.surface else {
            return Err(DisplayError::SurfaceMissing);
        };
        self.conn.copy_area(
            self.root,
            s.pixmap,
            s.copy_gc,
            coord(source.x),
            coord(source.y),
            0,
            0,
            extent(source.width),
            extent(source.height),
        )?;
        Ok(())
    }

    fn draw_strokes(&mut self, strokes: &[Stroke]) {
        let Some(s) = &self.surface else {
            return;
        };
        for stroke in strokes {
            let gc = match stroke.pen {
                Pen::Outline => s.outline_gc,
                Pen::Core => s.core_gc,
            };
            let segment = Segment {
                x1: coord(stroke.from.x),
                y1: coord(stroke.from.y),
                x2: coord(stroke.to.x),
                y2: coord(stroke.to.y),
            };
            if let Err(e) = self.conn.poly_segment(s.pixmap, gc, &[segment]) {
                debug!("cannot draw crosshair: {e}");
                return;
            }
        }
    }

    fn invalidate(&mut self) {
        if let Some(s) = &self.surface {
            if let Err(e) = self.conn.clear_area(false, s.view, 0, 0, 0, 0) {
                debug!("cannot repaint view: {e}");
            }
        }
        self.flush();
    }
}

impl CursorOverlay for X11Display {
    fn create_overlay(&mut self) -> Result<(), DisplayError> {
        let Some(parent) = self.surface.as_ref().map(|s| s.window) else {
            return Err(DisplayError::SurfaceMissing);
        };
        if !self.caps.cursor_overlay() {
            return Err(DisplayError::Unsupported("cursor duplication"));
        }
        self.destroy_overlay();
        let overlay = self.build_overlay(parent)?;
        self.overlay = Some(overlay);
        self.conn.flush()?;
        Ok(())
    }

    fn destroy_overlay(&mut self) {
        let Some(o) = self.overlay.take() else {
            return;
        };
        let conn = &*self.conn;
        let _ = conn.xfixes_select_cursor_input(self.root, xfixes::CursorNotifyMask::from(0u32));
        let _ = conn.destroy_window(o.window);
        let _ = conn.free_gc(o.mask_gc);
        let _ = conn.free_gc(o.pixel_gc);
        let _ = conn.free_pixmap(o.mask);
        let _ = conn.free_pixmap(o.pixels);
        self.flush();
    }

    fn fetch_cursor_image(&self) -> Result<CursorImage, DisplayError> {
        let reply = self.conn.xfixes_get_cursor_image()?.reply()?;
        CursorImage::from_argb(
            usize::from(reply.width),
            usize::from(reply.height),
            Point::new(reply.xhot.into(), reply.yhot.into()),
            &reply.cursor_image,
        )
        .ok_or_else(|| DisplayError::Platform("truncated cursor image".to_string()))
    }

    fn upload_cursor_image(&mut self, image: &CursorImage) -> Result<(), DisplayError> {
        let Some(o) = &self.overlay else {
            return Err(DisplayError::SurfaceMissing);
        };
        let side = CURSOR_SIZE as u16;
        let conn = &*self.conn;
        conn.put_image(
            ImageFormat::Z_PIXMAP,
            o.pixels,
            o.pixel_gc,
            side,
            side,
            0,
            0,
            0,
            self.root_depth,
            &pixel_bytes(image.pixels(), self.image_order),
        )?;
        conn.put_image(
            ImageFormat::XY_PIXMAP,
            o.mask,
            o.mask_gc,
            side,
            side,
            0,
            0,
            0,
            1,
            &mask_bytes(image.mask(), self.bit_order),
        )?;
        conn.shape_mask(shape::SO::SET, shape::SK::BOUNDING, o.window, 0, 0, o.mask)?;
        conn.clear_area(false, o.window, 0, 0, 0, 0)?;
        conn.flush()?;
        Ok(())
    }

    fn move_overlay(&mut self, at: Point) {
        let Some(o) = &self.overlay else {
            return;
        };
        let aux = ConfigureWindowAux::new()
            .x(at.x)
            .y(at.y)
            .stack_mode(StackMode::ABOVE);
        if let Err(e) = self.conn.configure_window(o.window, &aux) {
            debug!("cannot move cursor overlay: {e}");
        }
        self.flush();
    }

    fn set_overlay_mapped(&mut self, mapped: bool) {
        let Some(o) = &self.overlay else {
            return;
        };
        let result = if mapped {
            self.conn.map_window(o.window)
        } else {
            self.conn.unmap_window(o.window)
        };
        if let Err(e) = result {
            debug!("cannot change overlay mapping: {e}");
        }
        self.flush();
    }
}

impl EventFeeds for X11Display {
    fn start_focus_tracking(&mut self) -> Result<(), DisplayError> {
        self.conn.change_window_attributes(
            self.root,
            &ChangeWindowAttributesAux::new().event_mask(EventMask::PROPERTY_CHANGE),
        )?;
        self.conn.flush()?;
        Ok(())
    }

    fn stop_focus_tracking(&mut self) {
        let _ = self.conn.change_window_attributes(
            self.root,
            &ChangeWindowAttributesAux::new().event_mask(EventMask::NO_EVENT),
        );
        self.flush();
    }

    fn start_pointer_tracking(&mut self) -> Result<(), DisplayError> {
        if !self.caps.raw_pointer {
            return Err(DisplayError::Unsupported("XInput 2.2"));
        }
        select_raw_events(
            &self.conn,
            self.root,
            xinput::XIEventMask::RAW_MOTION | xinput::XIEventMask::RAW_KEY_PRESS,
        )?;
        self.conn.flush()?;
        Ok(())
    }

    fn stop_pointer_tracking(&mut self) {
        if let Err(e) = select_raw_events(&self.conn, self.root, xinput::XIEventMask::from(0u32)) {
            debug!("cannot deselect raw events: {e}");
        }
        self.flush();
    }

    fn start_damage(&mut self, source: Rect) -> Result<(), DisplayError> {
        if !self.caps.damage {
            return Err(DisplayError::Unsupported("DAMAGE"));
        }
        self.stop_damage();
        let id = self.conn.generate_id()?;
        self.conn
            .damage_create(id, self.root, damage::ReportLevel::RAW_RECTANGLES)?;
        self.conn.flush()?;
        self.damage = Some(id);
        debug!(?source, "damage reporting started");
        Ok(())
    }

    fn stop_damage(&mut self) {
        if let Some(id) = self.damage.take() {
            let _ = self.conn.damage_destroy(id);
            self.flush();
        }
    }
}

impl Drop for X11Display {
    fn drop(&mut self) {
        self.stop_damage();
        self.destroy_overlay();
        self.destroy_surface();
    }
}

// ── Connection helpers ────────────────────────────────────────────────────────

/// Probes the optional extensions.  `true_color` is left unset.
fn probe_extensions(conn: &RustConnection) -> Capabilities {
    let damage = conn
        .damage_query_version(1, 1)
        .ok()
        .and_then(|c| c.reply().ok())
        .is_some();
    let cursor_shape = conn
        .xfixes_query_version(5, 0)
        .ok()
        .and_then(|c| c.reply().ok())
        .is_some_and(|r| r.major_version >= 2);
    let window_shape = conn
        .shape_query_version()
        .ok()
        .and_then(|c| c.reply().ok())
        .is_some_and(|r| (r.major_version, r.minor_version) >= (1, 1));
    let raw_pointer = conn
        .xinput_xi_query_version(2, 2)
        .ok()
        .and_then(|c| c.reply().ok())
        .is_some_and(|r| (r.major_version, r.minor_version) >= (2, 2));
    Capabilities {
        raw_pointer,
        cursor_shape,
        window_shape,
        damage,
        true_color: false,
    }
}

/// Subscribes to output changes.  Without RandR the layout is never refreshed.
fn watch_topology(conn: &RustConnection, root: Window) {
    let version = conn
        .randr_query_version(1, 5)
        .ok()
        .and_then(|c| c.reply().ok());
    let Some(version) = version else {
        warn!("RandR unavailable, monitor changes will not be noticed");
        return;
    };
    debug!(major = version.major_version, minor = version.minor_version, "RandR");
    let mask = randr::NotifyMask::SCREEN_CHANGE
        | randr::NotifyMask::CRTC_CHANGE
        | randr::NotifyMask::OUTPUT_CHANGE;
    if let Err(e) = conn.randr_select_input(root, mask) {
        warn!("cannot watch monitor changes: {e}");
    }
}

fn select_raw_events(
    conn: &RustConnection,
    root: Window,
    mask: xinput::XIEventMask,
) -> Result<(), DisplayError> {
    conn.xinput_xi_select_events(
        root,
        &[xinput::EventMask {
            deviceid: xinput::Device::ALL_MASTER.into(),
            mask: vec![mask.into()],
        }],
    )?;
    Ok(())
}

fn load_keymap(conn: &RustConnection, min: u8, max: u8) -> Result<KeyboardMapping, DisplayError> {
    let count = max.saturating_sub(min).saturating_add(1);
    let reply = conn.get_keyboard_mapping(min, count)?.reply()?;
    Ok(KeyboardMapping::new(min, reply.keysyms_per_keycode, reply.keysyms))
}

// ── Event pump ────────────────────────────────────────────────────────────────

/// Reader-thread state.
struct EventPump {
    conn: Arc<RustConnection>,
    root: Window,
    hosted: Arc<AtomicU32>,
    net_active_window: Atom,
    min_keycode: u8,
    max_keycode: u8,
    keymap: KeyboardMapping,
    events: UnboundedSender<MirrorEvent>,
}

impl EventPump {
    fn run(mut self) {
        debug!("X11 event thread started");
        loop {
            let event = match self.conn.wait_for_event() {
                Ok(event) => event,
                Err(e) => {
                    error!("X11 connection lost: {e}");
                    return;
                }
            };
            let Some(event) = self.translate(event) else {
                continue;
            };
            if self.events.send(event).is_err() {
                debug!("event channel closed, X11 event thread exiting");
                return;
            }
        }
    }

    fn translate(&mut self, event: Event) -> Option<MirrorEvent> {
        let hosted = self.hosted.load(Ordering::Acquire);
        match event {
            Event::XinputRawMotion(e) => Some(MirrorEvent::PointerMoved {
                time_ms: u64::from(e.time),
            }),
            Event::XinputRawKeyPress(e) => Some(MirrorEvent::KeyPressed {
                keysym: self.keymap.keysym(e.detail).unwrap_or(0),
            }),
            Event::PropertyNotify(e) if e.window == self.root && e.atom == self.net_active_window => {
                Some(MirrorEvent::ActiveWindowChanged)
            }
            Event::ConfigureNotify(e) if hosted != 0 && e.window == hosted => {
                // Reparenting window managers report parent-relative
                // coordinates; ask the server for the root-relative origin.
                let origin = self
                    .conn
                    .translate_coordinates(hosted, self.root, 0, 0)
                    .ok()?
                    .reply()
                    .ok()?;
                Some(MirrorEvent::WindowConfigured {
                    rect: Rect::new(
                        origin.dst_x.into(),
                        origin.dst_y.into(),
                        e.width.into(),
                        e.height.into(),
                    ),
                })
            }
            Event::ButtonPress(e) if hosted != 0 && e.event == hosted => {
                Some(MirrorEvent::ButtonPressed {
                    time_ms: u64::from(e.time),
                })
            }
            Event::DamageNotify(e) => Some(MirrorEvent::Damage {
                time_ms: u64::from(e.timestamp),
                area: to_rect(e.area),
            }),
            Event::XfixesCursorNotify(_) => Some(MirrorEvent::CursorShapeChanged),
            Event::RandrScreenChangeNotify(_) | Event::RandrNotify(_) => {
                Some(MirrorEvent::TopologyChanged)
            }
            Event::MappingNotify(e) if e.request == Mapping::KEYBOARD => {
                match load_keymap(&self.conn, self.min_keycode, self.max_keycode) {
                    Ok(k) => self.keymap = k,
                    Err(e) => warn!("cannot refresh keyboard mapping: {e}"),
                }
                None
            }
            Event::Error(e) => {
                debug!(?e, "X11 request failed");
                None
            }
            other => {
                trace!(?other, "unhandled X11 event");
                None
            }
        }
    }
}

// ── Wire conversions ──────────────────────────────────────────────────────────

fn coord(v: i32) -> i16 {
    v.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

/// Window and pixmap dimensions must be at least 1.
fn extent(v: i32) -> u16 {
    v.clamp(1, i32::from(u16::MAX)) as u16
}

fn to_rect(r: Rectangle) -> Rect {
    Rect::new(r.x.into(), r.y.into(), r.width.into(), r.height.into())
}

/// 32-bit Z-pixmap scanlines in the server's byte order.
fn pixel_bytes(pixels: &[u32], order: ImageOrder) -> Vec<u8> {
    let msb = order == ImageOrder::MSB_FIRST;
    pixels
        .iter()
        .flat_map(|p| if msb { p.to_be_bytes() } else { p.to_le_bytes() })
        .collect()
}

/// Bitmap rows in the server's bit order (the mask is built LSB first).
fn mask_bytes(mask: &[u8], bit_order: ImageOrder) -> Vec<u8> {
    if bit_order == ImageOrder::MSB_FIRST {
        mask.iter().map(|b| b.reverse_bits()).collect()
    } else {
        mask.to_vec()
    }
}
