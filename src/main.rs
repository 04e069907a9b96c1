// What you SEE:
// • The PNG you opened, over a checkerboard where it is transparent.
// • Left click: magic wand at the cursor; the selection turns green.
// • F: fill the selection with the configured color. B toggles paint-bucket mode.
// • Z undo, Y redo (up to `max_history` fills back).
// • [ and ]: wand tolerance -5 / +5.
// • T: trace the current image to <stem>.svg in the background.
// • S: save the edited PNG as <stem>-edited.png. ESC quits.
//
// Usage: vectorwand <image.png> [config.json]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{error, info};
use minifb::Key;

use vectorwand::draw::{draw_crosshair, draw_text_5x7, fill_rect, Drawer};
use vectorwand::overlay::{self, GammaLut, View};
use vectorwand::types::FrameBuffer;
use vectorwand::worker::{self, TraceJob};
use vectorwand::{EditSession, EditorConfig, Error, Result, Tool, ToolSettings};

const MAX_WINDOW_SIDE: usize = 1024;
const TOLERANCE_STEP: u8 = 5;
const HUD_COLOR: u32 = 0x00_FF_FF_FF;
const CROSSHAIR_COLOR: u32 = 0x00_FF_CC_33;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("vectorwand=info")).init();

    /* --- Arguments + config --- */
    let mut args = env::args().skip(1);
    let Some(image_path) = args.next().map(PathBuf::from) else {
        return Err(Error::Config("usage: vectorwand <image.png> [config.json]".into()));
    };
    let config = match args.next() {
        Some(path) => EditorConfig::from_json(&fs::read_to_string(path)?)?,
        None => EditorConfig::default(),
    };
    let fill = config.fill()?;
    let mut tolerance = config.tolerance;

    /* --- Asset + session ---
       Visual: the window is sized to the image (scaled down if huge). */
    let image = image::open(&image_path)?.to_rgba8();
    let (iw, ih) = (image.width() as usize, image.height() as usize);
    info!("opened {} ({iw}x{ih})", image_path.display());

    let view = View::fit(iw, ih, MAX_WINDOW_SIDE);
    let title = format!("vectorwand - {}", file_name(&image_path));
    let mut drawer = Drawer::new(&title, view.width, view.height)?;
    let mut session = EditSession::new(image, config.max_history);

    /* --- Buffers ---
       `base` is the image + selection, rebuilt only when something changed;
       `screen` is base + crosshair + HUD, rebuilt every frame. */
    let lut = GammaLut::new();
    let mut base = FrameBuffer::new(view.width, view.height);
    let mut screen = FrameBuffer::new(view.width, view.height);
    let mut dirty = true;

    let mut trace_job: Option<(TraceJob, PathBuf)> = None;
    let mut status = String::new();

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() && !drawer.esc_pressed() {
        let settings = ToolSettings { tolerance, fill };

        /* 1) Inputs */
        if drawer.left_clicked() {
            if let Some((mx, my)) = drawer.mouse_pos() {
                let (x, y) = view.to_image(mx, my);
                session.click_at(x, y, settings);
                dirty = true;
            }
        }
        if drawer.pressed_once(Key::F) {
            let batch = session.fill(fill);
            status = format!("FILLED {}", batch.len());
            dirty = true;
        }
        if drawer.pressed_once(Key::B) {
            let next = if session.tool() == Tool::Fill { Tool::Wand } else { Tool::Fill };
            session.set_tool(next);
            dirty = true;
        }
        if drawer.pressed_once(Key::Z) {
            status = if session.undo() { "UNDO".into() } else { "NOTHING TO UNDO".into() };
            dirty = true;
        }
        if drawer.pressed_once(Key::Y) {
            status = if session.redo() { "REDO".into() } else { "NOTHING TO REDO".into() };
            dirty = true;
        }
        if drawer.pressed_repeat(Key::LeftBracket) {
            tolerance = tolerance.saturating_sub(TOLERANCE_STEP);
        }
        if drawer.pressed_repeat(Key::RightBracket) {
            tolerance = (tolerance + TOLERANCE_STEP).min(100);
        }
        if drawer.pressed_once(Key::S) {
            let out = sibling(&image_path, "-edited", "png");
            status = match session.surface().save(&out) {
                Ok(()) => format!("SAVED {}", file_name(&out)),
                Err(e) => {
                    error!("save failed: {e}");
                    "SAVE FAILED".into()
                }
            };
        }
        if drawer.pressed_once(Key::T) && trace_job.is_none() {
            let snapshot = Arc::new(session.surface().clone());
            let job = worker::spawn_vectorize(snapshot, config.trace.clone(), config.trace_timeout())?;
            trace_job = Some((job, sibling(&image_path, "", "svg")));
            status = "TRACING...".into();
        }

        /* 2) Background trace: write the SVG once it (or the fallback) lands */
        if let Some(outcome) = trace_job.as_ref().and_then(|(job, _)| job.poll()) {
            if let Some((_, out)) = trace_job.take() {
                status = match outcome.and_then(|o| {
                    fs::write(&out, o.svg())?;
                    Ok(o.is_fallback())
                }) {
                    Ok(false) => format!("TRACED {}", file_name(&out)),
                    Ok(true) => format!("TRACE TIMED OUT - COARSE {}", file_name(&out)),
                    Err(e) => {
                        error!("trace failed: {e}");
                        "TRACE FAILED".into()
                    }
                };
            }
        }

        /* 3) Image + selection overlay (only when the edit state changed) */
        if dirty {
            let mask = session.selection().mask(iw * ih);
            overlay::render(&mut base, session.surface(), &mask, view, &lut)?;
            dirty = false;
        }
        screen.pixels.copy_from_slice(&base.pixels);

        /* 4) Crosshair + HUD */
        if let Some((mx, my)) = drawer.mouse_pos() {
            draw_crosshair(&mut screen, mx as i32, my as i32, 12, CROSSHAIR_COLOR);
        }
        let tool = if session.tool() == Tool::Fill { "FILL" } else { "WAND" };
        let history = session.history();
        let hud = format!(
            "{tool} | TOL {tolerance} | SEL {} | UNDO {}/{} REDO {}",
            session.selection().len(),
            history.undo_depth(),
            history.max_depth(),
            history.redo_depth()
        );
        draw_text_5x7(&mut screen, 8, 8, &hud, HUD_COLOR);
        fill_rect(&mut screen, 8, 20, 10, 10, fill.to_u32());
        draw_text_5x7(&mut screen, 22, 22, &format!("{fill}"), HUD_COLOR);
        if !status.is_empty() {
            draw_text_5x7(&mut screen, 8, 36, &status, HUD_COLOR);
        }

        /* 5) Present */
        drawer.present(&screen)?;
    }

    Ok(())
}

/// `dir/stem.png` -> `dir/stem{suffix}.{ext}`
fn sibling(path: &Path, suffix: &str, ext: &str) -> PathBuf {
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| "out".into());
    path.with_file_name(format!("{stem}{suffix}.{ext}"))
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
}
