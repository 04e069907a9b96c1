// One asset's edit view: the surface being edited, the active selection and
// its recolor history. Two open assets means two independent sessions.
//
// State machine:
//   Idle --wand click--> Selected --fill--> Idle (history appended)
//   Idle --undo/redo--> Idle (history rewound / replayed)
//   Selected --wand click--> Selected (selection replaced, history untouched)
//
// Tolerance and fill color are passed in with every action instead of being
// stored here, so a handler always acts on the values the user sees now.
use log::info;

use crate::color::Rgb;
use crate::error::Result;
use crate::history::{Batch, History};
use crate::select::{self, ColorTarget, PixelSurface, Selection, ShapeSurface};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Tool {
    /// Click selects a region.
    #[default]
    Wand,
    /// Click selects a region and fills it right away (paint bucket).
    Fill,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Selected,
}

/// What the toolbar currently says.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToolSettings {
    pub tolerance: u8,
    pub fill: Rgb,
}

pub struct EditSession<T: ColorTarget> {
    surface: T,
    selection: Selection<T::Handle>,
    history: History<T::Handle>,
    tool: Tool,
}

impl<T: ColorTarget> EditSession<T> {
    pub fn new(surface: T, max_history: usize) -> Self {
        Self {
            surface,
            selection: Selection::default(),
            history: History::new(max_history),
            tool: Tool::Wand,
        }
    }

    pub fn surface(&self) -> &T {
        &self.surface
    }

    pub fn into_surface(self) -> T {
        self.surface
    }

    pub fn selection(&self) -> &Selection<T::Handle> {
        &self.selection
    }

    pub fn history(&self) -> &History<T::Handle> {
        &self.history
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn state(&self) -> SessionState {
        if self.selection.members.is_empty() { SessionState::Idle } else { SessionState::Selected }
    }

    /// Switching tools drops the selection.
    pub fn set_tool(&mut self, tool: Tool) {
        if tool != self.tool {
            self.clear_selection();
            self.tool = tool;
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::default();
    }

    /// Recolor the current selection. Nothing selected → nothing happens.
    pub fn fill(&mut self, color: Rgb) -> Batch<T::Handle> {
        if self.selection.members.is_empty() {
            return Vec::new();
        }
        let members = std::mem::take(&mut self.selection.members);
        let batch = self.history.commit_fill(&mut self.surface, &members, color);
        self.clear_selection();
        info!("Editor: filled {} element(s) with {color}", batch.len());
        batch
    }

    /// [`EditSession::fill`] with a hex color from the UI.
    pub fn fill_hex(&mut self, hex: &str) -> Result<Batch<T::Handle>> {
        let color = Rgb::parse(hex)?;
        Ok(self.fill(color))
    }

    pub fn undo(&mut self) -> bool {
        self.clear_selection();
        self.history.undo(&mut self.surface)
    }

    pub fn redo(&mut self) -> bool {
        self.clear_selection();
        self.history.redo(&mut self.surface)
    }

    fn apply_click(&mut self, selection: Selection<T::Handle>, settings: ToolSettings) {
        self.selection = selection;
        if self.tool == Tool::Fill {
            self.fill(settings.fill);
        }
    }
}

impl<T: PixelSurface> EditSession<T> {
    /// Raster click at image coordinates.
    pub fn click_at(&mut self, x: i64, y: i64, settings: ToolSettings) {
        info!("Editor: {:?} clicked [{x},{y}] tolerance [{}]", self.tool, settings.tolerance);
        let selection = select::flood_select(&self.surface, x, y, settings.tolerance);
        self.apply_click(selection, settings);
    }
}

impl<T: ShapeSurface> EditSession<T> {
    /// Vector click on a shape.
    pub fn click_shape(&mut self, shape: &T::Handle, settings: ToolSettings) {
        let selection = select::select_shapes(&self.surface, shape, settings.tolerance);
        info!(
            "Editor: wand tolerance {}, selected {} shape(s)",
            settings.tolerance,
            selection.members.len()
        );
        self.apply_click(selection, settings);
    }
}
