use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::GeneratedLevel;

#[derive(tui_dispatch::Action, Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[action(infer_categories)]
pub enum Action {
    Init,
    MapGenerated(GeneratedLevel),
    GenerationFailed(String),
    NextGenerator,
    Reseed,

    /// Terminal cells available to the map.
    ViewResize { x: u16, y: u16, width: u16, height: u16 },
    /// Camera movement in terminal cells.
    ViewPan { dx: i16, dy: i16 },
    /// Positive steps zoom out, negative zoom in; `at` is a terminal cell,
    /// `None` zooms around the centre.
    ViewZoom { at: Option<(u16, u16)>, steps: i8 },
    ViewCenter,
    DragStart { column: u16, row: u16 },
    DragMove { column: u16, row: u16 },
    DragEnd,

    NextAnimation,
    ToggleLayer,
    /// Milliseconds since the previous tick.
    Tick(u32),
}
