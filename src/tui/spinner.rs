//! Braille spinner. The frame index lives in `AppState::spinner_frame` and is
//! advanced on every tick.

use crate::app::SPINNER_FRAME_COUNT;

/// Sized by `SPINNER_FRAME_COUNT` so the state's wrap-around and the glyph
/// table cannot drift apart.
const FRAMES: [char; SPINNER_FRAME_COUNT] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

pub fn frame(idx: usize) -> char {
    FRAMES[idx % FRAMES.len()]
}
