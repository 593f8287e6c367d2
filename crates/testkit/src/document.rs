use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use htmlmesh_core::{Document, Fragment};

/// Approximate glyph advance used to size unstyled fragments.
pub const GLYPH_WIDTH_PX: u32 = 8;
/// Approximate line height used to size unstyled fragments.
pub const LINE_HEIGHT_PX: u32 = 16;

#[derive(Default)]
struct DocumentState {
    next_handle: u64,
    attached: BTreeMap<u64, Fragment>,
    total_attached: usize,
}

/// Layout-free [`Document`].
///
/// Sized fragments report their style box; unsized ones are laid out as a
/// single line of fixed-width glyphs.
#[derive(Default)]
pub struct HeadlessDocument {
    state: Mutex<DocumentState>,
}

impl HeadlessDocument {
    /// Empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fragments currently attached.
    pub fn attached_count(&self) -> usize {
        self.lock().attached.len()
    }

    /// Fragments ever attached.
    pub fn total_attached(&self) -> usize {
        self.lock().total_attached
    }

    fn lock(&self) -> MutexGuard<'_, DocumentState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Client box of `fragment` as the headless document lays it out.
pub fn layout_size(fragment: &Fragment) -> (u32, u32) {
    let style = fragment.style();
    let glyphs = visible_text(fragment.inner_html()).chars().count() as u32;
    let width = style.width_px.unwrap_or(glyphs.max(1) * GLYPH_WIDTH_PX);
    let height = style.height_px.unwrap_or(LINE_HEIGHT_PX);
    (width, height)
}

fn visible_text(markup: &str) -> String {
    let mut text = String::new();
    let mut in_tag = false;
    for ch in markup.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    text.trim().to_string()
}

impl Document for HeadlessDocument {
    fn attach(&self, fragment: &Fragment) -> u64 {
        let mut state = self.lock();
        state.next_handle += 1;
        state.total_attached += 1;
        let handle = state.next_handle;
        state.attached.insert(handle, fragment.clone());
        handle
    }

    fn client_size(&self, handle: u64) -> (u32, u32) {
        self.lock()
            .attached
            .get(&handle)
            .map(layout_size)
            .unwrap_or((0, 0))
    }

    fn detach(&self, handle: u64) {
        self.lock().attached.remove(&handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use htmlmesh_core::FragmentStyle;

    #[test]
    fn styled_box_wins_over_text_layout() {
        let fragment = Fragment::new("<b>hello</b>").with_style(FragmentStyle::sized(256, 128));
        assert_eq!(layout_size(&fragment), (256, 128));
    }

    #[test]
    fn unstyled_fragment_is_one_line_of_text() {
        let fragment = Fragment::new("<button style='a: b'>OK</button>");
        assert_eq!(layout_size(&fragment), (2 * GLYPH_WIDTH_PX, LINE_HEIGHT_PX));
    }

    #[test]
    fn detached_handles_report_empty_box() {
        let document = HeadlessDocument::new();
        let handle = document.attach(&Fragment::new("x"));
        document.detach(handle);
        assert_eq!(document.client_size(handle), (0, 0));
        assert_eq!(document.attached_count(), 0);
        assert_eq!(document.total_attached(), 1);
    }
}
