use crate::{
    cloud::{CloudLayout, TextMeasure, TextSize, Tooltip},
    config,
    core::PillView,
    types::{ColorId, Vec2},
};

const PILL_DEPTH: f32 = 1.0;
const TOOLTIP_DEPTH: f32 = 1.0e9;
const BOLD_FONT_PX: f32 = 48.0;
const MAX_LETTER_SPACING: usize = 3;

/// Maps layout pixels onto terminal cells.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellScale {
    pub px_w: f32,
    pub px_h: f32,
}

impl Default for CellScale {
    fn default() -> Self {
        Self {
            px_w: config::CELL_PX_W,
            px_h: config::CELL_PX_H,
        }
    }
}

impl CellScale {
    pub fn to_cell(&self, p: Vec2) -> (i32, i32) {
        ((p.x / self.px_w).floor() as i32, (p.y / self.px_h).floor() as i32)
    }

    /// Centre of the cell, in pixels.
    pub fn to_px(&self, col: u16, row: u16) -> Vec2 {
        Vec2::new(
            (col as f32 + 0.5) * self.px_w,
            (row as f32 + 0.5) * self.px_h,
        )
    }
}

/// Pill footprint as drawn: one row, the word plus its brackets.
#[derive(Clone, Copy, Debug)]
pub struct PillLabelMetrics {
    scale: CellScale,
}

impl PillLabelMetrics {
    pub fn new(scale: CellScale) -> Self {
        Self { scale }
    }
}

impl TextMeasure for PillLabelMetrics {
    fn measure(&self, text: &str, _font_px: f32) -> TextSize {
        TextSize {
            width: pill_label(text).chars().count() as f32 * self.scale.px_w,
            height: self.scale.px_h,
        }
    }
}

fn pill_label(word: &str) -> String {
    format!("({word})")
}

#[derive(Clone, Copy, Debug)]
pub struct RenderCell {
    pub ch: char,
    pub depth: f32,
    pub color: ColorId,
    pub bold: bool,
}

const BLANK: RenderCell = RenderCell {
    ch: ' ',
    depth: f32::NEG_INFINITY,
    color: ColorId::Text,
    bold: false,
};

#[derive(Debug)]
pub struct FrameBuffer {
    width: u16,
    height: u16,
    cells: Vec<RenderCell>,
}

impl FrameBuffer {
    pub fn new(width: u16, height: u16) -> Self {
        let mut buffer = Self {
            width,
            height,
            cells: Vec::new(),
        };
        buffer.resize(width, height);
        buffer
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        let len = (width as usize).saturating_mul(height as usize);
        self.cells.resize(len, BLANK);
        self.clear();
    }

    pub fn clear(&mut self) {
        self.cells.fill(BLANK);
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn get(&self, x: u16, y: u16) -> RenderCell {
        debug_assert!(x < self.width && y < self.height, "get() out of bounds");
        let idx = (y as usize) * (self.width as usize) + (x as usize);
        self.cells[idx]
    }

    /// Deeper writes win; shallower ones are ignored.
    fn set(&mut self, x: i32, y: i32, ch: char, depth: f32, color: ColorId, bold: bool) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let idx = (y as usize) * (self.width as usize) + (x as usize);
        let cell = &mut self.cells[idx];
        if depth >= cell.depth {
            *cell = RenderCell {
                ch,
                depth,
                color,
                bold,
            };
        }
    }

    /// Plain text of the buffer, one line per row, trailing blanks trimmed.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for y in 0..self.height {
            let row = (0..self.width).map(|x| self.get(x, y).ch).collect::<String>();
            text.push_str(row.trim_end());
            text.push('\n');
        }
        text
    }

    fn put_str(&mut self, x: i32, y: i32, text: &str, depth: f32, color: ColorId, bold: bool) {
        for (i, ch) in text.chars().enumerate() {
            self.set(x + i as i32, y, ch, depth, color, bold);
        }
    }
}

/// Pills as `(word)` labels filling their boxes.
pub fn draw_pills<'a>(
    pills: impl IntoIterator<Item = PillView<'a>>,
    scale: CellScale,
    frame: &mut FrameBuffer,
) {
    frame.clear();
    for pill in pills {
        let label = pill_label(pill.word);
        let (x, _) = scale.to_cell(Vec2::new(pill.rect.x + scale.px_w * 0.5, 0.0));
        let (_, y) = scale.to_cell(pill.rect.center());
        frame.put_str(x, y, &label, PILL_DEPTH, pill.sentiment.color_id(), false);
    }
}

/// Placed words letter-spaced across their boxes; big fonts go bold.
pub fn draw_cloud(layout: &CloudLayout, scale: CellScale, frame: &mut FrameBuffer) {
    frame.clear();
    for word in &layout.placed {
        let len = word.text.chars().count();
        if len == 0 {
            continue;
        }
        let (col, _) = scale.to_cell(Vec2::new(word.rect.x, 0.0));
        let (_, row) = scale.to_cell(word.rect.center());
        let cols = ((word.rect.w / scale.px_w).floor() as usize).max(len);
        let spacing = if len > 1 {
            ((cols - 1) / (len - 1)).clamp(1, MAX_LETTER_SPACING)
        } else {
            1
        };
        let used = (len - 1) * spacing + 1;
        let start = col + ((cols - used) / 2) as i32;
        let bold = word.font_size >= BOLD_FONT_PX;
        let color = word.sentiment.color_id();
        for (i, ch) in word.text.chars().enumerate() {
            frame.set(
                start + (i * spacing) as i32,
                row,
                ch,
                word.font_size,
                color,
                bold,
            );
        }
    }
}

pub fn draw_tooltip(tooltip: &Tooltip, scale: CellScale, frame: &mut FrameBuffer) {
    if !tooltip.visible {
        return;
    }
    let (x, y) = scale.to_cell(tooltip.pos);
    let text = format!(" {} ", tooltip.text);
    frame.put_str(x, y, &text, TOOLTIP_DEPTH, ColorId::Tooltip, true);
}
