use tracing::debug;

use crate::{
    config::{self, CloudConfig},
    sentiment::{Lexicon, Sentiment},
    types::{Rect, Size, Vec2, WordCount},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextSize {
    pub width: f32,
    pub height: f32,
}

/// Pixel extent of a label at a given font size.
pub trait TextMeasure {
    fn measure(&self, text: &str, font_px: f32) -> TextSize;
}

/// Fixed-advance approximation of a bold sans-serif face.
#[derive(Clone, Copy, Debug)]
pub struct BoldFontMetrics {
    pub advance: f32,
    pub line_height: f32,
}

impl Default for BoldFontMetrics {
    fn default() -> Self {
        Self {
            advance: 0.6,
            line_height: 1.15,
        }
    }
}

impl TextMeasure for BoldFontMetrics {
    fn measure(&self, text: &str, font_px: f32) -> TextSize {
        TextSize {
            width: text.chars().count() as f32 * font_px * self.advance,
            height: font_px * self.line_height,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlacedWord {
    pub text: String,
    pub count: u32,
    pub font_size: f32,
    pub rect: Rect,
    pub sentiment: Sentiment,
}

impl PlacedWord {
    pub fn label(&self) -> String {
        format!("{}: {}", self.text, self.count)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CloudLayout {
    pub container: Size,
    pub placed: Vec<PlacedWord>,
    /// Words the spiral search could not fit.
    pub dropped: usize,
}

impl CloudLayout {
    pub fn word_at(&self, point: Vec2) -> Option<&PlacedWord> {
        self.placed.iter().find(|w| w.rect.contains(point))
    }
}

/// Positive counts ordered by descending count; ties keep input order.
pub fn ranked(counts: &WordCount) -> Vec<(String, u32)> {
    let mut entries: Vec<(String, u32)> = counts
        .iter()
        .filter(|(_, c)| **c > 0)
        .map(|(w, c)| (w.clone(), *c))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries
}

/// Log-compressed size so outliers do not swamp the canvas.
pub fn font_size(count: u32, max_count: u32, cfg: &CloudConfig) -> f32 {
    if max_count == 0 {
        return cfg.min_font;
    }
    let frac = ((count as f32) + 1.0).ln() / ((max_count as f32) + 1.0).ln();
    (cfg.min_font + (cfg.max_font - cfg.min_font) * frac).clamp(cfg.min_font, cfg.max_font)
}

/// Greedy spiral placement, most frequent first. Words given in `words`
/// order; callers pass the output of [`ranked`].
pub fn layout<M: TextMeasure>(
    container: Size,
    words: &[(String, u32)],
    measure: &M,
    lexicon: &Lexicon,
    cfg: &CloudConfig,
) -> CloudLayout {
    let words: Vec<&(String, u32)> = words.iter().filter(|(_, c)| *c > 0).collect();
    let mut out = CloudLayout {
        container,
        placed: Vec::with_capacity(words.len()),
        dropped: 0,
    };
    if container.width < cfg.min_container || container.height < cfg.min_container {
        out.dropped = words.len();
        debug!(
            width = container.width,
            height = container.height,
            "container too small for a cloud"
        );
        return out;
    }

    let max_count = words.iter().map(|(_, c)| *c).max().unwrap_or(0);
    let center = Vec2::new(container.width / 2.0, container.height / 2.0);

    for (text, count) in words {
        let size = font_size(*count, max_count, cfg);
        let extent = measure.measure(text, size);
        match spiral_search(center, extent, container, &out.placed, cfg) {
            Some(rect) => out.placed.push(PlacedWord {
                text: text.clone(),
                count: *count,
                font_size: size,
                rect,
                sentiment: lexicon.classify(text),
            }),
            None => out.dropped += 1,
        }
    }

    debug!(
        placed = out.placed.len(),
        dropped = out.dropped,
        "cloud laid out"
    );
    out
}

fn spiral_search(
    center: Vec2,
    extent: TextSize,
    container: Size,
    placed: &[PlacedWord],
    cfg: &CloudConfig,
) -> Option<Rect> {
    let mut angle = 0.0_f32;
    let mut radius = 0.0_f32;
    for _ in 0..cfg.max_steps {
        let candidate = Rect::new(
            center.x + angle.cos() * radius - extent.width / 2.0,
            center.y + angle.sin() * radius - extent.height / 2.0,
            extent.width,
            extent.height,
        );
        let clear = placed.iter().all(|p| !candidate.overlaps(&p.rect, cfg.padding));
        if fits(&candidate, container) && clear {
            return Some(candidate);
        }
        angle += cfg.angle_step;
        radius += cfg.spiral_step;
    }
    None
}

fn fits(rect: &Rect, container: Size) -> bool {
    rect.x > 0.0 && rect.y > 0.0 && rect.right() < container.width && rect.bottom() < container.height
}

pub fn summary(words: &[(String, u32)]) -> String {
    if words.is_empty() {
        return "No submissions yet.".to_string();
    }
    let total: u64 = words.iter().map(|(_, c)| u64::from(*c)).sum();
    let top = words
        .iter()
        .take(3)
        .map(|(w, c)| format!("{w} ({c})"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("Total submissions: {total}. Top: {top}")
}

/// Floating "word: count" label that follows the pointer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tooltip {
    pub text: String,
    pub pos: Vec2,
    pub visible: bool,
}

impl Tooltip {
    /// Pointer entered or moved over `word`.
    pub fn track(&mut self, word: &PlacedWord, pointer: Vec2) {
        self.text = word.label();
        self.pos = pointer + Vec2::new(config::TOOLTIP_OFFSET_X, config::TOOLTIP_OFFSET_Y);
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Routes a pointer position through the layout's hit test.
    pub fn update(&mut self, layout: &CloudLayout, pointer: Vec2) {
        match layout.word_at(pointer) {
            Some(word) => self.track(word, pointer),
            None => self.hide(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(entries: &[(&str, u32)]) -> WordCount {
        entries.iter().map(|(w, c)| (w.to_string(), *c)).collect()
    }

    fn words(entries: &[(&str, u32)]) -> Vec<(String, u32)> {
        entries.iter().map(|(w, c)| (w.to_string(), *c)).collect()
    }

    /// Every label measures the same.
    struct FixedBox(f32, f32);

    impl TextMeasure for FixedBox {
        fn measure(&self, _text: &str, _font_px: f32) -> TextSize {
            TextSize {
                width: self.0,
                height: self.1,
            }
        }
    }

    fn assert_no_overlap(layout: &CloudLayout, padding: f32) {
        for (i, a) in layout.placed.iter().enumerate() {
            for b in &layout.placed[i + 1..] {
                assert!(
                    !a.rect.overlaps(&b.rect, padding),
                    "{} overlaps {}",
                    a.text,
                    b.text
                );
            }
        }
    }

    fn assert_inside(layout: &CloudLayout) {
        for word in &layout.placed {
            assert!(fits(&word.rect, layout.container), "{} outside", word.text);
        }
    }

    mod font_size_fn {
        use super::*;

        #[test]
        fn max_count_gets_max_font() {
            let cfg = CloudConfig::default();
            assert_eq!(font_size(5, 5, &cfg), cfg.max_font);
        }

        #[test]
        fn grows_with_count_within_bounds() {
            let cfg = CloudConfig::default();
            let mut last = 0.0;
            for count in 1..=200 {
                let size = font_size(count, 200, &cfg);
                assert!(size >= last);
                assert!(size >= cfg.min_font && size <= cfg.max_font);
                last = size;
            }
        }

        #[test]
        fn logarithmic_compression() {
            let cfg = CloudConfig::default();
            let expected = cfg.min_font + (cfg.max_font - cfg.min_font) * (2.0_f32.ln() / 6.0_f32.ln());
            assert!((font_size(1, 5, &cfg) - expected).abs() < 1e-4);
        }

        #[test]
        fn zero_max_is_min_font() {
            let cfg = CloudConfig::default();
            assert_eq!(font_size(0, 0, &cfg), cfg.min_font);
        }
    }

    mod ranked_fn {
        use super::*;

        #[test]
        fn sorts_descending_and_drops_zero() {
            let ranked = ranked(&counts(&[("a", 1), ("b", 0), ("c", 9), ("d", 4)]));
            assert_eq!(ranked, words(&[("c", 9), ("d", 4), ("a", 1)]));
        }

        #[test]
        fn ties_keep_map_order() {
            let ranked = ranked(&counts(&[("zeal", 2), ("awe", 2), ("calm", 2)]));
            assert_eq!(ranked, words(&[("awe", 2), ("calm", 2), ("zeal", 2)]));
        }
    }

    mod layout_fn {
        use super::*;

        #[test]
        fn three_word_scenario() {
            let ranked = ranked(&counts(&[("excited", 5), ("scared", 3), ("curious", 1)]));
            let container = Size::new(800.0, 600.0);
            let cfg = CloudConfig::default();
            let layout = layout(
                container,
                &ranked,
                &BoldFontMetrics::default(),
                &Lexicon::default(),
                &cfg,
            );

            assert_eq!(layout.placed.len(), 3);
            assert_eq!(layout.dropped, 0);
            assert_no_overlap(&layout, cfg.padding);
            assert_inside(&layout);

            let center = Vec2::new(400.0, 300.0);
            let distance = |w: &PlacedWord| (w.rect.center() - center).length();
            let nearest = layout
                .placed
                .iter()
                .min_by(|a, b| distance(a).total_cmp(&distance(b)))
                .expect("placed");
            assert_eq!(nearest.text, "excited");

            let sentiment = |text: &str| {
                layout
                    .placed
                    .iter()
                    .find(|w| w.text == text)
                    .map(|w| w.sentiment)
            };
            assert_eq!(sentiment("excited"), Some(Sentiment::Positive));
            assert_eq!(sentiment("scared"), Some(Sentiment::Negative));
            assert_eq!(sentiment("curious"), Some(Sentiment::Positive));
        }

        #[test]
        fn larger_counts_get_larger_fonts() {
            let ranked = ranked(&counts(&[
                ("excited", 40),
                ("scared", 12),
                ("curious", 12),
                ("hopeful", 3),
                ("nervous", 1),
            ]));
            let cfg = CloudConfig::default();
            let layout = layout(
                Size::new(1200.0, 800.0),
                &ranked,
                &BoldFontMetrics::default(),
                &Lexicon::default(),
                &cfg,
            );
            for a in &layout.placed {
                for b in &layout.placed {
                    if a.count > b.count {
                        assert!(a.font_size >= b.font_size);
                    }
                }
                assert!(a.font_size >= cfg.min_font && a.font_size <= cfg.max_font);
            }
        }

        #[test]
        fn dense_input_never_overlaps() {
            let entries: Vec<(String, u32)> = (0..80)
                .map(|i| (format!("word{i}"), 80 - i as u32))
                .collect();
            let cfg = CloudConfig::default();
            let layout = layout(
                Size::new(640.0, 480.0),
                &entries,
                &BoldFontMetrics::default(),
                &Lexicon::default(),
                &cfg,
            );
            assert_eq!(layout.placed.len() + layout.dropped, entries.len());
            assert!(layout.dropped > 0);
            assert_no_overlap(&layout, cfg.padding);
            assert_inside(&layout);
        }

        #[test]
        fn oversized_word_is_dropped_not_failed() {
            let cfg = CloudConfig::default();
            let layout = layout(
                Size::new(50.0, 50.0),
                &words(&[("enormous", 3)]),
                &FixedBox(100.0, 40.0),
                &Lexicon::default(),
                &cfg,
            );
            assert!(layout.placed.is_empty());
            assert_eq!(layout.placed.len() + layout.dropped, 1);
        }

        #[test]
        fn tiny_container_drops_everything() {
            let layout = layout(
                Size::new(30.0, 300.0),
                &words(&[("a", 2), ("b", 1)]),
                &FixedBox(5.0, 5.0),
                &Lexicon::default(),
                &CloudConfig::default(),
            );
            assert!(layout.placed.is_empty());
            assert_eq!(layout.dropped, 2);
        }

        #[test]
        fn first_word_sits_on_the_centre() {
            let layout = layout(
                Size::new(400.0, 300.0),
                &words(&[("calm", 3), ("tense", 1)]),
                &FixedBox(60.0, 20.0),
                &Lexicon::default(),
                &CloudConfig::default(),
            );
            assert_eq!(layout.placed[0].rect, Rect::new(170.0, 140.0, 60.0, 20.0));
        }

        #[test]
        fn relayout_is_deterministic() {
            let ranked = ranked(&counts(&[("excited", 5), ("scared", 3), ("curious", 1)]));
            let run = || {
                layout(
                    Size::new(800.0, 600.0),
                    &ranked,
                    &BoldFontMetrics::default(),
                    &Lexicon::default(),
                    &CloudConfig::default(),
                )
            };
            assert_eq!(run(), run());
        }
    }

    mod summary_fn {
        use super::*;

        #[test]
        fn empty_input() {
            assert_eq!(summary(&[]), "No submissions yet.");
        }

        #[test]
        fn totals_and_top_three() {
            let text = summary(&words(&[("a", 5), ("b", 3), ("c", 2), ("d", 1)]));
            assert_eq!(text, "Total submissions: 11. Top: a (5), b (3), c (2)");
        }
    }

    mod tooltip {
        use super::*;

        fn single() -> CloudLayout {
            layout(
                Size::new(400.0, 300.0),
                &words(&[("calm", 3)]),
                &FixedBox(60.0, 20.0),
                &Lexicon::default(),
                &CloudConfig::default(),
            )
        }

        #[test]
        fn hovering_a_word_shows_its_count() {
            let layout = single();
            let mut tip = Tooltip::default();
            tip.update(&layout, Vec2::new(200.0, 150.0));
            assert!(tip.visible);
            assert_eq!(tip.text, "calm: 3");
            assert_eq!(tip.pos, Vec2::new(210.0, 162.0));
        }

        #[test]
        fn leaving_hides_it() {
            let layout = single();
            let mut tip = Tooltip::default();
            tip.update(&layout, Vec2::new(200.0, 150.0));
            tip.update(&layout, Vec2::new(10.0, 10.0));
            assert!(!tip.visible);
        }
    }
}
