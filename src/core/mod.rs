use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{debug, info, warn};

use crate::{
    cloud::TextMeasure,
    config,
    error::{Error, Result},
    sentiment::{Lexicon, Sentiment},
    spatial::SpatialHash,
    types::{Rect, Size, Vec2},
};

/// Read-only geometry supplied by the host, polled every tick.
pub trait SceneGeometry {
    fn container(&self) -> Option<Size>;
    /// Obstacle in container coordinates.
    fn obstacle(&self) -> Option<Rect>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct StaticScene {
    pub container: Option<Size>,
    pub obstacle: Option<Rect>,
}

impl SceneGeometry for StaticScene {
    fn container(&self) -> Option<Size> {
        self.container
    }

    fn obstacle(&self) -> Option<Rect> {
        self.obstacle
    }
}

#[derive(Clone, Debug)]
pub struct Pill {
    pub id: usize,
    pub word: String,
    pub pos: Vec2,
    pub vel: Vec2,
    pub width: f32,
    pub height: f32,
    pub radius: f32,
    pub phase: f32,
    pub speed_bias: f32,
}

impl Pill {
    pub fn new(id: usize, word: impl Into<String>, size: Size, pos: Vec2, vel: Vec2) -> Self {
        Self {
            id,
            word: word.into(),
            pos,
            vel,
            width: size.width,
            height: size.height,
            radius: size.width.max(size.height) / 2.0 + config::PILL_MARGIN,
            phase: 0.0,
            speed_bias: 1.0,
        }
    }

    /// Presentation box centred on the pill.
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.pos.x - self.width / 2.0,
            self.pos.y - self.height / 2.0,
            self.width,
            self.height,
        )
    }
}

/// What the presentation layer gets to see of a pill.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PillView<'a> {
    pub word: &'a str,
    /// Label box, top-left anchored.
    pub rect: Rect,
    pub sentiment: Sentiment,
}

pub struct World {
    pills: Vec<Pill>,
    wander_t: f32,
    container: Size,
    spatial: SpatialHash,
    positions: Vec<Vec2>,
    neighbors: Vec<usize>,
    rng: StdRng,
}

impl World {
    /// Builds one pill per word, sized by `measure` at the label's drawn
    /// footprint. Refuses to start without both geometry references.
    pub fn start<G, M>(words: &[&str], geometry: &G, measure: &M, mut rng: StdRng) -> Result<Self>
    where
        G: SceneGeometry,
        M: TextMeasure,
    {
        let Some(container) = geometry.container() else {
            warn!("[pills] missing container; simulator not started");
            return Err(Error::Configuration("container"));
        };
        if geometry.obstacle().is_none() {
            warn!("[pills] missing obstacle; simulator not started");
            return Err(Error::Configuration("obstacle"));
        }

        let span_x = (container.width - 160.0).max(1.0);
        let span_y = (container.height - 60.0).max(1.0);
        let pills = words
            .iter()
            .enumerate()
            .map(|(id, word)| {
                let label = measure.measure(word, config::PILL_FONT_PX);
                let size = Size::new(label.width, label.height);
                let pos = Vec2::new(rng.gen_range(0.0..span_x), rng.gen_range(0.0..span_y));
                let vel = Vec2::new(rng.gen_range(-0.4..0.4), rng.gen_range(-0.4..0.4));
                let mut pill = Pill::new(id, *word, size, pos, vel);
                pill.phase = rng.gen_range(0.0..std::f32::consts::TAU);
                pill.speed_bias = rng.gen_range(0.8..1.4);
                pill
            })
            .collect::<Vec<_>>();

        info!(
            pills = pills.len(),
            width = container.width,
            height = container.height,
            "pill simulator started"
        );
        Ok(Self::with_pills(pills, container, rng))
    }

    pub fn with_pills(pills: Vec<Pill>, container: Size, rng: StdRng) -> Self {
        Self {
            pills,
            wander_t: 0.0,
            container,
            spatial: SpatialHash::new(),
            positions: Vec::new(),
            neighbors: Vec::new(),
            rng,
        }
    }

    pub fn seeded(seed: Option<u64>) -> StdRng {
        match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// One frame. A tick with no geometry available is skipped.
    pub fn tick<G: SceneGeometry>(&mut self, elapsed_ms: f32, geometry: &G) {
        let (Some(container), Some(obstacle)) = (geometry.container(), geometry.obstacle()) else {
            debug!("[pills] geometry unavailable, tick skipped");
            return;
        };
        self.container = container;

        let dt = elapsed_ms.clamp(0.0, config::MAX_FRAME_MS) / config::FRAME_MS;
        self.wander_t += config::WANDER_RATE * dt;

        self.separate();
        let zone = obstacle.expand(config::OBSTACLE_PAD);
        for i in 0..self.pills.len() {
            self.advance(i, dt, zone);
        }
    }

    /// Clamps every pill back inside `size`; velocities are kept.
    pub fn resize(&mut self, size: Size) {
        self.container = size;
        for pill in &mut self.pills {
            let r = pill.radius;
            pill.pos.x = pill.pos.x.clamp(r, (size.width - r).max(r));
            pill.pos.y = pill.pos.y.clamp(r, (size.height - r).max(r));
        }
        debug!(width = size.width, height = size.height, "[pills] clamped after resize");
    }

    pub fn pills(&self) -> &[Pill] {
        &self.pills
    }

    pub fn container(&self) -> Size {
        self.container
    }

    /// Read-only snapshot for drawing; simulation state stays private.
    pub fn views<'a>(&'a self, lexicon: &'a Lexicon) -> impl Iterator<Item = PillView<'a>> + 'a {
        self.pills().iter().map(move |pill| PillView {
            word: &pill.word,
            rect: pill.bounds(),
            sentiment: lexicon.classify(&pill.word),
        })
    }

    pub fn pill_at(&self, point: Vec2) -> Option<&Pill> {
        self.pills.iter().rev().find(|p| p.bounds().contains(point))
    }

    /// Hands the word of the pill under `point` to `on_pick`.
    pub fn activate_at(&self, point: Vec2, on_pick: impl FnOnce(&str)) -> bool {
        match self.pill_at(point) {
            Some(pill) => {
                on_pick(&pill.word);
                true
            }
            None => false,
        }
    }

    /// Deepest circle overlap among all pairs.
    pub fn max_overlap(&self) -> f32 {
        let mut worst = 0.0_f32;
        for (i, a) in self.pills.iter().enumerate() {
            for b in &self.pills[i + 1..] {
                let dist = (b.pos - a.pos).length();
                worst = worst.max(a.radius + b.radius - dist);
            }
        }
        worst
    }

    fn separate(&mut self) {
        let max_radius = self.pills.iter().map(|p| p.radius).fold(0.0, f32::max);
        self.positions.clear();
        self.positions.extend(self.pills.iter().map(|p| p.pos));
        // Two diameters leaves room for pushes made earlier in this pass.
        self.spatial.rebuild(&self.positions, max_radius * 4.0);

        for i in 0..self.pills.len() {
            self.spatial.query_neighbors(self.positions[i], &mut self.neighbors);
            for &j in &self.neighbors {
                if j <= i {
                    continue;
                }
                let (left, right) = self.pills.split_at_mut(j);
                separate_pair(&mut left[i], &mut right[0]);
            }
        }
    }

    fn advance(&mut self, i: usize, dt: f32, zone: Rect) {
        let t = self.wander_t;
        let container = self.container;
        let nudge = config::TARGET_SPEED * 0.12;
        let jitter = Vec2::new(
            self.rng.gen_range(-1.0..1.0) * nudge,
            self.rng.gen_range(-1.0..1.0) * nudge,
        );
        let pill = &mut self.pills[i];

        let id = pill.id as f32;
        pill.vel.x += (t * 0.9 + pill.phase + id * 0.37).sin() * config::DRIFT * pill.speed_bias;
        pill.vel.y += (t * 0.8 + pill.phase + id * 0.29).cos() * config::DRIFT * pill.speed_bias;

        pill.vel = pill.vel * config::FRICTION;

        if pill.vel.length() < config::MIN_SPEED {
            pill.vel += jitter;
        }

        let speed = pill.vel.length();
        if speed > config::MAX_V {
            pill.vel = pill.vel * (config::MAX_V / speed);
        }

        pill.pos += pill.vel * dt;

        bounce_walls(pill, container);
        bounce_obstacle(pill, zone, container);
    }
}

fn separate_pair(a: &mut Pill, b: &mut Pill) {
    let delta = b.pos - a.pos;
    let dist = delta.length();
    let min_dist = a.radius + b.radius;
    if dist >= min_dist {
        return;
    }
    // Coincident centres have no direction; pick one.
    let (normal, dist) = if dist < config::SEPARATION_EPSILON {
        (Vec2::new(1.0, 0.0), config::SEPARATION_EPSILON)
    } else {
        (delta.normalize(), dist)
    };
    let overlap = (min_dist - dist) * 0.5;

    a.pos -= normal * overlap;
    b.pos += normal * overlap;
    a.vel -= normal * config::PUSH;
    b.vel += normal * config::PUSH;
}

/// Velocity component pointing along `sign`, never zero.
fn outward(v: f32, sign: f32) -> f32 {
    if v == 0.0 {
        sign * config::BOUNCE_FALLBACK
    } else {
        sign * v.abs()
    }
}

fn bounce_walls(pill: &mut Pill, container: Size) {
    let r = pill.radius;
    if pill.pos.x < r {
        pill.pos.x = r;
        pill.vel.x = outward(pill.vel.x, 1.0);
    }
    if pill.pos.y < r {
        pill.pos.y = r;
        pill.vel.y = outward(pill.vel.y, 1.0);
    }
    let right = container.width - r;
    let bottom = container.height - r;
    if pill.pos.x > right {
        pill.pos.x = right;
        pill.vel.x = outward(pill.vel.x, -1.0);
    }
    if pill.pos.y > bottom {
        pill.pos.y = bottom;
        pill.vel.y = outward(pill.vel.y, -1.0);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

/// Moves a pill whose centre is inside `zone` onto the nearest zone edge
/// that keeps it within the walls. When no edge does, the nearest one is
/// used and the walls win.
fn bounce_obstacle(pill: &mut Pill, zone: Rect, container: Size) {
    if !zone.contains_strict(pill.pos) {
        return;
    }
    let r = pill.radius;
    let fits_x = |x: f32| x >= r && x <= container.width - r;
    let fits_y = |y: f32| y >= r && y <= container.height - r;

    let mut exits = [
        (pill.pos.x - zone.x, Edge::Left),
        (zone.right() - pill.pos.x, Edge::Right),
        (pill.pos.y - zone.y, Edge::Top),
        (zone.bottom() - pill.pos.y, Edge::Bottom),
    ];
    // Stable, so ties resolve left, right, top, bottom.
    exits.sort_by(|a, b| a.0.total_cmp(&b.0));
    let edge = exits
        .iter()
        .map(|&(_, edge)| edge)
        .find(|edge| match edge {
            Edge::Left => fits_x(zone.x),
            Edge::Right => fits_x(zone.right()),
            Edge::Top => fits_y(zone.y),
            Edge::Bottom => fits_y(zone.bottom()),
        })
        .unwrap_or(exits[0].1);

    match edge {
        Edge::Left => {
            pill.pos.x = zone.x;
            pill.vel.x = outward(pill.vel.x, -1.0);
        }
        Edge::Right => {
            pill.pos.x = zone.right();
            pill.vel.x = outward(pill.vel.x, 1.0);
        }
        Edge::Top => {
            pill.pos.y = zone.y;
            pill.vel.y = outward(pill.vel.y, -1.0);
        }
        Edge::Bottom => {
            pill.pos.y = zone.bottom();
            pill.vel.y = outward(pill.vel.y, 1.0);
        }
    }
    pill.pos.x = pill.pos.x.clamp(r, (container.width - r).max(r));
    pill.pos.y = pill.pos.y.clamp(r, (container.height - r).max(r));
}
