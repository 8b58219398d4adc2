use std::path::PathBuf;

use clap::Parser;
use url::Url;

pub const RENDER_HZ: f32 = 60.0;

/// Terminal cell footprint in layout pixels.
pub const CELL_PX_W: f32 = 8.0;
pub const CELL_PX_H: f32 = 16.0;

// Motion simulator
pub const FRAME_MS: f32 = 16.6667;
pub const MAX_FRAME_MS: f32 = 50.0;
pub const WANDER_RATE: f32 = 0.015;
pub const MAX_V: f32 = 0.95;
pub const FRICTION: f32 = 0.996;
pub const PUSH: f32 = 0.060;
pub const OBSTACLE_PAD: f32 = 14.0;
pub const MIN_SPEED: f32 = 0.10;
pub const TARGET_SPEED: f32 = 0.28;
pub const DRIFT: f32 = 0.010;
pub const BOUNCE_FALLBACK: f32 = 0.45;
pub const SEPARATION_EPSILON: f32 = 0.0001;
pub const PILL_MARGIN: f32 = 12.0;
pub const PILL_FONT_PX: f32 = 14.0;
pub const PILL_RESIZE_DEBOUNCE_MS: u64 = 80;

pub const SUGGESTIONS: [&str; 20] = [
    "excited",
    "curious",
    "optimistic",
    "overwhelmed",
    "unprepared",
    "skeptical",
    "scared",
    "hopeful",
    "confident",
    "inspired",
    "amazed",
    "thrilled",
    "uncertain",
    "enthusiastic",
    "cautious",
    "doubtful",
    "nervous",
    "worried",
    "prepared",
    "fascinated",
];

// Cloud layout
pub const CLOUD_RESIZE_DEBOUNCE_MS: u64 = 120;
pub const SUBMIT_THROTTLE_MS: u64 = 600;
pub const TOOLTIP_OFFSET_X: f32 = 10.0;
pub const TOOLTIP_OFFSET_Y: f32 = 12.0;
/// Written beside the store by the cloud screen's download key.
pub const CLOUD_EXPORT_FILE: &str = "word-cloud.txt";

/// Knobs for the spiral placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CloudConfig {
    pub min_font: f32,
    pub max_font: f32,
    pub padding: f32,
    pub spiral_step: f32,
    pub angle_step: f32,
    pub max_steps: usize,
    pub min_container: f32,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            min_font: 16.0,
            max_font: 90.0,
            padding: 4.0,
            spiral_step: 1.9,
            angle_step: 0.25,
            max_steps: 1400,
            min_container: 40.0,
        }
    }
}

/// Runtime settings; each flag falls back to a `FEELCLOUD_*` variable.
#[derive(Debug, Clone, Parser)]
#[command(name = "feelcloud", version, about = "Collect one-word reactions and watch the cloud grow")]
pub struct Settings {
    /// Room tag segmenting submissions; defaults to the link's room, then "default"
    #[arg(long, env = "FEELCLOUD_ROOM")]
    pub room: Option<String>,

    /// Local JSON store for counts
    #[arg(long, env = "FEELCLOUD_STORE", default_value = "feelcloud.json")]
    pub store: PathBuf,

    /// Log file (the terminal belongs to the UI)
    #[arg(long, env = "FEELCLOUD_LOG", default_value = "feelcloud.log")]
    pub log: PathBuf,

    /// Open a shared cloud from a link or `?data=` query
    #[arg(long)]
    pub link: Option<String>,

    /// Page the share link points at
    #[arg(long, env = "FEELCLOUD_BASE_URL", default_value = "http://localhost/cloud.html")]
    pub base_url: Url,

    /// Seed for the pill motion
    #[arg(long, env = "FEELCLOUD_SEED")]
    pub seed: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    mod settings {
        use super::*;

        #[test]
        fn defaults_apply_without_flags() {
            let settings = Settings::try_parse_from(["feelcloud"]).expect("parse");
            assert_eq!(settings.store, PathBuf::from("feelcloud.json"));
            assert!(settings.link.is_none());
            assert!(settings.room.is_none());
            assert_eq!(settings.base_url.path(), "/cloud.html");
        }

        #[test]
        fn flags_override_defaults() {
            let settings = Settings::try_parse_from([
                "feelcloud",
                "--room",
                "acme101",
                "--seed",
                "7",
                "--link",
                "?data=e30%3D",
            ])
            .expect("parse");
            assert_eq!(settings.room.as_deref(), Some("acme101"));
            assert_eq!(settings.seed, Some(7));
            assert_eq!(settings.link.as_deref(), Some("?data=e30%3D"));
        }
    }

    mod cloud_config {
        use super::*;

        #[test]
        fn font_range_is_ordered() {
            let cfg = CloudConfig::default();
            assert!(cfg.min_font < cfg.max_font);
            assert!(cfg.max_steps > 0);
        }
    }
}
