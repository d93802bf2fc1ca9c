// Pure configuration data for the merge sandbox (no Bevy dependency).
// Provides: data structures, layered loading, validation producing warnings (non-fatal), and tests.

use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Container width in world units (also the initial window width).
    pub width: f32,
    /// Container height in world units (also the initial window height).
    pub height: f32,
    pub title: String,
    /// Automatically close the app after this many seconds. 0.0 (or omitted) = run indefinitely.
    #[serde(rename = "autoClose")]
    pub auto_close: f32,
}
impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 400.0,
            height: 600.0,
            title: "Merge Balls".into(),
            auto_close: 0.0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct GravityConfig {
    pub y: f32,
}
impl Default for GravityConfig {
    fn default() -> Self {
        Self { y: -981.0 }
    }
}

/// Physical material of every ball body (spawned or merged).
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct BallConfig {
    /// Radius of a freshly spawned generation-1 ball.
    pub radius: f32,
    pub restitution: f32,
    pub friction: f32,
    pub linear_damping: f32,
}
impl Default for BallConfig {
    fn default() -> Self {
        Self {
            radius: 20.0,
            restitution: 0.8,
            friction: 0.1,
            linear_damping: 0.6,
        }
    }
}

/// Static container geometry (floor + two side walls).
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ArenaConfig {
    /// Distance from the bottom edge to the floor centre.
    pub floor_inset: f32,
    pub floor_thickness: f32,
    pub wall_thickness: f32,
}
impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            floor_inset: 20.0,
            floor_thickness: 40.0,
            wall_thickness: 10.0,
        }
    }
}

/// How the merged body's velocity is derived from its parents.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum VelocityAveraging {
    /// Component-wise mean of both parents.
    #[default]
    Symmetric,
    /// Mean on x; y is the second body's vertical velocity.
    SourceParity,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct MergeConfig {
    pub enabled: bool,
    pub velocity_averaging: VelocityAveraging,
    /// Balls at or above this generation no longer merge. 0 = unbounded.
    pub max_generation: u32,
}
impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            velocity_averaging: VelocityAveraging::Symmetric,
            max_generation: 0,
        }
    }
}
impl MergeConfig {
    pub fn generation_cap(&self) -> Option<u32> {
        (self.max_generation > 0).then_some(self.max_generation)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SpawnConfig {
    /// Number of balls dropped along the top edge at startup.
    pub initial_drop: usize,
    /// Horizontal / vertical margin kept from the container edges for random drops.
    pub drop_margin: f32,
}
impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            initial_drop: 0,
            drop_margin: 30.0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub window: WindowConfig,
    pub gravity: GravityConfig,
    pub balls: BallConfig,
    pub arena: ArenaConfig,
    pub merge: MergeConfig,
    pub spawn: SpawnConfig,
    pub rapier_debug: bool,
    pub draw_gizmos: bool,
}
impl Default for GameConfig {
    fn default() -> Self {
        Self {
            window: Default::default(),
            gravity: Default::default(),
            balls: Default::default(),
            arena: Default::default(),
            merge: Default::default(),
            spawn: Default::default(),
            rapier_debug: false,
            draw_gizmos: true,
        }
    }
}

impl GameConfig {
    /// Load from a single RON file (errors contain human-readable context).
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let data = fs::read_to_string(&path).map_err(|e| format!("read config: {e}"))?;
        ron::from_str(&data).map_err(|e| format!("parse RON: {e}"))
    }

    /// Load file; on failure returns default config plus error string.
    pub fn load_or_default(path: impl AsRef<Path>) -> (Self, Option<String>) {
        match Self::load_from_file(&path) {
            Ok(cfg) => (cfg, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Load multiple layers; later overrides earlier (deep merge).
    /// Skips missing files; returns (config, used_paths, errors).
    pub fn load_layered<P, I>(paths: I) -> (Self, Vec<String>, Vec<String>)
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = P>,
    {
        use ron::value::Value;
        let mut merged: Option<Value> = None;
        let mut used = Vec::new();
        let mut errors = Vec::new();

        fn merge_value(base: &mut Value, overlay: Value) {
            match (base, overlay) {
                (Value::Map(bm), Value::Map(om)) => {
                    for (k, v) in om.into_iter() {
                        if let Some((_, existing)) = bm.iter_mut().find(|(ek, _)| **ek == k) {
                            merge_value(existing, v);
                            continue;
                        }
                        bm.insert(k, v);
                    }
                }
                (b, o) => *b = o,
            }
        }

        for p in paths {
            let path_ref = p.as_ref();
            match fs::read_to_string(path_ref) {
                Ok(txt) => match ron::from_str::<Value>(&txt) {
                    Ok(val) => {
                        if let Some(cur) = &mut merged {
                            merge_value(cur, val);
                        } else {
                            merged = Some(val);
                        }
                        used.push(path_ref.as_os_str().to_string_lossy().to_string());
                    }
                    Err(e) => errors.push(format!("{}: parse error: {e}", path_ref.display())),
                },
                Err(e) => errors.push(format!("{}: read error: {e}", path_ref.display())),
            }
        }

        let Some(val) = merged else {
            return (GameConfig::default(), used, errors);
        };
        match val.into_rust::<GameConfig>() {
            Ok(cfg) => (cfg, used, errors),
            Err(e) => {
                errors.push(format!(
                    "failed to deserialize merged config; using defaults: {e}"
                ));
                (GameConfig::default(), used, errors)
            }
        }
    }

    /// Produce validation warnings (non-fatal) for suspicious values.
    pub fn validate(&self) -> Vec<String> {
        let mut w = Vec::new();
        if self.window.width <= 0.0 || self.window.height <= 0.0 {
            w.push("window dimensions must be > 0".into());
        }
        if self.window.width * self.window.height > 10_000_000.0 {
            w.push(format!(
                "very large window area: {}x{}",
                self.window.width, self.window.height
            ));
        }
        if self.window.auto_close < 0.0 {
            w.push(format!(
                "window.autoClose {} negative -> treated as disabled (should be >= 0)",
                self.window.auto_close
            ));
        } else if self.window.auto_close > 0.0 && self.window.auto_close < 0.01 {
            w.push(format!(
                "window.autoClose {} very small; closes almost immediately",
                self.window.auto_close
            ));
        }
        if self.gravity.y.abs() < 1e-4 {
            w.push("gravity.y magnitude near zero; balls will not fall".into());
        }
        if self.gravity.y > 0.0 {
            w.push(format!(
                "gravity.y is positive ({}); balls fall upwards away from the floor",
                self.gravity.y
            ));
        }
        if self.gravity.y < -5000.0 {
            w.push(format!(
                "gravity.y very large magnitude ({}); tunnelling through the floor possible",
                self.gravity.y
            ));
        }
        if self.balls.radius <= 0.0 {
            w.push("balls.radius must be > 0".into());
        } else if self.window.width > 0.0 && self.balls.radius * 2.0 >= self.window.width {
            w.push(format!(
                "balls.radius {} does not fit inside the container width {}",
                self.balls.radius, self.window.width
            ));
        }
        if !(0.0..=1.5).contains(&self.balls.restitution) {
            w.push(format!(
                "balls.restitution {} outside recommended 0..1.5",
                self.balls.restitution
            ));
        }
        if self.balls.friction < 0.0 {
            w.push("balls.friction negative".into());
        }
        if self.balls.linear_damping < 0.0 {
            w.push("balls.linear_damping negative -> balls accelerate on their own".into());
        }
        if self.arena.floor_thickness <= 0.0 {
            w.push("arena.floor_thickness must be > 0".into());
        }
        if self.arena.wall_thickness <= 0.0 {
            w.push("arena.wall_thickness must be > 0".into());
        }
        if self.arena.floor_inset < 0.0 {
            w.push("arena.floor_inset negative -> floor sits below the container".into());
        } else if self.arena.floor_inset >= self.window.height {
            w.push(format!(
                "arena.floor_inset {} >= window.height {}",
                self.arena.floor_inset, self.window.height
            ));
        }
        if self.merge.max_generation == 1 {
            w.push("merge.max_generation is 1; no merge can ever happen".into());
        }
        if self.spawn.drop_margin < 0.0 {
            w.push("spawn.drop_margin negative".into());
        } else if self.spawn.drop_margin * 2.0 >= self.window.width {
            w.push(format!(
                "spawn.drop_margin {} leaves no room to drop inside width {}",
                self.spawn.drop_margin, self.window.width
            ));
        }
        if self.spawn.initial_drop > 10_000 {
            w.push(format!(
                "spawn.initial_drop {} very high; performance may suffer",
                self.spawn.initial_drop
            ));
        }
        w
    }
}
