use anyhow::{Context, Result, anyhow};
use directories::UserDirs;
use log::{debug, info};
use serde::{Deserialize, Deserializer, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use crate::gestures::{GestureId, MAX_CLICK_MULTIPLICITY};
use crate::tracker::AxisMask;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("thresholds.max_drag must be a positive number, got {0}")]
    MaxDrag(f64),
    #[error("thresholds.stop_speed_factor must be a positive number, got {0}")]
    StopSpeed(f64),
    #[error("thresholds.deadzone must be a non-negative number, got {0}")]
    Deadzone(f64),
    #[error("thresholds.repeat_ms must be at least 1")]
    RepeatInterval,
    #[error("thresholds.spring_damping must be a positive number, got {0}")]
    SpringDamping(f64),
    #[error("thresholds.max_multi_clicks must be between 1 and 6, got {0}")]
    MaxMultiClicks(u8),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Meta {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Thresholds {
    #[serde(alias = "maxDrag")]
    pub max_drag: f64,
    #[serde(alias = "stopSpeedFactor")]
    pub stop_speed_factor: f64,
    pub deadzone: f64,
    #[serde(alias = "holdTime")]
    pub hold_ms: u64,
    #[serde(alias = "repeatTime")]
    pub repeat_ms: u64,
    #[serde(alias = "multiClickTime")]
    pub multi_click_ms: u64,
    #[serde(alias = "maxMultiClicks")]
    pub max_multi_clicks: Option<u8>,
    #[serde(alias = "returnTime")]
    pub return_ms: u64,
    #[serde(alias = "springDamping")]
    pub spring_damping: f64,
    #[serde(alias = "lockNonEntityDirs")]
    pub lock_non_entity_dirs: bool,
    pub icon_reset_ms: u64,
    pub touch_mouse_guard_ms: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_drag: 100.0,
            stop_speed_factor: 1.0,
            deadzone: 20.0,
            hold_ms: 800,
            repeat_ms: 200,
            multi_click_ms: 300,
            max_multi_clicks: None,
            return_ms: 200,
            spring_damping: 2.0,
            lock_non_entity_dirs: true,
            icon_reset_ms: 3000,
            touch_mouse_guard_ms: 200,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_drag.is_finite() && self.max_drag > 0.0) {
            return Err(ConfigError::MaxDrag(self.max_drag));
        }
        if !(self.stop_speed_factor.is_finite() && self.stop_speed_factor > 0.0) {
            return Err(ConfigError::StopSpeed(self.stop_speed_factor));
        }
        if !(self.deadzone.is_finite() && self.deadzone >= 0.0) {
            return Err(ConfigError::Deadzone(self.deadzone));
        }
        if self.repeat_ms == 0 {
            return Err(ConfigError::RepeatInterval);
        }
        if !(self.spring_damping.is_finite() && self.spring_damping > 0.0) {
            return Err(ConfigError::SpringDamping(self.spring_damping));
        }
        if let Some(n) = self.max_multi_clicks {
            if n == 0 || n > MAX_CLICK_MULTIPLICITY {
                return Err(ConfigError::MaxMultiClicks(n));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Binding {
    pub action: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Bindings {
    pub slots: BTreeMap<GestureId, Binding>,
    pub default_icon: Option<String>,
}

impl Bindings {
    pub fn get(&self, g: GestureId) -> Option<&Binding> {
        self.slots.get(&g)
    }

    pub fn action(&self, g: GestureId) -> Option<&str> {
        self.get(g).and_then(|b| b.action.as_deref())
    }

    pub fn icon(&self, g: GestureId) -> Option<&str> {
        self.get(g).and_then(|b| b.icon.as_deref())
    }

    pub fn is_bound(&self, g: GestureId) -> bool {
        self.action(g).is_some()
    }

    pub fn bind(mut self, g: GestureId, action: &str) -> Self {
        self.slots.entry(g).or_default().action = non_empty(action);
        self
    }

    pub fn with_icon(mut self, g: GestureId, icon: &str) -> Self {
        self.slots.entry(g).or_default().icon = non_empty(icon);
        self
    }

    /// Icon the widget falls back to after a gesture's icon has been shown.
    pub fn resting_icon(&self) -> Option<&str> {
        self.default_icon
            .as_deref()
            .or_else(|| self.icon(GestureId::Click))
    }

    pub fn highest_bound_click(&self) -> Option<u8> {
        (1..=MAX_CLICK_MULTIPLICITY)
            .rev()
            .find(|n| GestureId::from_click_count(*n).is_some_and(|g| self.is_bound(g)))
    }

    pub fn axis_mask(&self) -> AxisMask {
        AxisMask {
            up: self.is_bound(GestureId::Up),
            down: self.is_bound(GestureId::Down),
            left: self.is_bound(GestureId::Left),
            right: self.is_bound(GestureId::Right),
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

impl<'de> Deserialize<'de> for Bindings {
    fn deserialize<D: Deserializer<'de>>(de: D) -> std::result::Result<Self, D::Error> {
        let val = toml::Value::deserialize(de)?;
        let table = match val {
            toml::Value::Table(t) => t,
            other => {
                return Err(serde::de::Error::custom(format!(
                    "bindings must be a table, got {}",
                    other.type_str()
                )));
            }
        };
        parse_bindings(&table).map_err(serde::de::Error::custom)
    }
}

// Each slot is either `key = "action"` or `key = { action = "...", icon = "..." }`.
fn parse_bindings(table: &toml::value::Table) -> std::result::Result<Bindings, String> {
    let mut out = Bindings::default();
    for (k, v) in table {
        if k == "default_icon" || k == "icoDefault" {
            let s = v
                .as_str()
                .ok_or_else(|| format!("binding '{k}' must be a string, got {}", v.type_str()))?;
            out.default_icon = non_empty(s);
            continue;
        }
        let gesture =
            GestureId::from_binding_key(k).ok_or_else(|| format!("unknown binding key '{k}'"))?;
        let binding = match v {
            toml::Value::String(s) => Binding {
                action: non_empty(s),
                icon: None,
            },
            toml::Value::Table(t) => Binding {
                action: string_field(k, t, "action")?,
                icon: string_field(k, t, "icon")?,
            },
            other => {
                return Err(format!(
                    "binding '{k}' must be a string or a table, got {}",
                    other.type_str()
                ));
            }
        };
        out.slots.insert(gesture, binding);
    }
    Ok(out)
}

fn string_field(
    key: &str,
    t: &toml::value::Table,
    field: &str,
) -> std::result::Result<Option<String>, String> {
    match t.get(field) {
        None => Ok(None),
        Some(toml::Value::String(s)) => Ok(non_empty(s)),
        Some(other) => Err(format!(
            "binding '{key}.{field}' must be a string, got {}",
            other.type_str()
        )),
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    pub meta: Option<Meta>,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub bindings: Bindings,
}

impl Profile {
    pub fn from_toml(txt: &str) -> Result<Self> {
        let profile: Profile = toml::from_str(txt)?;
        profile.thresholds.validate()?;
        Ok(profile)
    }

    pub fn load_path(path: &Path) -> Result<Self> {
        let txt = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&txt).with_context(|| format!("failed to parse {}", path.display()))
    }
}

/// Everything the engine needs for one widget, fixed at construction.
#[derive(Debug, Clone, Serialize)]
pub struct GestureConfig {
    pub thresholds: Thresholds,
    pub bindings: Bindings,
    pub max_click_multiplicity: u8,
}

impl GestureConfig {
    pub fn new(thresholds: Thresholds, bindings: Bindings) -> Self {
        let max_click_multiplicity = thresholds
            .max_multi_clicks
            .map(|n| n.clamp(1, MAX_CLICK_MULTIPLICITY))
            .or_else(|| bindings.highest_bound_click())
            .unwrap_or(1);
        debug!("max click multiplicity: {max_click_multiplicity}");
        Self {
            thresholds,
            bindings,
            max_click_multiplicity,
        }
    }
}

impl From<Profile> for GestureConfig {
    fn from(p: Profile) -> Self {
        GestureConfig::new(p.thresholds, p.bindings)
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        GestureConfig::new(Thresholds::default(), Bindings::default())
    }
}

fn default_profile_text() -> &'static str {
    include_str!("../profiles/default.toml")
}

/// On-disk profiles under `~/.config/dragbutton`.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    pub config_dir: PathBuf,
    pub profiles_dir: PathBuf,
    pub active_ptr: PathBuf,
}

impl ProfileStore {
    pub fn user() -> Result<Self> {
        let home = UserDirs::new()
            .ok_or_else(|| anyhow!("cannot locate home directory"))?
            .home_dir()
            .to_path_buf();
        Self::open(home.join(".config").join("dragbutton"))
    }

    /// Open (and seed on first use) a store rooted at `config_dir`.
    pub fn open(config_dir: PathBuf) -> Result<Self> {
        let profiles_dir = config_dir.join("profiles");
        fs::create_dir_all(&profiles_dir)
            .with_context(|| format!("failed to create {}", profiles_dir.display()))?;

        let def_path = profiles_dir.join("default.toml");
        if !def_path.exists() {
            fs::write(&def_path, default_profile_text())?;
            info!("installed default profile at {}", def_path.display());
        }

        let active_ptr = config_dir.join("active");
        if !active_ptr.exists() {
            fs::write(&active_ptr, b"default")?;
        }

        Ok(Self {
            config_dir,
            profiles_dir,
            active_ptr,
        })
    }

    pub fn active_name(&self) -> Result<String> {
        let name = fs::read_to_string(&self.active_ptr)
            .with_context(|| format!("failed to read {}", self.active_ptr.display()))?;
        Ok(name.trim().to_string())
    }

    pub fn set_active(&self, name: &str) -> Result<()> {
        let p = self.profile_path(name);
        if !p.exists() {
            return Err(anyhow!("profile not found: {}", p.display()));
        }
        // refuse to point at a profile that would not load
        Profile::load_path(&p)?;
        fs::write(&self.active_ptr, name.as_bytes())?;
        Ok(())
    }

    pub fn profile_path(&self, name: &str) -> PathBuf {
        self.profiles_dir.join(format!("{name}.toml"))
    }

    pub fn load(&self, name: &str) -> Result<Profile> {
        Profile::load_path(&self.profile_path(name))
    }

    pub fn load_active(&self) -> Result<Profile> {
        self.load(&self.active_name()?)
    }

    pub fn list_profiles(&self) -> Vec<String> {
        let mut v = Vec::new();
        if let Ok(rd) = fs::read_dir(&self.profiles_dir) {
            for e in rd.flatten() {
                let path = e.path();
                if path.extension().is_some_and(|ext| ext == "toml") {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        v.push(stem.to_string());
                    }
                }
            }
        }
        v.sort();
        v
    }
}
