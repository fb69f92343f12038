//! Time-keyed layer events
//!
//! Events ride inside a layer's pose and fire once when the layer's
//! normalized progress first reaches their `time`.

use crate::joint::{canonicalize_limb, Limb};
use crate::lenient::Fields;
use serde_json::Value;

/// Frame an impulse direction is expressed in
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ImpulseFrame {
    /// Absolute world angle
    #[default]
    World,
    /// Relative to the actor's current aim angle
    Aim,
    /// Relative to the actor's facing (mirrored when facing left)
    Facing,
}

/// What an event does when it fires
#[derive(Clone, Debug, PartialEq)]
pub enum LayerEventKind {
    /// Overwrite velocity components that are present
    SetVelocity { x: Option<f32>, y: Option<f32> },
    /// Add `magnitude` along `direction_deg` (aim convention)
    Impulse {
        magnitude: f32,
        direction_deg: f32,
        frame: ImpulseFrame,
        /// Treat the direction as body-local and mirror x by facing sign
        local: bool,
    },
    /// Override gravity scale, optionally restoring it after a delay
    GravityScale {
        scale: f32,
        reset_after_ms: Option<f64>,
    },
    /// Attach a hand to a named weapon grip
    GripAttach {
        limb: Limb,
        grip: String,
        bone: Option<String>,
    },
    GripDetach { limb: Limb },
    GripDetachAll,
}

/// A time-keyed event embedded in a layer
#[derive(Clone, Debug, PartialEq)]
pub struct LayerEvent {
    /// Normalized layer progress in `[0, 1]`. A layer with no expiry stays
    /// at progress 0, so only events at 0 fire on it.
    pub time: f32,
    pub kind: LayerEventKind,
}

impl LayerEvent {
    pub fn new(time: f32, kind: LayerEventKind) -> Self {
        let time = if time.is_finite() { time.clamp(0.0, 1.0) } else { 0.0 };
        Self { time, kind }
    }

    /// Parse one event object; returns `None` for shapes that name no known kind
    pub fn from_json(value: &Value) -> Option<LayerEvent> {
        let object = value.as_object()?;
        let f = Fields::new(object);
        let time = f.number(&["time", "t", "at"]).unwrap_or(0.0);
        let kind_name = f.string(&["type", "kind"]).map(|k| k.to_ascii_lowercase());

        let vx = f.number(&["velocityx", "vx"]);
        let vy = f.number(&["velocityy", "vy"]);
        if vx.is_some() || vy.is_some() {
            return Some(LayerEvent::new(
                time,
                LayerEventKind::SetVelocity { x: vx, y: vy },
            ));
        }

        let magnitude = f.number(&["impulse", "magnitude", "force", "strength"]);
        if magnitude.is_some() || kind_name.as_deref() == Some("impulse") {
            let frame = if f.flag(&["aimrelative", "relativetoaim"]) == Some(true) {
                ImpulseFrame::Aim
            } else if f.flag(&["facingrelative", "relativetofacing"]) == Some(true) {
                ImpulseFrame::Facing
            } else {
                match f.string(&["frame", "relativeto", "space"]) {
                    Some(s) if s.eq_ignore_ascii_case("aim") => ImpulseFrame::Aim,
                    Some(s) if s.eq_ignore_ascii_case("facing") => ImpulseFrame::Facing,
                    _ => ImpulseFrame::World,
                }
            };
            return Some(LayerEvent::new(
                time,
                LayerEventKind::Impulse {
                    magnitude: magnitude.unwrap_or(0.0),
                    direction_deg: f
                        .number(&["angle", "direction", "dir", "angledeg"])
                        .unwrap_or(0.0),
                    frame,
                    local: f.flag(&["local", "localtoworld"]).unwrap_or(false),
                },
            ));
        }

        if let Some(scale) = f.number(&["gravityscale", "gravity"]) {
            let reset_after_ms = f
                .number(&["resetafter", "resetafterms", "gravityresetms", "duration"])
                .filter(|ms| *ms >= 0.0)
                .map(f64::from);
            return Some(LayerEvent::new(
                time,
                LayerEventKind::GravityScale {
                    scale,
                    reset_after_ms,
                },
            ));
        }

        if f.flag(&["detachall", "releaseall"]) == Some(true)
            || kind_name.as_deref() == Some("detachall")
        {
            return Some(LayerEvent::new(time, LayerEventKind::GripDetachAll));
        }

        let limb = f
            .string(&["limb", "hand", "side"])
            .and_then(canonicalize_limb);
        if let Some(grip) = f.string(&["attach", "attachgrip", "grip", "gripid"]) {
            return Some(LayerEvent::new(
                time,
                LayerEventKind::GripAttach {
                    limb: limb?,
                    grip: grip.to_string(),
                    bone: f.string(&["bone", "boneid"]).map(str::to_string),
                },
            ));
        }
        if let Some(detach) = f.get(&["detach", "detachgrip", "release"]) {
            let limb = limb.or_else(|| detach.as_str().and_then(canonicalize_limb))?;
            return Some(LayerEvent::new(time, LayerEventKind::GripDetach { limb }));
        }

        None
    }

    /// Parse an event array, skipping malformed entries, sorted by time
    pub fn list_from_json(value: &Value) -> Vec<LayerEvent> {
        let Some(items) = value.as_array() else {
            return Vec::new();
        };
        let mut events: Vec<LayerEvent> = items
            .iter()
            .filter_map(|item| {
                let event = LayerEvent::from_json(item);
                if event.is_none() {
                    tracing::trace!("dropping unrecognized layer event: {}", item);
                }
                event
            })
            .collect();
        sort_events(&mut events);
        events
    }
}

/// Stable sort by time so same-time events keep authoring order
pub fn sort_events(events: &mut [LayerEvent]) {
    events.sort_by(|a, b| a.time.total_cmp(&b.time));
}
