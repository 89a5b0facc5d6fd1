use formats::{HotspotKind, MarkerConfig};

/// Visual theme of an interactive marker.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    StairsUp,
    StairsDown,
    Elevator,
    Floor(u8),
    Door,
    Information,
    HiddenLocation,
    Arrow,
}

/// How a confirmed navigation marker moves the user.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NavigationType {
    Elevator,
    Stairs,
    Door,
}

impl NavigationType {
    pub fn as_str(self) -> &'static str {
        match self {
            NavigationType::Elevator => "elevator",
            NavigationType::Stairs => "stairs",
            NavigationType::Door => "door",
        }
    }
}

impl MarkerKind {
    pub fn from_hotspot(kind: HotspotKind) -> Self {
        match kind {
            HotspotKind::Up => MarkerKind::StairsUp,
            HotspotKind::Down => MarkerKind::StairsDown,
            HotspotKind::Elevator => MarkerKind::Elevator,
            HotspotKind::Floor1 => MarkerKind::Floor(1),
            HotspotKind::Floor2 => MarkerKind::Floor(2),
            HotspotKind::Floor3 => MarkerKind::Floor(3),
            HotspotKind::Floor4 => MarkerKind::Floor(4),
            HotspotKind::Door => MarkerKind::Door,
            HotspotKind::Information => MarkerKind::Information,
            HotspotKind::HiddenLocation => MarkerKind::HiddenLocation,
        }
    }

    /// Floor buttons ride the elevator, so they classify as elevator moves.
    pub fn navigation_type(self) -> Option<NavigationType> {
        match self {
            MarkerKind::StairsUp | MarkerKind::StairsDown => Some(NavigationType::Stairs),
            MarkerKind::Elevator | MarkerKind::Floor(_) => Some(NavigationType::Elevator),
            MarkerKind::Door => Some(NavigationType::Door),
            _ => None,
        }
    }

    pub fn icon_name(self) -> String {
        match self {
            MarkerKind::StairsUp => "stairs-up".to_string(),
            MarkerKind::StairsDown => "stairs-down".to_string(),
            MarkerKind::Elevator => "elevator".to_string(),
            MarkerKind::Floor(n) => format!("floor-{n}"),
            MarkerKind::Door => "door".to_string(),
            MarkerKind::Information => "information".to_string(),
            MarkerKind::HiddenLocation => "hidden-location".to_string(),
            MarkerKind::Arrow => "arrow".to_string(),
        }
    }

    pub fn icon_path(self, icon_root: &str) -> String {
        format!("{}/{}.svg", icon_root.trim_end_matches('/'), self.icon_name())
    }

    pub fn color(self) -> [f32; 4] {
        match self {
            MarkerKind::StairsUp | MarkerKind::StairsDown => [0.20, 0.66, 0.33, 0.9],
            MarkerKind::Elevator | MarkerKind::Floor(_) => [0.16, 0.45, 0.85, 0.9],
            MarkerKind::Door => [0.93, 0.55, 0.15, 0.9],
            MarkerKind::Information => [0.10, 0.65, 0.70, 0.9],
            MarkerKind::HiddenLocation => [0.95, 0.78, 0.20, 0.9],
            MarkerKind::Arrow => [1.0, 1.0, 1.0, 0.85],
        }
    }
}

/// Zoom-dependent marker scale: markers grow as `fov` shrinks.
///
/// Navigation markers never drop below `min_navigation_scale`;
/// hidden-location markers carry their own multiplier and no floor; touch
/// devices enlarge navigation and information markers only. Arrows keep a
/// fixed size.
pub fn marker_scale(kind: MarkerKind, fov: f64, touch: bool, config: &MarkerConfig) -> f64 {
    let base = (120.0 - fov) / 100.0 + 0.5;
    let touch_factor = if touch { config.touch_multiplier } else { 1.0 };
    match kind {
        MarkerKind::Arrow => 1.0,
        MarkerKind::HiddenLocation => base * config.hidden_location_multiplier,
        MarkerKind::Information => base * touch_factor,
        _ => base.max(config.min_navigation_scale) * touch_factor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [MarkerKind; 8] = [
        MarkerKind::StairsUp,
        MarkerKind::StairsDown,
        MarkerKind::Elevator,
        MarkerKind::Floor(2),
        MarkerKind::Door,
        MarkerKind::Information,
        MarkerKind::HiddenLocation,
        MarkerKind::Arrow,
    ];

    #[test]
    fn scale_never_grows_with_fov() {
        let cfg = MarkerConfig::default();
        for kind in ALL {
            for touch in [false, true] {
                let mut previous = f64::INFINITY;
                for step in 0..=110 {
                    let fov = 10.0 + step as f64;
                    let s = marker_scale(kind, fov, touch, &cfg);
                    assert!(s <= previous, "{kind:?} fov {fov}");
                    previous = s;
                }
            }
        }
    }

    #[test]
    fn navigation_markers_respect_floor() {
        let cfg = MarkerConfig::default();
        for kind in [MarkerKind::StairsUp, MarkerKind::Elevator, MarkerKind::Door] {
            assert!(marker_scale(kind, 120.0, false, &cfg) >= cfg.min_navigation_scale);
        }
        let hidden = marker_scale(MarkerKind::HiddenLocation, 120.0, false, &cfg);
        assert!((hidden - 0.5 * cfg.hidden_location_multiplier).abs() < 1e-12);
    }

    #[test]
    fn touch_enlarges_navigation_and_information_only() {
        let cfg = MarkerConfig::default();
        let fov = 40.0;
        for kind in [MarkerKind::Door, MarkerKind::Information] {
            let ratio = marker_scale(kind, fov, true, &cfg) / marker_scale(kind, fov, false, &cfg);
            assert!((ratio - cfg.touch_multiplier).abs() < 1e-12);
        }
        assert_eq!(
            marker_scale(MarkerKind::HiddenLocation, fov, true, &cfg),
            marker_scale(MarkerKind::HiddenLocation, fov, false, &cfg)
        );
    }

    #[test]
    fn classification() {
        assert_eq!(
            MarkerKind::from_hotspot(HotspotKind::Floor3).navigation_type(),
            Some(NavigationType::Elevator)
        );
        assert_eq!(
            MarkerKind::from_hotspot(HotspotKind::Down).navigation_type(),
            Some(NavigationType::Stairs)
        );
        assert_eq!(MarkerKind::Information.navigation_type(), None);
        assert_eq!(MarkerKind::Floor(3).icon_path("/icons/"), "/icons/floor-3.svg");
    }
}
