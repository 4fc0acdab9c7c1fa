//! Draw themes
//!
//! The draw variants differ only in data: starting prizes, the fallback
//! pool used to pad short lists, how long the opening animation runs, and
//! which icon a prize gets. Rendering picks everything else off the theme.

use serde::{Deserialize, Serialize};

use super::prize::{FALLBACK_POOL_LEN, Prize};
use crate::consts::DEFAULT_SETTLE_MS;

/// Draw variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Theme {
    /// Gift boxes with confetti and light show
    #[default]
    MysteryBox,
    /// Carp fishing peg draw with oysters, bubbles and fish
    Underwater,
}

const MYSTERY_BOX_PRIZES: [(&str, &str); 10] = [
    ("Rod & Reel Combo", "£250"),
    ("Tackle Box Set", "£150"),
    ("Premium Bait Pack", "£50"),
    ("Fishing Chair", "£100"),
    ("Bivvy Shelter", "£200"),
    ("Landing Net", "£75"),
    ("Unhooking Mat", "£80"),
    ("Carp Fishing DVD Set", "£30"),
    ("Fishing Voucher", "£500"),
    ("Bite Alarms Set", "£120"),
];

const MYSTERY_BOX_FALLBACK: [(&str, &str); FALLBACK_POOL_LEN] = [
    ("£10 Voucher", "£10"),
    ("£20 Voucher", "£20"),
    ("£5 Voucher", "£5"),
    ("Fishing Line", "£15"),
    ("Hooks Pack", "£12"),
];

const UNDERWATER_PRIZES: [(&str, &str); 10] = [
    ("Nash Scope Carp Rod", "£350"),
    ("Shimano Big Baitrunner Reel", "£250"),
    ("Fox EOS Bivvy", "£400"),
    ("Sonik SK-TEK Bedchair", "£180"),
    ("Delkim TXi Plus Alarms", "£300"),
    ("Trakker Barrow", "£220"),
    ("Mainline Cell Boilies Bundle", "£75"),
    ("ESP Carp Tackle Box", "£120"),
    ("Gardner PVA Mega Bundle", "£50"),
    ("Korda Underwater Camera", "£180"),
];

const UNDERWATER_FALLBACK: [(&str, &str); FALLBACK_POOL_LEN] = [
    ("£10 Bait Voucher", "£10"),
    ("£20 Tackle Voucher", "£20"),
    ("Korda Rig Kit", "£15"),
    ("Pop-Up Selection", "£12"),
    ("PVA Mesh Bundle", "£8"),
];

fn to_prizes(table: &[(&str, &str)]) -> Vec<Prize> {
    table
        .iter()
        .map(|(name, value)| Prize::new(*name, *value))
        .collect()
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::MysteryBox => "Mystery Box",
            Theme::Underwater => "Underwater",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mystery" | "mysterybox" | "mystery box" | "mystery-box" => Some(Theme::MysteryBox),
            "underwater" | "carp" => Some(Theme::Underwater),
            _ => None,
        }
    }

    /// Competition title shown before setup
    pub fn default_title(&self) -> &'static str {
        match self {
            Theme::MysteryBox => "CARP LIFE MYSTERY BOX",
            Theme::Underwater => "CARP FISHING COMPETITION",
        }
    }

    /// What a single slot is called on screen
    pub fn box_noun(&self) -> &'static str {
        match self {
            Theme::MysteryBox => "Box",
            Theme::Underwater => "Peg",
        }
    }

    /// Opening animation after the suspense stage (ms)
    pub fn settle_ms(&self) -> u32 {
        match self {
            Theme::MysteryBox => DEFAULT_SETTLE_MS,
            // Fly to centre, then hold the opened oyster in the spotlight
            Theme::Underwater => 1200,
        }
    }

    /// Starting prizes before any CSV import
    pub fn default_prizes(&self) -> Vec<Prize> {
        match self {
            Theme::MysteryBox => to_prizes(&MYSTERY_BOX_PRIZES),
            Theme::Underwater => to_prizes(&UNDERWATER_PRIZES),
        }
    }

    /// Small prizes used to pad a short list up to the box count
    pub fn fallback_pool(&self) -> Vec<Prize> {
        match self {
            Theme::MysteryBox => to_prizes(&MYSTERY_BOX_FALLBACK),
            Theme::Underwater => to_prizes(&UNDERWATER_FALLBACK),
        }
    }

    /// Icon for the reveal card. First matching rule wins.
    pub fn icon_for(&self, prize: &Prize) -> &'static str {
        let value = prize.value.to_lowercase();
        let name = prize.name.to_lowercase();
        let value_has = |needles: &[&str]| needles.iter().any(|n| value.contains(n));
        let name_has = |needles: &[&str]| needles.iter().any(|n| name.contains(n));

        match self {
            Theme::MysteryBox => {
                if value_has(&["500", "grand"]) {
                    "🏆"
                } else if value_has(&["250", "200"]) {
                    "💎"
                } else if value_has(&["100"]) {
                    "🎉"
                } else if value_has(&["voucher"]) {
                    "🎟️"
                } else {
                    "🎁"
                }
            }
            Theme::Underwater => {
                if value_has(&["400", "350"]) || name_has(&["bivvy"]) {
                    "🏆"
                } else if value_has(&["300"]) || name_has(&["alarm"]) {
                    "🔔"
                } else if value_has(&["250", "200"]) || name_has(&["rod", "reel"]) {
                    "🎣"
                } else if name_has(&["bedchair", "barrow"]) {
                    "🛏️"
                } else if name_has(&["bait", "boilie"]) {
                    "🐟"
                } else if name_has(&["tackle", "rig"]) {
                    "🪝"
                } else if name_has(&["voucher"]) {
                    "🎟️"
                } else if name_has(&["camera"]) {
                    "📷"
                } else {
                    "🐟"
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pools_have_expected_sizes() {
        for theme in [Theme::MysteryBox, Theme::Underwater] {
            assert_eq!(theme.default_prizes().len(), 10);
            assert_eq!(theme.fallback_pool().len(), FALLBACK_POOL_LEN);
        }
    }

    #[test]
    fn test_settle_times() {
        assert_eq!(Theme::MysteryBox.settle_ms(), DEFAULT_SETTLE_MS);
        assert_eq!(Theme::Underwater.settle_ms(), 1200);
    }

    #[test]
    fn test_mystery_box_icons() {
        let t = Theme::MysteryBox;
        assert_eq!(t.icon_for(&Prize::new("Fishing Voucher", "£500")), "🏆");
        assert_eq!(t.icon_for(&Prize::new("Bivvy Shelter", "£200")), "💎");
        assert_eq!(t.icon_for(&Prize::new("Fishing Chair", "£100")), "🎉");
        assert_eq!(t.icon_for(&Prize::new("Landing Net", "£75")), "🎁");
    }

    #[test]
    fn test_underwater_icons_check_name_too() {
        let t = Theme::Underwater;
        assert_eq!(t.icon_for(&Prize::new("Fox EOS Bivvy", "£400")), "🏆");
        assert_eq!(t.icon_for(&Prize::new("Delkim TXi Plus Alarms", "£300")), "🔔");
        assert_eq!(t.icon_for(&Prize::new("Trakker Barrow", "£220")), "🛏️");
        assert_eq!(t.icon_for(&Prize::new("Korda Rig Kit", "£15")), "🪝");
        assert_eq!(t.icon_for(&Prize::new("Korda Underwater Camera", "£180")), "📷");
        assert_eq!(t.icon_for(&Prize::new("Mystery", "£1")), "🐟");
    }

    #[test]
    fn test_theme_from_str() {
        assert_eq!(Theme::from_str("Underwater"), Some(Theme::Underwater));
        assert_eq!(Theme::from_str("mystery box"), Some(Theme::MysteryBox));
        assert_eq!(Theme::from_str("space"), None);
    }
}
