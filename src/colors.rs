//! Swatch colors for variant labels.
//!
//! Labels are free text: English names, Arabic transliterations or script,
//! seeded variant names, or bare hex codes. [`resolve_hex`] never fails; the
//! worst case is a label the renderer cannot display.

/// Swatch shown for an empty label.
pub const DEFAULT_SWATCH: &str = "#CCCCCC";

const COLOR_TABLE: &[(&str, &str)] = &[
    ("black", "#000000"),
    ("white", "#FFFFFF"),
    ("red", "#FF0000"),
    ("blue", "#0000FF"),
    ("green", "#008000"),
    ("grey", "#808080"),
    ("gray", "#808080"),
    ("silver", "#C0C0C0"),
    ("gold", "#FFD700"),
    ("orange", "#FFA500"),
    ("purple", "#800080"),
    ("pink", "#FFC0CB"),
    ("yellow", "#FFFF00"),
    ("brown", "#A52A2A"),
    ("beige", "#F5F5DC"),
    // Arabic, transliterated and script
    ("ahmar", "#FF0000"), ("أحمر", "#FF0000"),
    ("aswad", "#000000"), ("أسود", "#000000"),
    ("abyad", "#FFFFFF"), ("أبيض", "#FFFFFF"),
    ("azraq", "#0000FF"), ("أزرق", "#0000FF"),
    ("akhdar", "#008000"), ("أخضر", "#008000"),
    ("asfar", "#FFFF00"), ("أصفر", "#FFFF00"),
    ("burtuqali", "#FFA500"), ("برتقالي", "#FFA500"),
    ("zahri", "#FFC0CB"), ("زهري", "#FFC0CB"),
    ("banafsaji", "#800080"), ("بنفسجي", "#800080"),
    ("ramadi", "#808080"), ("رمادي", "#808080"),
    ("bunni", "#A52A2A"), ("بني", "#A52A2A"),
    ("khamri", "#800000"), ("خمري", "#800000"),
    ("kahli", "#000080"), ("كحلي", "#000080"),
    ("fiddi", "#C0C0C0"), ("فضي", "#C0C0C0"),
    ("thahabi", "#FFD700"), ("ذهبي", "#FFD700"),
    // Seeded variant names
    ("midnight black", "#000000"),
    ("navy blue", "#000080"),
    ("pearl white", "#F3F1E7"),
    ("charcoal black", "#36454F"),
    ("crimson red", "#DC143C"),
    ("midnight blue", "#191970"),
    ("dark grey", "#A9A9A9"),
    ("retro beige", "#D6C68B"),
    ("white mint", "#E0FFF4"),
    ("bright orange", "#FF5F1F"),
    ("electric blue", "#003399"),
    ("neon green", "#39FF14"),
    ("icy white", "#F0F8FF"),
    ("lavender", "#E6E6FA"),
    ("phantom black", "#191919"),
    ("matte black", "#28282B"),
    ("teal blue", "#367588"),
    ("graphite grey", "#4B4B4B"),
    ("rose gold", "#B76E79"),
    ("sky blue", "#87CEEB"),
    ("space grey", "#717378"),
    ("cream wajh", "#FFFDD0"),
    ("hmra", "#990000"),
    ("perfium", "#FFD700"),
    ("shampo", "#FFFFFF"),
    ("standard", "#CCCCCC"),
    // Other common names
    ("navy", "#000080"),
    ("lime", "#00FF00"),
    ("cyan", "#00FFFF"),
    ("magenta", "#FF00FF"),
    ("maroon", "#800000"),
    ("olive", "#808000"),
    ("teal", "#008080"),
    ("violet", "#EE82EE"),
];

/// Names offered when labelling an image by its average color.
const PALETTE: &[(&str, [u8; 3])] = &[
    ("Black", [0x00, 0x00, 0x00]),
    ("White", [0xFF, 0xFF, 0xFF]),
    ("Red", [0xFF, 0x00, 0x00]),
    ("Blue", [0x00, 0x00, 0xFF]),
    ("Green", [0x00, 0x80, 0x00]),
    ("Grey", [0x80, 0x80, 0x80]),
    ("Silver", [0xC0, 0xC0, 0xC0]),
    ("Gold", [0xFF, 0xD7, 0x00]),
    ("Orange", [0xFF, 0xA5, 0x00]),
    ("Purple", [0x80, 0x00, 0x80]),
    ("Pink", [0xFF, 0xC0, 0xCB]),
    ("Yellow", [0xFF, 0xFF, 0x00]),
    ("Brown", [0xA5, 0x2A, 0x2A]),
    ("Beige", [0xF5, 0xF5, 0xDC]),
    ("Navy", [0x00, 0x00, 0x80]),
    ("Lime", [0x00, 0xFF, 0x00]),
    ("Cyan", [0x00, 0xFF, 0xFF]),
    ("Magenta", [0xFF, 0x00, 0xFF]),
    ("Maroon", [0x80, 0x00, 0x00]),
    ("Olive", [0x80, 0x80, 0x00]),
    ("Teal", [0x00, 0x80, 0x80]),
    ("Violet", [0xEE, 0x82, 0xEE]),
    ("Lavender", [0xE6, 0xE6, 0xFA]),
    ("Pearl White", [0xF3, 0xF1, 0xE7]),
    ("Charcoal Black", [0x36, 0x45, 0x4F]),
    ("Crimson Red", [0xDC, 0x14, 0x3C]),
    ("Midnight Blue", [0x19, 0x19, 0x70]),
    ("Dark Grey", [0xA9, 0xA9, 0xA9]),
    ("Retro Beige", [0xD6, 0xC6, 0x8B]),
    ("Electric Blue", [0x00, 0x33, 0x99]),
    ("Neon Green", [0x39, 0xFF, 0x14]),
    ("Matte Black", [0x28, 0x28, 0x2B]),
    ("Teal Blue", [0x36, 0x75, 0x88]),
    ("Graphite Grey", [0x4B, 0x4B, 0x4B]),
    ("Rose Gold", [0xB7, 0x6E, 0x79]),
    ("Sky Blue", [0x87, 0xCE, 0xEB]),
    ("Space Grey", [0x71, 0x73, 0x78]),
];

fn is_bare_hex(value: &str) -> bool {
    matches!(value.len(), 3 | 6) && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Best-effort display hex for a color label.
pub fn resolve_hex(label: &str) -> String {
    let lower = label.trim().to_lowercase();
    if lower.is_empty() {
        return DEFAULT_SWATCH.to_string();
    }
    if is_bare_hex(&lower) {
        return format!("#{lower}");
    }
    if let Some((_, hex)) = COLOR_TABLE.iter().find(|(name, _)| *name == lower) {
        return (*hex).to_string();
    }
    // "Dark Red" -> "darkred", left for the renderer to resolve as a CSS name
    let squashed: String = lower.chars().filter(|c| !c.is_whitespace()).collect();
    if squashed.bytes().all(|b| b.is_ascii_lowercase()) {
        return squashed;
    }
    label.to_string()
}

/// Closest palette name to an RGB color (squared euclidean distance).
pub fn nearest_name(rgb: [u8; 3]) -> &'static str {
    let distance = |other: &[u8; 3]| -> u32 {
        rgb.iter()
            .zip(other)
            .map(|(a, b)| {
                let d = i32::from(*a) - i32::from(*b);
                d.unsigned_abs() * d.unsigned_abs()
            })
            .sum()
    };
    PALETTE
        .iter()
        .min_by_key(|(_, value)| distance(value))
        .map_or("Black", |(name, _)| name)
}
