//! Color themes and small color helpers.

use crate::constants::DEFAULT_THEME;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `0xRRGGBB`
    pub const fn hex(value: u32) -> Self {
        Self {
            r: ((value >> 16) & 0xff) as u8,
            g: ((value >> 8) & 0xff) as u8,
            b: (value & 0xff) as u8,
        }
    }

    /// Composite `top` over `self` with the given opacity.
    pub fn blend(self, top: Rgb, alpha: f64) -> Rgb {
        let alpha = alpha.clamp(0.0, 1.0);
        let mix = |under: u8, over: u8| -> u8 {
            (under as f64 * (1.0 - alpha) + over as f64 * alpha).round() as u8
        };
        Rgb::new(mix(self.r, top.r), mix(self.g, top.g), mix(self.b, top.b))
    }
}

pub const WHITE: Rgb = Rgb::hex(0xFFFFFF);
pub const BLACK: Rgb = Rgb::hex(0x000000);
pub const GOLD: Rgb = Rgb::hex(0xFFD700);
pub const ORANGE: Rgb = Rgb::hex(0xFFA500);
pub const DIAMOND: Rgb = Rgb::hex(0xB9F2FF);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub id: &'static str,
    pub name: &'static str,
    pub bird: Rgb,
    pub pipe: Rgb,
    pub pipe_cap: Rgb,
    pub background: Rgb,
    pub ground: Rgb,
    /// Cloud opacity over the background.
    pub cloud_alpha: f64,
}

impl Theme {
    pub fn cloud(&self) -> Rgb {
        self.background.blend(WHITE, self.cloud_alpha)
    }
}

pub static THEMES: [Theme; 5] = [
    Theme {
        id: "classic",
        name: "Classic",
        bird: Rgb::hex(0xFFD700),
        pipe: Rgb::hex(0x2ECC71),
        pipe_cap: Rgb::hex(0x27AE60),
        background: Rgb::hex(0x87CEEB),
        ground: Rgb::hex(0x8B4513),
        cloud_alpha: 0.7,
    },
    Theme {
        id: "sunset",
        name: "Sunset",
        bird: Rgb::hex(0xFF6B35),
        pipe: Rgb::hex(0xFF8C42),
        pipe_cap: Rgb::hex(0xE67E22),
        background: Rgb::hex(0xFF6B6B),
        ground: Rgb::hex(0x8B4513),
        cloud_alpha: 0.8,
    },
    Theme {
        id: "night",
        name: "Night",
        bird: Rgb::hex(0xF39C12),
        pipe: Rgb::hex(0x34495E),
        pipe_cap: Rgb::hex(0x2C3E50),
        background: Rgb::hex(0x2C3E50),
        ground: Rgb::hex(0x2C3E50),
        cloud_alpha: 0.3,
    },
    Theme {
        id: "forest",
        name: "Forest",
        bird: Rgb::hex(0x27AE60),
        pipe: Rgb::hex(0x8B4513),
        pipe_cap: Rgb::hex(0x654321),
        background: Rgb::hex(0x90EE90),
        ground: Rgb::hex(0x228B22),
        cloud_alpha: 0.6,
    },
    Theme {
        id: "ocean",
        name: "Ocean",
        bird: Rgb::hex(0x3498DB),
        pipe: Rgb::hex(0x1ABC9C),
        pipe_cap: Rgb::hex(0x16A085),
        background: Rgb::hex(0x5DADE2),
        ground: Rgb::hex(0x2E86AB),
        cloud_alpha: 0.7,
    },
];

/// Unknown ids fall back to the default theme.
pub fn find_theme(id: &str) -> &'static Theme {
    THEMES
        .iter()
        .find(|t| t.id == id)
        .or_else(|| THEMES.iter().find(|t| t.id == DEFAULT_THEME))
        .unwrap_or(&THEMES[0])
}

/// The theme after `id`, wrapping around.
pub fn next_theme(id: &str) -> &'static Theme {
    let index = THEMES.iter().position(|t| t.id == id).unwrap_or(0);
    &THEMES[(index + 1) % THEMES.len()]
}

/// `hue` in degrees, `saturation` and `lightness` in 0..=1.
pub fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> Rgb {
    let h = hue.rem_euclid(360.0) / 60.0;
    let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = lightness - c / 2.0;
    let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgb::new(channel(r), channel(g), channel(b))
}
