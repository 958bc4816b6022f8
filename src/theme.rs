use glam::Vec3;

/// Bloom stage parameters pushed to the renderer on every theme change
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BloomSettings {
    pub strength: f32,
    pub radius: f32,
    pub threshold: f32,
}

impl BloomSettings {
    pub const fn new(strength: f32, radius: f32, threshold: f32) -> Self {
        Self {
            strength,
            radius,
            threshold,
        }
    }
}

impl Default for BloomSettings {
    // Values the bloom pass is constructed with before any theme applies
    fn default() -> Self {
        Self::new(1.5, 0.4, 0.85)
    }
}

/// Colors per palette
pub const PALETTE_LEN: usize = 5;

/// Named color palette with its bloom settings
#[derive(Clone, Debug, PartialEq)]
pub struct Theme {
    pub key: &'static str,
    pub name: &'static str,
    /// Linear RGB
    pub colors: [Vec3; PALETTE_LEN],
    pub bloom: BloomSettings,
}

impl Theme {
    fn from_hex(
        key: &'static str,
        name: &'static str,
        hex: [u32; PALETTE_LEN],
        bloom: BloomSettings,
    ) -> Self {
        Self {
            key,
            name,
            colors: hex.map(hex_to_linear),
            bloom,
        }
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c < 0.04045 {
        c * 0.077_399_38
    } else {
        (c * 0.947_867_3 + 0.052_132_7).powf(2.4)
    }
}

/// `0xRRGGBB` in sRGB to linear RGB
pub fn hex_to_linear(hex: u32) -> Vec3 {
    let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
    Vec3::new(channel(16), channel(8), channel(0))
}

/// The three built-in palettes, in cycle order
pub fn builtin_themes() -> Vec<Theme> {
    vec![
        Theme::from_hex(
            "pastelRose",
            "Pastel Rose",
            [0xffb6c1, 0xff69b4, 0xff1493, 0xdb7093, 0xffc0cb],
            BloomSettings::new(0.4, 0.5, 0.7),
        ),
        Theme::from_hex(
            "dreamyPink",
            "Dreamy Pink",
            [0xff9ecd, 0xff77a9, 0xff4da6, 0xfda4b8, 0xffcde6],
            BloomSettings::new(0.45, 0.55, 0.65),
        ),
        Theme::from_hex(
            "neonRose",
            "Neon Rose",
            [0xff007f, 0xff3399, 0xff66cc, 0xff99cc, 0xff1a8c],
            BloomSettings::new(0.5, 0.45, 0.6),
        ),
    ]
}

/// Cyclic theme selector driven by the theme timer
#[derive(Clone, Debug)]
pub struct ThemeCycle {
    themes: Vec<Theme>,
    index: usize,
}

impl ThemeCycle {
    pub fn new() -> Self {
        Self {
            themes: builtin_themes(),
            index: 0,
        }
    }

    pub fn current(&self) -> &Theme {
        &self.themes[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn themes(&self) -> &[Theme] {
        &self.themes
    }

    /// Step to the next theme, wrapping around
    pub fn advance(&mut self) -> &Theme {
        self.index = (self.index + 1) % self.themes.len();
        log::info!("Theme -> {}", self.current().name);
        self.current()
    }

    /// Select a theme by key. Unknown keys leave the current theme untouched.
    pub fn select(&mut self, key: &str) -> Option<&Theme> {
        match self.themes.iter().position(|t| t.key == key) {
            Some(index) => {
                self.index = index;
                Some(&self.themes[index])
            }
            None => {
                log::debug!("Ignoring unknown theme '{}'", key);
                None
            }
        }
    }
}

impl Default for ThemeCycle {
    fn default() -> Self {
        Self::new()
    }
}
