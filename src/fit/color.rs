use serde::Serialize;

/// Text on backgrounds brighter than this is drawn black.
pub const LUMINANCE_THRESHOLD: f32 = 160.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// BT.709 relative luminance on the 0..=255 scale.
    pub fn luminance(&self) -> f32 {
        0.2126 * self.r as f32 + 0.7152 * self.g as f32 + 0.0722 * self.b as f32
    }

    pub fn with_alpha(self, a: u8) -> Rgba {
        Rgba {
            r: self.r,
            g: self.g,
            b: self.b,
            a,
        }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub fn rgb(&self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }

    pub fn opacity(&self) -> f32 {
        self.a as f32 / 255.0
    }
}

pub fn text_color_for(background: Rgb) -> Rgb {
    if background.luminance() > LUMINANCE_THRESHOLD {
        Rgb::BLACK
    } else {
        Rgb::WHITE
    }
}

/// Reads pixels from the source image. `None` means out of bounds.
pub trait BackgroundSampler {
    fn sample(&self, x: i64, y: i64) -> Option<Rgb>;
}

fn in_bounds(x: i64, y: i64, width: u32, height: u32) -> Option<(u32, u32)> {
    if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
        return None;
    }
    Some((x as u32, y as u32))
}

impl BackgroundSampler for image::RgbImage {
    fn sample(&self, x: i64, y: i64) -> Option<Rgb> {
        let (x, y) = in_bounds(x, y, self.width(), self.height())?;
        let [r, g, b] = self.get_pixel(x, y).0;
        Some(Rgb::new(r, g, b))
    }
}

impl BackgroundSampler for image::RgbaImage {
    fn sample(&self, x: i64, y: i64) -> Option<Rgb> {
        let (x, y) = in_bounds(x, y, self.width(), self.height())?;
        let [r, g, b, _] = self.get_pixel(x, y).0;
        Some(Rgb::new(r, g, b))
    }
}

impl BackgroundSampler for image::DynamicImage {
    fn sample(&self, x: i64, y: i64) -> Option<Rgb> {
        use image::GenericImageView;
        let (x, y) = in_bounds(x, y, self.width(), self.height())?;
        let [r, g, b, _] = self.get_pixel(x, y).0;
        Some(Rgb::new(r, g, b))
    }
}
