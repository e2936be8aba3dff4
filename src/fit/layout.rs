use super::font::{TextExtent, TextMeasure};

/// Greedy word wrap against `max_width`.
///
/// Words are split on whitespace and never broken: a word wider than
/// `max_width` ends up alone on its own line.
pub fn wrap_text<M: TextMeasure + ?Sized>(
    text: &str,
    measure: &M,
    size: u32,
    max_width: i32,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if measure.measure(&candidate, size).width <= max_width {
            current = candidate;
        } else {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Wrapped lines with their measured extents at one font size.
#[derive(Debug, Clone)]
pub(crate) struct TextBlock {
    pub(crate) lines: Vec<(String, TextExtent)>,
    pub(crate) total_height: i32,
    pub(crate) widest: i32,
}

pub(crate) fn layout_block<M: TextMeasure + ?Sized>(
    text: &str,
    measure: &M,
    size: u32,
    max_width: i32,
) -> TextBlock {
    let lines: Vec<(String, TextExtent)> = wrap_text(text, measure, size, max_width)
        .into_iter()
        .map(|line| {
            let extent = measure.measure(&line, size);
            (line, extent)
        })
        .collect();
    let total_height = lines.iter().map(|(_, extent)| extent.height).sum();
    let widest = lines
        .iter()
        .map(|(_, extent)| extent.width)
        .max()
        .unwrap_or(0);
    TextBlock {
        lines,
        total_height,
        widest,
    }
}

pub fn fits<M: TextMeasure + ?Sized>(
    text: &str,
    measure: &M,
    size: u32,
    max_width: i32,
    max_height: i32,
) -> bool {
    let block = layout_block(text, measure, size, max_width);
    block.total_height <= max_height && block.widest <= max_width
}

/// Largest size in `min_size..=max_size` whose wrapped text fits the box.
///
/// Binary search, so `fits` must be monotone in the size. Falls back to
/// `min_size` when nothing fits.
pub fn best_font_size<M: TextMeasure + ?Sized>(
    text: &str,
    measure: &M,
    max_width: i32,
    max_height: i32,
    min_size: u32,
    max_size: u32,
) -> u32 {
    let mut lo = min_size as i64;
    let mut hi = max_size as i64;
    let mut best = min_size;

    while lo <= hi {
        let mid = (lo + hi) / 2;
        if fits(text, measure, mid as u32, max_width, max_height) {
            best = mid as u32;
            lo = mid + 1;
        } else {
            hi = mid - 1;
        }
    }
    best
}
