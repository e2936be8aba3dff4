use anyhow::{Context, Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{DynamicImage, ImageFormat};
use resvg::render;
use std::io::Cursor;
use std::sync::Arc;
use tiny_skia::Pixmap;
use usvg::{Options, Tree, fontdb};

use crate::fit::{FontFace, RenderPlan};

/// Builds an SVG of `image` with every plan drawn on top.
///
/// Fill rectangles are inclusive of their max corner. Line origins are the
/// top of the glyph box, so each baseline is shifted down by the ascent.
pub fn render_svg(
    image: &DynamicImage,
    plans: &[RenderPlan],
    font: Option<&FontFace>,
) -> Result<String> {
    let width = image.width();
    let height = image.height();
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .with_context(|| "failed to encode source image for overlay")?;
    let data_uri = format!("data:image/png;base64,{}", BASE64.encode(&png));

    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = width,
        h = height
    ));
    svg.push_str(&format!(
        r#"<image href="{uri}" xlink:href="{uri}" x="0" y="0" width="{w}" height="{h}" preserveAspectRatio="none"/>"#,
        uri = data_uri,
        w = width,
        h = height
    ));

    let family = font.and_then(FontFace::family);
    for plan in plans {
        let rect = plan.fill_rect;
        svg.push_str(&format!(
            r#"<rect x="{x}" y="{y}" width="{w}" height="{h}" fill="{fill}" fill-opacity="{opacity:.3}"/>"#,
            x = rect.x_min,
            y = rect.y_min,
            w = rect.width().saturating_add(1),
            h = rect.height().saturating_add(1),
            fill = plan.fill.rgb().to_hex(),
            opacity = plan.fill.opacity()
        ));

        let ascent = font
            .map(|face| face.ascent_px(plan.font_size))
            .unwrap_or(plan.font_size as f32 * 0.8);
        let color = plan.text_color.to_hex();
        for line in &plan.lines {
            let baseline = line.y as f32 + ascent;
            match family {
                Some(family) => svg.push_str(&format!(
                    r#"<text x="{x}" y="{y}" font-size="{size}" fill="{color}" font-family="{family}" xml:space="preserve">{text}</text>"#,
                    x = line.x,
                    y = baseline,
                    size = plan.font_size,
                    color = color,
                    family = escape_xml(family),
                    text = escape_xml(&line.text)
                )),
                None => svg.push_str(&format!(
                    r#"<text x="{x}" y="{y}" font-size="{size}" fill="{color}" xml:space="preserve">{text}</text>"#,
                    x = line.x,
                    y = baseline,
                    size = plan.font_size,
                    color = color,
                    text = escape_xml(&line.text)
                )),
            }
        }
    }

    svg.push_str("</svg>");
    Ok(svg)
}

/// Rasterizes `svg` and encodes it as `format`.
pub fn rasterize(svg: &str, font: Option<&FontFace>, format: ImageFormat) -> Result<Vec<u8>> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    if let Some(face) = font {
        db.load_font_data(face.data().to_vec());
    }
    let options = Options {
        fontdb: Arc::new(db),
        ..Options::default()
    };
    let tree = Tree::from_str(svg, &options).with_context(|| "failed to parse SVG")?;
    let size = tree.size().to_int_size();
    let mut pixmap =
        Pixmap::new(size.width(), size.height()).ok_or_else(|| anyhow!("empty SVG size"))?;
    let mut pixmap_mut = pixmap.as_mut();
    render(&tree, tiny_skia::Transform::identity(), &mut pixmap_mut);
    let image = image::RgbaImage::from_raw(size.width(), size.height(), pixmap.data().to_vec())
        .ok_or_else(|| anyhow!("failed to build image buffer from SVG"))?;
    let image = match format {
        // no alpha channel in JPEG
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(image).to_rgb8()),
        _ => DynamicImage::ImageRgba8(image),
    };
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), format)
        .with_context(|| format!("failed to encode {:?} output", format))?;
    Ok(bytes)
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
