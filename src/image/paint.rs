use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use image::imageops::{FilterType, overlay};
use image::{DynamicImage, ImageBuffer, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect as PixelRect;
use tracing::{debug, warn};

use crate::core::layout::{Align, FaceGeometry, LayoutMode, TextBox, layout_record};
use crate::core::pagination::{PageDescriptor, Rect};
use crate::core::record::PhotoRef;
use crate::core::templates::Color;
use crate::error::RenderError;
use crate::loader;
use crate::render::{PageRenderer, RenderContext};

const MM_PER_INCH: f32 = 25.4;
const MIN_DPI: u32 = 72;
const MAX_DPI: u32 = 1200;
const LINE_HEIGHT: f32 = 1.4;

struct Palette {
    page_bg: Rgba<u8>,
    crop: Rgba<u8>,
    photo_border: Rgba<u8>,
}

const PALETTE: Palette = Palette {
    page_bg: Rgba([0xff, 0xff, 0xff, 0xff]),
    crop: Rgba([0x9c, 0xa3, 0xaf, 0xff]),
    photo_border: Rgba([0xff, 0xff, 0xff, 0xff]),
};

/// Rasterizes sheets into RGBA images at a fixed resolution.
pub struct PngRenderer {
    dpi: u32,
    font: Option<FontVec>,
}

impl PngRenderer {
    /// `dpi` is clamped to 72..=1200.
    pub fn new(dpi: u32) -> Self {
        Self {
            dpi: dpi.clamp(MIN_DPI, MAX_DPI),
            font: None,
        }
    }

    /// Use a TrueType/OpenType font for text; without one text is drawn as bars.
    pub fn with_font_file(mut self, path: &Path) -> Result<Self, RenderError> {
        let bytes = fs::read(path).map_err(|err| RenderError::Font {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let font = FontVec::try_from_vec(bytes).map_err(|err| RenderError::Font {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        self.font = Some(font);
        Ok(self)
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    fn px(&self, mm: f32) -> f32 {
        mm / MM_PER_INCH * self.dpi as f32
    }

    fn px_rect(&self, x: f32, y: f32, width: f32, height: f32) -> Option<PixelRect> {
        let w = self.px(width).round();
        let h = self.px(height).round();
        if w < 1.0 || h < 1.0 {
            return None;
        }
        Some(PixelRect::at(self.px(x).round() as i32, self.px(y).round() as i32).of_size(w as u32, h as u32))
    }

    fn draw_face(&self, canvas: &mut RgbaImage, origin: &Rect, face: &FaceGeometry) {
        let Some(area) = self.px_rect(origin.x, origin.y, origin.width, origin.height) else {
            return;
        };
        draw_filled_rect_mut(canvas, area, rgba(face.fill));
        if let Some(background) = &face.background {
            paste_fill(canvas, background, area);
        }

        if let Some(photo) = &face.photo {
            let slot = self.px_rect(
                origin.x + photo.x,
                origin.y + photo.y,
                photo.width,
                photo.height,
            );
            if let Some(slot) = slot {
                draw_filled_rect_mut(canvas, slot, rgba(photo.fill));
                if let Some(image) = &photo.photo {
                    paste_fill(canvas, image, slot);
                }
                let border = self.px(photo.border).round().max(1.0) as u32;
                for inset in 0..border {
                    if let Some(ring) = shrink(slot, inset) {
                        draw_hollow_rect_mut(canvas, ring, PALETTE.photo_border);
                    }
                }
            }
        }

        for badge in &face.badges {
            if let Some(rect) =
                self.px_rect(origin.x + badge.x, origin.y + badge.y, badge.width, badge.height)
            {
                draw_filled_rect_mut(canvas, rect, rgba(badge.fill));
            }
        }

        for text in &face.texts {
            self.draw_text(canvas, origin, text);
        }
    }

    fn draw_text(&self, canvas: &mut RgbaImage, origin: &Rect, text: &TextBox) {
        let content = format!("{}{}", text.label, text.text);
        if content.trim().is_empty() {
            return;
        }
        let size = self.px(text.font_size).max(1.0);
        let left = self.px(origin.x + text.x);
        let width = self.px(text.width);
        let mut top = self.px(origin.y + text.y);
        let color = rgba(text.color);

        for line in wrap(&content, width, |s| self.measure(s, size)) {
            let line_width = self.measure(&line, size);
            let x = match text.align {
                Align::Left => left,
                Align::Center => left + (width - line_width) / 2.0,
                Align::Right => left + width - line_width,
            };
            match &self.font {
                Some(font) => draw_text_mut(
                    canvas,
                    color,
                    x.round() as i32,
                    top.round() as i32,
                    PxScale::from(size),
                    font,
                    &line,
                ),
                None => {
                    // Stand-in bar so geometry can be checked without a font.
                    let bar_height = (size * 0.7).round().max(1.0) as u32;
                    let bar_top = top + size * 0.15;
                    if line_width >= 1.0 {
                        draw_filled_rect_mut(
                            canvas,
                            PixelRect::at(x.round() as i32, bar_top.round() as i32)
                                .of_size(line_width.round() as u32, bar_height),
                            color,
                        );
                    }
                }
            }
            top += size * LINE_HEIGHT;
        }
    }

    fn measure(&self, text: &str, size: f32) -> f32 {
        match &self.font {
            Some(font) => text_size(PxScale::from(size), font, text).0 as f32,
            None => text.chars().count() as f32 * size * 0.55,
        }
    }
}

impl PageRenderer for PngRenderer {
    type Output = RgbaImage;

    fn render_page(
        &self,
        page: &PageDescriptor<'_>,
        ctx: &RenderContext,
    ) -> Result<RgbaImage, RenderError> {
        let sheet = ctx.sheet.sheet();
        let width = self.px(sheet.width).round() as u32;
        let height = self.px(sheet.height).round() as u32;
        let mut canvas = ImageBuffer::from_pixel(width, height, PALETTE.page_bg);
        let template = ctx.template(page.variant);

        for slot in &page.slots {
            let Some(record) = slot.record else {
                continue;
            };
            let frame = ctx.sheet.crop_frame(slot);
            if let Some(rect) = self.px_rect(frame.x, frame.y, frame.width, frame.height) {
                draw_hollow_rect_mut(&mut canvas, rect, PALETTE.crop);
            }
            let geometry = layout_record(record, template, LayoutMode::Print, 1.0);
            self.draw_face(&mut canvas, &ctx.sheet.front(slot), &geometry.front);
            self.draw_face(&mut canvas, &ctx.sheet.back(slot), &geometry.back);
        }

        debug!(page = page.number(), width, height, dpi = self.dpi, "rasterized sheet");
        Ok(canvas)
    }
}

/// Render `pages` and write them as `page_001.png`, `page_002.png`, ... into `dir`.
///
/// Each sheet is saved before the next one is rasterized.
pub fn write_pages(
    renderer: &PngRenderer,
    pages: &[PageDescriptor<'_>],
    ctx: &RenderContext,
    dir: &Path,
) -> Result<Vec<PathBuf>, RenderError> {
    if pages.is_empty() {
        return Err(RenderError::EmptyWorkingSet);
    }
    fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(pages.len());
    for page in pages {
        let image = renderer.render_page(page, ctx)?;
        let path = dir.join(page_file_name(page.number()));
        image.save(&path)?;
        written.push(path);
    }
    Ok(written)
}

pub fn page_file_name(number: usize) -> String {
    format!("page_{number:03}.png")
}

fn rgba(color: Color) -> Rgba<u8> {
    Rgba([color.r, color.g, color.b, 0xff])
}

fn shrink(rect: PixelRect, inset: u32) -> Option<PixelRect> {
    let w = rect.width().checked_sub(2 * inset)?;
    let h = rect.height().checked_sub(2 * inset)?;
    if w == 0 || h == 0 {
        return None;
    }
    Some(PixelRect::at(rect.left() + inset as i32, rect.top() + inset as i32).of_size(w, h))
}

/// Scale the referenced image to cover `area` and draw it there.
fn paste_fill(canvas: &mut RgbaImage, reference: &PhotoRef, area: PixelRect) {
    let image = match load_image(reference) {
        Ok(image) => image,
        Err(message) => {
            warn!(image = reference.as_str(), %message, "skipping image");
            return;
        }
    };
    let filled = image
        .resize_to_fill(area.width(), area.height(), FilterType::Triangle)
        .to_rgba8();
    overlay(canvas, &filled, area.left() as i64, area.top() as i64);
}

fn load_image(reference: &PhotoRef) -> Result<DynamicImage, String> {
    let source = reference.as_str();
    if loader::is_url(source) {
        let bytes = loader::get_blocking(source).map_err(|err| err.to_string())?;
        image::load_from_memory(&bytes).map_err(|err| err.to_string())
    } else {
        image::open(source).map_err(|err| err.to_string())
    }
}

/// Greedy word wrap; a single word wider than `max_width` gets its own line.
fn wrap(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split(' ').filter(|w| !w.is_empty()) {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if current.is_empty() || measure(&candidate) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            }
        }
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pagination::{SHEET_HEIGHT_MM, SHEET_WIDTH_MM, paginate};
    use crate::core::record::{CardRecord, CardVariant, RegularCard};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn records(n: usize) -> Vec<CardRecord> {
        (0..n)
            .map(|i| {
                RegularCard {
                    name: format!("Person {i}"),
                    photo: Some(PhotoRef("/no/such/photo.jpg".into())),
                    ..RegularCard::default()
                }
                .into()
            })
            .collect()
    }

    #[test]
    fn sheet_size_follows_dpi() {
        let renderer = PngRenderer::new(96);
        let records = records(1);
        let pages = paginate(&records, CardVariant::Regular);
        let image = renderer
            .render_page(&pages[0], &RenderContext::default())
            .unwrap();
        assert_eq!(image.width(), (SHEET_WIDTH_MM / 25.4 * 96.0).round() as u32);
        assert_eq!(image.height(), (SHEET_HEIGHT_MM / 25.4 * 96.0).round() as u32);
    }

    #[test]
    fn dpi_is_clamped() {
        assert_eq!(PngRenderer::new(10).dpi(), 72);
        assert_eq!(PngRenderer::new(5000).dpi(), 1200);
    }

    #[test]
    fn pages_are_written_with_numbered_names() {
        let dir = tempdir().unwrap();
        let records = records(5);
        let pages = paginate(&records, CardVariant::Regular);
        let written = write_pages(
            &PngRenderer::new(72),
            &pages,
            &RenderContext::default(),
            dir.path(),
        )
        .unwrap();
        assert_eq!(written.len(), 2);
        assert!(dir.path().join("page_001.png").exists());
        assert!(dir.path().join("page_002.png").exists());
    }

    #[test]
    fn failed_save_keeps_earlier_pages() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("page_002.png")).unwrap();
        let records = records(9);
        let pages = paginate(&records, CardVariant::Regular);
        let result = write_pages(
            &PngRenderer::new(72),
            &pages,
            &RenderContext::default(),
            dir.path(),
        );
        assert!(result.is_err());
        assert!(dir.path().join("page_001.png").is_file());
        assert!(!dir.path().join("page_003.png").exists());
    }

    #[test]
    fn empty_slots_get_no_crop_frame() {
        let renderer = PngRenderer::new(72);
        let ctx = RenderContext::default();
        let records = records(1);
        let pages = paginate(&records, CardVariant::Regular);
        let image = renderer.render_page(&pages[0], &ctx).unwrap();

        let frame_rect = |column, row| {
            let frame = ctx.sheet.crop_frame(pages[0].slot(column, row).unwrap());
            renderer
                .px_rect(frame.x, frame.y, frame.width, frame.height)
                .unwrap()
        };
        let filled = frame_rect(1, 1);
        let empty = frame_rect(2, 2);
        assert_eq!(
            *image.get_pixel(filled.left() as u32, filled.top() as u32),
            PALETTE.crop
        );
        assert_eq!(
            *image.get_pixel(empty.right() as u32, empty.bottom() as u32),
            PALETTE.page_bg
        );
    }

    #[test]
    fn nothing_to_render_is_an_error() {
        let dir = tempdir().unwrap();
        let err = write_pages(
            &PngRenderer::new(72),
            &[],
            &RenderContext::default(),
            dir.path(),
        )
        .unwrap_err();
        assert!(matches!(err, RenderError::EmptyWorkingSet));
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn wrap_breaks_on_width() {
        let lines = wrap("aa bb cc", 5.0, |s| s.chars().count() as f32);
        assert_eq!(lines, vec!["aa bb".to_string(), "cc".to_string()]);
        assert_eq!(wrap("", 5.0, |_| 0.0), vec![String::new()]);
    }

    #[test]
    fn missing_font_file_is_reported() {
        let err = PngRenderer::new(72)
            .with_font_file(Path::new("/no/such/font.ttf"))
            .err()
            .unwrap();
        assert!(matches!(err, RenderError::Font { .. }));
    }
}
