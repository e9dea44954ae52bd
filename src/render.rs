//! Turning page descriptors into printable output.

use std::fmt::{self, Write};

use crate::core::layout::{Align, FaceGeometry, LayoutMode, TextBox, layout_record};
use crate::core::pagination::{PageDescriptor, Rect, SheetLayout};
use crate::core::record::CardVariant;
use crate::core::templates::{CardTemplate, TemplateRegistry};
use crate::error::RenderError;
use crate::settings::Settings;

/// Everything a renderer needs besides the pages themselves.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub regular: CardTemplate,
    pub safety: CardTemplate,
    pub sheet: SheetLayout,
}

impl RenderContext {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            regular: settings.template(CardVariant::Regular),
            safety: settings.template(CardVariant::Safety),
            sheet: SheetLayout::new(settings.spacing.resolve()),
        }
    }

    pub fn template(&self, variant: CardVariant) -> &CardTemplate {
        match variant {
            CardVariant::Regular => &self.regular,
            CardVariant::Safety => &self.safety,
        }
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self {
            regular: TemplateRegistry::get(CardVariant::Regular).builtin(),
            safety: TemplateRegistry::get(CardVariant::Safety).builtin(),
            sheet: SheetLayout::default(),
        }
    }
}

/// Output backend for one sheet at a time.
pub trait PageRenderer {
    type Output;

    fn render_page(
        &self,
        page: &PageDescriptor<'_>,
        ctx: &RenderContext,
    ) -> Result<Self::Output, RenderError>;

    /// Render every page; an empty page list is rejected up front.
    fn render_all(
        &self,
        pages: &[PageDescriptor<'_>],
        ctx: &RenderContext,
    ) -> Result<Vec<Self::Output>, RenderError> {
        if pages.is_empty() {
            return Err(RenderError::EmptyWorkingSet);
        }
        pages.iter().map(|page| self.render_page(page, ctx)).collect()
    }
}

/// Self-contained HTML print document, one `.print-page` per sheet.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlDocument;

impl HtmlDocument {
    /// Complete document for `pages`, titled `title`.
    pub fn render(
        &self,
        title: &str,
        pages: &[PageDescriptor<'_>],
        ctx: &RenderContext,
    ) -> Result<String, RenderError> {
        let sections = self.render_all(pages, ctx)?;
        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        writeln!(html, "<title>{}</title>", escape(title))?;
        html.push_str(STYLE);
        html.push_str("</head>\n<body>\n");
        for section in sections {
            html.push_str(&section);
        }
        html.push_str("</body>\n</html>\n");
        Ok(html)
    }
}

impl PageRenderer for HtmlDocument {
    type Output = String;

    fn render_page(
        &self,
        page: &PageDescriptor<'_>,
        ctx: &RenderContext,
    ) -> Result<String, RenderError> {
        let mut out = String::new();
        write_page(&mut out, page, ctx)?;
        Ok(out)
    }
}

fn write_page(out: &mut String, page: &PageDescriptor<'_>, ctx: &RenderContext) -> fmt::Result {
    let template = ctx.template(page.variant);
    writeln!(
        out,
        "<section class=\"print-page\" data-page=\"{}\">",
        page.number()
    )?;
    for slot in &page.slots {
        let Some(record) = slot.record else {
            writeln!(
                out,
                "<div class=\"card-slot empty\" data-column=\"{}\" data-row=\"{}\" style=\"{}\"></div>",
                slot.column,
                slot.row,
                rect_style(&ctx.sheet.cell(slot))
            )?;
            continue;
        };
        writeln!(
            out,
            "<div class=\"crop-frame\" style=\"{}\"></div>",
            rect_style(&ctx.sheet.crop_frame(slot))
        )?;
        let geometry = layout_record(record, template, LayoutMode::Print, 1.0);
        write_face(out, "front", &ctx.sheet.front(slot), &geometry.front)?;
        write_face(out, "back", &ctx.sheet.back(slot), &geometry.back)?;
    }
    out.write_str("</section>\n")
}

const STYLE: &str = "<style>
@page { size: A4 landscape; margin: 0; }
html, body { margin: 0; padding: 0; }
.print-page { position: relative; width: 297mm; height: 210mm; overflow: hidden; page-break-after: always; }
.print-page:last-child { page-break-after: auto; }
.crop-frame { position: absolute; box-sizing: border-box; border: 0.1mm dashed #9ca3af; }
.card-slot, .face { position: absolute; overflow: hidden; }
.face > * { position: absolute; box-sizing: border-box; }
.face img { object-fit: cover; }
.text { line-height: 1.4; white-space: pre-wrap; }
</style>
";

fn write_face(out: &mut String, side: &str, rect: &Rect, face: &FaceGeometry) -> fmt::Result {
    let mut style = format!("{} background:{};", rect_style(rect), face.fill.to_hex());
    if let Some(background) = &face.background {
        write!(
            style,
            " background-image:url('{}'); background-size:cover;",
            escape(background.as_str())
        )?;
    }
    writeln!(out, "<div class=\"face {side}\" style=\"{style}\">")?;

    if let Some(photo) = &face.photo {
        let frame = format!(
            "left:{}; top:{}; width:{}; height:{}; border:{} solid #ffffff; border-radius:{}; background:{};",
            mm(photo.x),
            mm(photo.y),
            mm(photo.width),
            mm(photo.height),
            mm(photo.border),
            mm(photo.radius),
            photo.fill.to_hex()
        );
        match &photo.photo {
            Some(src) => writeln!(
                out,
                "<img class=\"photo\" src=\"{}\" style=\"{frame}\">",
                escape(src.as_str())
            )?,
            None => writeln!(out, "<div class=\"photo\" style=\"{frame}\"></div>")?,
        }
    }

    for badge in &face.badges {
        writeln!(
            out,
            "<div class=\"badge\" style=\"left:{}; top:{}; width:{}; height:{}; border-radius:{}; background:{};\"></div>",
            mm(badge.x),
            mm(badge.y),
            mm(badge.width),
            mm(badge.height),
            mm(badge.radius),
            badge.fill.to_hex()
        )?;
    }

    for text in &face.texts {
        write_text(out, text)?;
    }
    out.write_str("</div>\n")
}

fn write_text(out: &mut String, text: &TextBox) -> fmt::Result {
    if text.label.is_empty() && text.text.is_empty() {
        return Ok(());
    }
    let align = match text.align {
        Align::Left => "left",
        Align::Center => "center",
        Align::Right => "right",
    };
    writeln!(
        out,
        "<div class=\"text\" data-field=\"{}\" style=\"left:{}; top:{}; width:{}; font-size:{}; font-weight:{}; text-align:{align}; color:{};\">{}{}</div>",
        field_name(text),
        mm(text.x),
        mm(text.y),
        mm(text.width),
        mm(text.font_size),
        text.weight,
        text.color.to_hex(),
        escape(&text.label),
        escape(&text.text)
    )
}

fn field_name(text: &TextBox) -> String {
    serde_json::to_value(text.field)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

fn rect_style(rect: &Rect) -> String {
    format!(
        "left:{}; top:{}; width:{}; height:{};",
        mm(rect.x),
        mm(rect.y),
        mm(rect.width),
        mm(rect.height)
    )
}

fn mm(value: f32) -> String {
    format!("{value:.2}mm")
}

/// Minimal HTML escaping for text and attribute values.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
