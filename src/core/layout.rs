//! Card geometry shared by on-screen preview and physical print output.
//!
//! Regular cards are laid out from millimeter constants, so a preview at any
//! scale is an exact enlargement of the printed card. Safety passports keep
//! their placements in reference pixels (96 DPI, scale 1); print converts
//! those pixels to millimeters and preview multiplies them by the scale. A
//! few safety offsets (header position, back padding) are fixed pixels that
//! ignore the scale.

use serde::Serialize;

use crate::core::record::{
    CardRecord, CardVariant, PhotoRef, RegularCard, SAFETY_EXPIRY_DATE, SafetyCard,
};
use crate::core::templates::{CardTemplate, Color};

pub const CARD_WIDTH_MM: f32 = 60.0;
pub const CARD_HEIGHT_MM: f32 = 85.6;
pub const MM_TO_PX: f32 = 3.78;

pub const PHOTO_TOP_MM: f32 = 23.8;
pub const PHOTO_WIDTH_MM: f32 = 24.0;
pub const PHOTO_HEIGHT_MM: f32 = 28.0;
pub const TEXT_TOP_MM: f32 = 54.0;
const TEXT_INSET_MM: f32 = 3.0;
const LINE_HEIGHT: f32 = 1.4;

const TEXT_DARK: Color = Color::BLACK;
const TEXT_MUTED: Color = Color::rgb(0x37, 0x41, 0x51);
const PHOTO_FILL: Color = Color::rgb(0xf3, 0xf4, 0xf6);
const BADGE_GREEN: Color = Color::rgb(0xa3, 0xff, 0x4d);
const HEADER_GREEN: Color = Color::rgb(0x00, 0xa6, 0x51);

const PLACEHOLDER_NAME: &str = "ชื่อ-นามสกุล";
const PLACEHOLDER_POSITION: &str = "ตำแหน่ง";
const PLACEHOLDER_ID_CODE: &str = "xxxxxxx";
const PLACEHOLDER_DEPARTMENT: &str = "xxxxxxxx";
const PLACEHOLDER_SAFETY_ID: &str = "CPAXT2311-1000-000001";
const PLACEHOLDER_ISSUE_DATE: &str = "01/01/2024";
const PLACEHOLDER_TRAINING: &str = "01/03/25";
const PLACEHOLDER_BACK: &str = "ข้อมูลด้านหลังบัตร";

const LABEL_ID_CODE: &str = "รหัสพนักงาน : ";
const LABEL_BRANCH: &str = "ประจำสาขา : ";
const LABEL_ISSUED: &str = "วันออกบัตร";
const LABEL_EXPIRES: &str = "วันหมดอายุ";

/// Whether geometry is for the screen or for paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    Preview,
    Print,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Px,
    Mm,
}

/// Converts template lengths into the output unit of one layout call.
#[derive(Debug, Clone, Copy)]
struct Measure {
    mode: LayoutMode,
    scale: f32,
}

impl Measure {
    fn new(mode: LayoutMode, scale: f32) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        Self { mode, scale }
    }

    fn unit(&self) -> Unit {
        match self.mode {
            LayoutMode::Preview => Unit::Px,
            LayoutMode::Print => Unit::Mm,
        }
    }

    fn mm(&self, value: f32) -> f32 {
        match self.mode {
            LayoutMode::Preview => value * MM_TO_PX * self.scale,
            LayoutMode::Print => value,
        }
    }

    /// Reference pixel that follows the preview scale.
    fn px(&self, value: f32) -> f32 {
        match self.mode {
            LayoutMode::Preview => value * self.scale,
            LayoutMode::Print => value / MM_TO_PX,
        }
    }

    /// Reference pixel that ignores the preview scale.
    fn fixed_px(&self, value: f32) -> f32 {
        match self.mode {
            LayoutMode::Preview => value,
            LayoutMode::Print => value / MM_TO_PX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Which piece of card data a text box shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextField {
    CompanyName,
    Name,
    Position,
    IdCode,
    Department,
    SafetyId,
    IssueDateLabel,
    IssueDate,
    ExpiryDateLabel,
    ExpiryDate,
    TrainingGrade,
    TrainingModule,
    BackDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBox {
    pub field: TextField,
    /// Fixed caption printed before the value (e.g. "รหัสพนักงาน : ").
    #[serde(skip_serializing_if = "String::is_empty")]
    pub label: String,
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub font_size: f32,
    pub weight: u16,
    pub align: Align,
    pub color: Color,
    pub placeholder: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhotoBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub border: f32,
    pub radius: f32,
    pub fill: Color,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<PhotoRef>,
}

/// Filled rectangle with content, used for the safety training badge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BadgeBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub radius: f32,
    pub fill: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaceGeometry {
    pub fill: Color,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<PhotoRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<PhotoBox>,
    pub texts: Vec<TextBox>,
    pub badges: Vec<BadgeBox>,
}

impl FaceGeometry {
    fn plain(fill: Color, background: Option<PhotoRef>) -> Self {
        Self {
            fill,
            background,
            photo: None,
            texts: Vec::new(),
            badges: Vec::new(),
        }
    }

    pub fn text(&self, field: TextField) -> Option<&TextBox> {
        self.texts.iter().find(|t| t.field == field)
    }
}

/// Complete geometry of one card, front and back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardGeometry {
    pub variant: CardVariant,
    pub mode: LayoutMode,
    pub unit: Unit,
    pub width: f32,
    pub height: f32,
    pub front: FaceGeometry,
    pub back: FaceGeometry,
}

/// Compute card geometry.
///
/// `record` of `None` lays out a blank card with placeholder text. In
/// preview, empty fields of a real record also show placeholders; print
/// output never contains placeholder text. `scale` is ignored in print mode.
pub fn layout(
    record: Option<&CardRecord>,
    variant: CardVariant,
    template: &CardTemplate,
    mode: LayoutMode,
    scale: f32,
) -> CardGeometry {
    let m = Measure::new(mode, scale);
    let (front, back) = match (variant, record) {
        (CardVariant::Regular, Some(CardRecord::Regular(card))) => {
            regular_faces(Some(card), template, m)
        }
        (CardVariant::Regular, _) => regular_faces(None, template, m),
        (CardVariant::Safety, Some(CardRecord::Safety(card))) => {
            safety_faces(Some(card), template, m)
        }
        (CardVariant::Safety, _) => safety_faces(None, template, m),
    };
    CardGeometry {
        variant,
        mode,
        unit: m.unit(),
        width: m.mm(CARD_WIDTH_MM),
        height: m.mm(CARD_HEIGHT_MM),
        front,
        back,
    }
}

/// Layout a record with its own variant.
pub fn layout_record(
    record: &CardRecord,
    template: &CardTemplate,
    mode: LayoutMode,
    scale: f32,
) -> CardGeometry {
    layout(Some(record), record.variant(), template, mode, scale)
}

/// One text line of a template, before unit conversion.
#[derive(Clone, Copy)]
struct Line<'a> {
    field: TextField,
    label: &'static str,
    value: Option<&'a str>,
    /// `None` for fixed captions that never fall back to a placeholder.
    placeholder: Option<&'static str>,
    x: f32,
    y: f32,
    width: f32,
    size: f32,
    weight: u16,
    align: Align,
    color: Color,
}

impl Line<'_> {
    fn place(self, mode: LayoutMode, convert: impl Fn(f32) -> f32) -> TextBox {
        let (text, placeholder) = match self.placeholder {
            Some(placeholder) => fill_text(self.value, placeholder, mode),
            None => (self.value.unwrap_or_default().to_string(), false),
        };
        TextBox {
            field: self.field,
            label: self.label.to_string(),
            text,
            x: convert(self.x),
            y: convert(self.y),
            width: convert(self.width),
            font_size: convert(self.size),
            weight: self.weight,
            align: self.align,
            color: self.color,
            placeholder,
        }
    }
}

/// Picks the record value, a placeholder, or nothing.
fn fill_text(value: Option<&str>, placeholder: &str, mode: LayoutMode) -> (String, bool) {
    match value {
        Some(v) if !v.is_empty() => (v.to_string(), false),
        Some(_) if mode == LayoutMode::Print => (String::new(), false),
        _ => (placeholder.to_string(), true),
    }
}

fn regular_faces(
    card: Option<&RegularCard>,
    template: &CardTemplate,
    m: Measure,
) -> (FaceGeometry, FaceGeometry) {
    let mut front = FaceGeometry::plain(Color::WHITE, template.front_background.clone());
    front.photo = Some(PhotoBox {
        x: m.mm((CARD_WIDTH_MM - PHOTO_WIDTH_MM) / 2.0),
        y: m.mm(PHOTO_TOP_MM),
        width: m.mm(PHOTO_WIDTH_MM),
        height: m.mm(PHOTO_HEIGHT_MM),
        border: m.mm(2.0 / MM_TO_PX),
        radius: m.mm(6.0 / MM_TO_PX),
        fill: PHOTO_FILL,
        photo: card.and_then(|c| c.photo.clone()),
    });

    // Sizes are reference pixels; the vertical flow is tracked in mm.
    let name = Line {
        field: TextField::Name,
        label: "",
        value: card.map(|c| c.name.as_str()),
        placeholder: Some(PLACEHOLDER_NAME),
        x: TEXT_INSET_MM,
        y: TEXT_TOP_MM,
        width: CARD_WIDTH_MM - 2.0 * TEXT_INSET_MM,
        size: 15.0,
        weight: 500,
        align: Align::Center,
        color: TEXT_DARK,
    };
    let position = Line {
        field: TextField::Position,
        value: card.map(|c| c.position.as_str()),
        placeholder: Some(PLACEHOLDER_POSITION),
        size: 12.0,
        weight: 400,
        color: TEXT_MUTED,
        ..name
    };
    let id_code = Line {
        field: TextField::IdCode,
        label: LABEL_ID_CODE,
        value: card.map(|c| c.id_code.as_str()),
        placeholder: Some(PLACEHOLDER_ID_CODE),
        size: 10.0,
        weight: 600,
        ..position
    };
    let department = Line {
        field: TextField::Department,
        label: LABEL_BRANCH,
        value: card.map(|c| c.department.as_str()),
        placeholder: Some(PLACEHOLDER_DEPARTMENT),
        ..id_code
    };

    // Gap after each line, in reference pixels.
    let flow = [(name, 2.0), (position, 4.0), (id_code, 2.0), (department, 0.0)];
    let mut top_mm = TEXT_TOP_MM;
    for (line, gap_px) in flow {
        let size_mm = line.size / MM_TO_PX;
        let line = Line {
            y: top_mm,
            size: size_mm,
            ..line
        };
        front.texts.push(line.place(m.mode, |v| m.mm(v)));
        top_mm += size_mm * LINE_HEIGHT + gap_px / MM_TO_PX;
    }

    let back = FaceGeometry::plain(template.theme_color, template.back_background.clone());
    (front, back)
}

fn safety_faces(
    card: Option<&SafetyCard>,
    template: &CardTemplate,
    m: Measure,
) -> (FaceGeometry, FaceGeometry) {
    let width_px = CARD_WIDTH_MM * MM_TO_PX;
    let height_px = CARD_HEIGHT_MM * MM_TO_PX;
    let half = (width_px - 20.0) / 2.0;
    let right_x = 10.0 + half - 6.0;

    let mut front = FaceGeometry::plain(Color::WHITE, template.front_background.clone());
    if template.front_background.is_none() {
        front.texts.push(TextBox {
            field: TextField::CompanyName,
            label: String::new(),
            text: template.company_name.clone(),
            x: m.fixed_px(10.0),
            y: m.fixed_px(10.0),
            width: m.px(width_px - 20.0),
            font_size: m.px(14.0),
            weight: 700,
            align: Align::Left,
            color: HEADER_GREEN,
            placeholder: false,
        });
    }

    front.photo = Some(PhotoBox {
        x: m.px((width_px - 90.0) / 2.0),
        y: m.px(58.0),
        width: m.px(90.0),
        height: m.px(105.0),
        border: m.px(2.0),
        radius: m.px(8.0),
        fill: PHOTO_FILL,
        photo: card.and_then(|c| c.photo.clone()),
    });

    let id_line = Line {
        field: TextField::SafetyId,
        label: "",
        value: card.map(|c| c.safety_id.as_str()),
        placeholder: Some(PLACEHOLDER_SAFETY_ID),
        x: 0.0,
        y: 170.0,
        width: width_px,
        size: 14.0,
        weight: 300,
        align: Align::Center,
        color: TEXT_DARK,
    };
    let issued_label = Line {
        field: TextField::IssueDateLabel,
        value: Some(LABEL_ISSUED),
        placeholder: None,
        x: 16.0,
        y: 218.0,
        width: half,
        size: 10.0,
        weight: 700,
        align: Align::Left,
        ..id_line
    };
    let expires_label = Line {
        field: TextField::ExpiryDateLabel,
        value: Some(LABEL_EXPIRES),
        x: right_x,
        align: Align::Right,
        ..issued_label
    };
    let grade = Line {
        field: TextField::TrainingGrade,
        value: Some("G"),
        placeholder: None,
        x: 7.0,
        y: 268.0,
        width: 50.0,
        size: 16.0,
        weight: 700,
        align: Align::Center,
        ..id_line
    };
    let lines = [
        id_line,
        Line {
            field: TextField::Name,
            value: card.map(|c| c.name.as_str()),
            placeholder: Some(PLACEHOLDER_NAME),
            y: 170.0 + 14.0 * LINE_HEIGHT,
            weight: 500,
            ..id_line
        },
        issued_label,
        Line {
            field: TextField::IssueDate,
            value: card.map(|c| c.issue_date.as_str()),
            placeholder: Some(PLACEHOLDER_ISSUE_DATE),
            y: 218.0 + 10.0 * LINE_HEIGHT,
            weight: 400,
            ..issued_label
        },
        expires_label,
        Line {
            field: TextField::ExpiryDate,
            value: card.map(|c| c.expiry_date.as_str()),
            placeholder: Some(SAFETY_EXPIRY_DATE),
            y: 218.0 + 10.0 * LINE_HEIGHT,
            weight: 400,
            ..expires_label
        },
        grade,
        Line {
            field: TextField::TrainingModule,
            value: card.map(|c| c.training_module.as_str()),
            placeholder: Some(PLACEHOLDER_TRAINING),
            y: 268.0 + 16.0,
            size: 8.0,
            weight: 400,
            ..grade
        },
    ];
    for line in lines {
        front.texts.push(line.place(m.mode, |v| m.px(v)));
    }

    front.badges.push(BadgeBox {
        x: m.px(7.0),
        y: m.px(265.0),
        width: m.px(50.0),
        height: m.px(32.0),
        radius: m.px(4.0),
        fill: BADGE_GREEN,
    });

    // Back text sits above a 44px bottom margin inside fixed 10px padding.
    let back_font = 10.0;
    let mut back = FaceGeometry::plain(Color::WHITE, template.back_background.clone());
    let (text, placeholder) = fill_text(
        card.map(|c| c.back_details.as_str()),
        PLACEHOLDER_BACK,
        m.mode,
    );
    back.texts.push(TextBox {
        field: TextField::BackDetails,
        label: String::new(),
        text,
        x: m.fixed_px(10.0),
        y: m.px(height_px) - m.fixed_px(10.0) - m.px(44.0 + back_font * LINE_HEIGHT),
        width: m.px(width_px) - m.fixed_px(20.0),
        font_size: m.px(back_font),
        weight: 400,
        align: Align::Left,
        color: TEXT_DARK,
        placeholder,
    });

    (front, back)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::templates::TemplateRegistry;
    use pretty_assertions::assert_eq;

    fn regular(name: &str) -> CardRecord {
        CardRecord::Regular(RegularCard {
            name: name.into(),
            position: "Engineer".into(),
            id_code: "E1".into(),
            department: "Silom (B1)".into(),
            ..RegularCard::default()
        })
    }

    fn template(variant: CardVariant) -> CardTemplate {
        TemplateRegistry::get(variant).builtin()
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn print_mode_uses_physical_millimeters() {
        let record = regular("Anan");
        let geo = layout_record(&record, &template(CardVariant::Regular), LayoutMode::Print, 3.0);
        assert_eq!(geo.unit, Unit::Mm);
        assert_eq!(geo.width, CARD_WIDTH_MM);
        assert_eq!(geo.height, CARD_HEIGHT_MM);
        let photo = geo.front.photo.as_ref().unwrap();
        assert_eq!(photo.y, PHOTO_TOP_MM);
        assert_eq!(photo.x, 18.0);
        assert_eq!(geo.front.text(TextField::Name).unwrap().y, TEXT_TOP_MM);
    }

    #[test]
    fn regular_preview_is_scaled_print() {
        let record = regular("Anan");
        let tpl = template(CardVariant::Regular);
        let print = layout_record(&record, &tpl, LayoutMode::Print, 1.0);
        let scale = 1.5;
        let preview = layout_record(&record, &tpl, LayoutMode::Preview, scale);
        let k = MM_TO_PX * scale;
        assert_eq!(preview.unit, Unit::Px);
        assert!(close(preview.width, print.width * k));
        assert!(close(preview.height, print.height * k));
        let (pp, vp) = (print.front.photo.unwrap(), preview.front.photo.unwrap());
        assert!(close(vp.y, pp.y * k) && close(vp.width, pp.width * k));
        for (p, v) in print.front.texts.iter().zip(preview.front.texts.iter()) {
            assert!(close(v.y, p.y * k), "{:?}", p.field);
            assert!(close(v.font_size, p.font_size * k), "{:?}", p.field);
        }
    }

    #[test]
    fn blank_card_uses_placeholders() {
        let geo = layout(
            None,
            CardVariant::Regular,
            &template(CardVariant::Regular),
            LayoutMode::Preview,
            1.0,
        );
        assert!(geo.front.texts.iter().all(|t| t.placeholder));
        assert_eq!(geo.front.text(TextField::Name).unwrap().text, PLACEHOLDER_NAME);
    }

    #[test]
    fn print_never_emits_placeholder_for_empty_fields() {
        let record = regular("");
        let tpl = template(CardVariant::Regular);
        let print = layout_record(&record, &tpl, LayoutMode::Print, 1.0);
        let name = print.front.text(TextField::Name).unwrap();
        assert_eq!(name.text, "");
        assert!(!name.placeholder);

        let preview = layout_record(&record, &tpl, LayoutMode::Preview, 1.0);
        assert!(preview.front.text(TextField::Name).unwrap().placeholder);
    }

    #[test]
    fn regular_back_is_a_theme_panel_without_text() {
        let geo = layout_record(
            &regular("Anan"),
            &template(CardVariant::Regular),
            LayoutMode::Print,
            1.0,
        );
        assert!(geo.back.texts.is_empty());
        assert_eq!(geo.back.fill, Color::rgb(0x68, 0xc5, 0xbc));
    }

    #[test]
    fn safety_offsets_are_reference_pixels() {
        let record = CardRecord::Safety(SafetyCard {
            back_details: "Fire drill".into(),
            ..SafetyCard::default()
        });
        let tpl = template(CardVariant::Safety);
        let preview = layout_record(&record, &tpl, LayoutMode::Preview, 2.0);
        assert!(close(preview.front.photo.as_ref().unwrap().y, 116.0));
        let header = preview.front.text(TextField::CompanyName).unwrap();
        assert!(close(header.x, 10.0));

        let print = layout_record(&record, &tpl, LayoutMode::Print, 2.0);
        assert!(close(print.front.photo.as_ref().unwrap().y, 58.0 / MM_TO_PX));
        assert_eq!(
            print.back.text(TextField::BackDetails).unwrap().text,
            "Fire drill"
        );
    }

    #[test]
    fn safety_header_hidden_with_front_background() {
        let mut tpl = template(CardVariant::Safety);
        tpl.front_background = Some(PhotoRef("front.png".into()));
        let geo = layout(None, CardVariant::Safety, &tpl, LayoutMode::Print, 1.0);
        assert!(geo.front.text(TextField::CompanyName).is_none());
    }

    #[test]
    fn mismatched_record_is_laid_out_as_blank() {
        let geo = layout(
            Some(&regular("Anan")),
            CardVariant::Safety,
            &template(CardVariant::Safety),
            LayoutMode::Preview,
            1.0,
        );
        assert!(geo.front.text(TextField::Name).unwrap().placeholder);
    }
}
