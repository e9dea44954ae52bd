use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Literal position label given to every imported regular employee ("employee").
pub const DEFAULT_POSITION: &str = "พนักงาน";

/// Expiry printed on every safety passport; never read from the source.
pub const SAFETY_EXPIRY_DATE: &str = "28/02/2028";

/// Which kind of card a record belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum CardVariant {
    #[default]
    Regular,
    Safety,
}

impl CardVariant {
    pub const ALL: [CardVariant; 2] = [CardVariant::Regular, CardVariant::Safety];

    pub fn as_str(&self) -> &'static str {
        match self {
            CardVariant::Regular => "regular",
            CardVariant::Safety => "safety",
        }
    }
}

impl fmt::Display for CardVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CardVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "regular" => Ok(CardVariant::Regular),
            "safety" => Ok(CardVariant::Safety),
            other => Err(format!("unknown card variant '{other}'")),
        }
    }
}

/// Identifier assigned to a record when it is created.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct CardId(Uuid);

impl CardId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CardId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference to a portrait or background image (path or URL).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct PhotoRef(pub String);

impl PhotoRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Employee ID card data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RegularCard {
    #[serde(default)]
    pub id: CardId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub id_code: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub branch_code: String,
    #[serde(default)]
    pub branch_name: String,
    #[serde(default)]
    pub employee_code: String,
    #[serde(default)]
    pub has_printed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<PhotoRef>,
}

/// Safety passport data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SafetyCard {
    #[serde(default)]
    pub id: CardId,
    #[serde(default)]
    pub safety_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub issue_date: String,
    #[serde(default)]
    pub training_module: String,
    #[serde(default)]
    pub back_details: String,
    #[serde(default = "default_expiry")]
    pub expiry_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<PhotoRef>,
}

impl Default for SafetyCard {
    fn default() -> Self {
        Self {
            id: CardId::new(),
            safety_id: String::new(),
            name: String::new(),
            issue_date: String::new(),
            training_module: String::new(),
            back_details: String::new(),
            expiry_date: default_expiry(),
            photo: None,
        }
    }
}

fn default_expiry() -> String {
    SAFETY_EXPIRY_DATE.to_string()
}

/// A single card, tagged with its variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "variant", rename_all = "lowercase")]
pub enum CardRecord {
    Regular(RegularCard),
    Safety(SafetyCard),
}

impl CardRecord {
    pub fn variant(&self) -> CardVariant {
        match self {
            CardRecord::Regular(_) => CardVariant::Regular,
            CardRecord::Safety(_) => CardVariant::Safety,
        }
    }

    pub fn id(&self) -> CardId {
        match self {
            CardRecord::Regular(card) => card.id,
            CardRecord::Safety(card) => card.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            CardRecord::Regular(card) => &card.name,
            CardRecord::Safety(card) => &card.name,
        }
    }

    pub fn photo(&self) -> Option<&PhotoRef> {
        match self {
            CardRecord::Regular(card) => card.photo.as_ref(),
            CardRecord::Safety(card) => card.photo.as_ref(),
        }
    }

    pub fn set_photo(&mut self, photo: Option<PhotoRef>) {
        match self {
            CardRecord::Regular(card) => card.photo = photo,
            CardRecord::Safety(card) => card.photo = photo,
        }
    }

    /// Copy of this record as it enters the working set: new id, no photo.
    pub fn to_selected(&self) -> CardRecord {
        let mut copy = self.clone();
        match &mut copy {
            CardRecord::Regular(card) => {
                card.id = CardId::new();
                card.photo = None;
            }
            CardRecord::Safety(card) => {
                card.id = CardId::new();
                card.photo = None;
            }
        }
        copy
    }

    /// One-line description used by listings and log lines.
    pub fn summary(&self) -> String {
        match self {
            CardRecord::Regular(card) => format!(
                "{} | {} | {}",
                display_or_dash(&card.name),
                display_or_dash(&card.id_code),
                display_or_dash(&card.department)
            ),
            CardRecord::Safety(card) => format!(
                "{} | {} | issued {}",
                display_or_dash(&card.safety_id),
                display_or_dash(&card.name),
                display_or_dash(&card.issue_date)
            ),
        }
    }
}

impl From<RegularCard> for CardRecord {
    fn from(card: RegularCard) -> Self {
        CardRecord::Regular(card)
    }
}

impl From<SafetyCard> for CardRecord {
    fn from(card: SafetyCard) -> Self {
        CardRecord::Safety(card)
    }
}

fn display_or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn variant_tag_is_serialized_on_the_record() {
        let record = CardRecord::Safety(SafetyCard {
            safety_id: "B001".into(),
            ..SafetyCard::default()
        });
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["variant"], "safety");
        assert_eq!(json["expiry_date"], SAFETY_EXPIRY_DATE);

        let back: CardRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back.variant(), CardVariant::Safety);
    }

    #[test]
    fn selected_copy_gets_fresh_id_and_drops_photo() {
        let original = CardRecord::Regular(RegularCard {
            name: "Somchai Jaidee".into(),
            photo: Some(PhotoRef("me.jpg".into())),
            ..RegularCard::default()
        });
        let selected = original.to_selected();
        assert_ne!(selected.id(), original.id());
        assert!(selected.photo().is_none());
        assert_eq!(selected.name(), "Somchai Jaidee");
    }

    #[test]
    fn variant_parses_case_insensitively() {
        assert_eq!("SAFETY".parse::<CardVariant>(), Ok(CardVariant::Safety));
        assert!("vip".parse::<CardVariant>().is_err());
    }
}
