//! Domain models for the chant catalog. The records are read-only snapshots of
//! the bundled JSON document; presentation helpers (labels, colors, Roman
//! numerals) live next to the types so every screen formats them the same way.

use std::fmt;

use serde::{Deserialize, Deserializer};

/// Neutral color used for office-part codes outside the known table.
pub const DEFAULT_OFFICE_PART_COLOR: &str = "#cccccc";

#[derive(Debug, Clone, Default, Deserialize)]
/// One chant as stored in the catalog document.
pub struct ChantRecord {
    /// Unique key within the loaded collection.
    pub id: i64,
    /// Opening words, used as the display title and for searching.
    #[serde(default, deserialize_with = "string_or_number")]
    pub incipit: String,
    /// Liturgical category code (`in`, `gr`, `al`, ...).
    #[serde(rename = "office-part", default, deserialize_with = "string_or_number")]
    pub office_part: String,
    /// Mode code. Older exports store it as a number, newer ones as text.
    #[serde(default, deserialize_with = "string_or_number")]
    pub mode: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub transcriber: Option<String>,
    #[serde(default)]
    pub commentary: Option<String>,
    /// Serialized notation payload. See [`crate::gabc::extract_source`].
    #[serde(default)]
    pub gabc: Option<String>,
}

impl ChantRecord {
    pub fn office_part(&self) -> OfficePart {
        OfficePart::from_code(&self.office_part)
    }

    pub fn mode(&self) -> ChantMode {
        ChantMode::from_code(&self.mode)
    }

    /// Incipit with a placeholder for records that were exported without one.
    pub fn display_title(&self) -> &str {
        let trimmed = self.incipit.trim();
        if trimmed.is_empty() {
            "chant"
        } else {
            trimmed
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(text)) => text,
        Some(Raw::Int(value)) => value.to_string(),
        Some(Raw::Float(value)) => value.to_string(),
        None => String::new(),
    })
}

/// Liturgical category of a chant. Unknown codes are kept verbatim so the UI
/// can still show something meaningful.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OfficePart {
    Alleluia,
    Antiphona,
    Canticum,
    Communio,
    Graduale,
    Hymnus,
    Improperia,
    Introitus,
    Kyriale,
    Offertorium,
    ToniCommunes,
    Prosa,
    Praefationes,
    Psalmus,
    ResponsoriumBreve,
    Responsorium,
    Rhythmus,
    Sequentia,
    Supplicatio,
    Tropa,
    Tractus,
    Varia,
    Unknown(String),
}

impl OfficePart {
    pub fn from_code(code: &str) -> Self {
        match code {
            "al" => OfficePart::Alleluia,
            "an" => OfficePart::Antiphona,
            "ca" => OfficePart::Canticum,
            "co" => OfficePart::Communio,
            "gr" => OfficePart::Graduale,
            "hy" => OfficePart::Hymnus,
            "im" => OfficePart::Improperia,
            "in" => OfficePart::Introitus,
            "ky" => OfficePart::Kyriale,
            "of" => OfficePart::Offertorium,
            "or" => OfficePart::ToniCommunes,
            "pa" => OfficePart::Prosa,
            "pr" => OfficePart::Praefationes,
            "ps" => OfficePart::Psalmus,
            "rb" => OfficePart::ResponsoriumBreve,
            "re" => OfficePart::Responsorium,
            "rh" => OfficePart::Rhythmus,
            "se" => OfficePart::Sequentia,
            "su" => OfficePart::Supplicatio,
            "tp" => OfficePart::Tropa,
            "tr" => OfficePart::Tractus,
            "va" => OfficePart::Varia,
            other => OfficePart::Unknown(other.to_string()),
        }
    }

    /// Human label. Unknown codes fall back to the raw code, or `N/A` when
    /// the record carried no code at all.
    pub fn label(&self) -> &str {
        match self {
            OfficePart::Alleluia => "Alleluia",
            OfficePart::Antiphona => "Antiphona",
            OfficePart::Canticum => "Canticum",
            OfficePart::Communio => "Communio",
            OfficePart::Graduale => "Graduale",
            OfficePart::Hymnus => "Hymnus",
            OfficePart::Improperia => "Improperia",
            OfficePart::Introitus => "Introitus",
            OfficePart::Kyriale => "Kyriale",
            OfficePart::Offertorium => "Offertorium",
            OfficePart::ToniCommunes => "Toni Communes",
            OfficePart::Prosa => "Prosa",
            OfficePart::Praefationes => "Praefationes",
            OfficePart::Psalmus => "Psalmus",
            OfficePart::ResponsoriumBreve => "Responsorium breve",
            OfficePart::Responsorium => "Responsorium",
            OfficePart::Rhythmus => "Rhythmus",
            OfficePart::Sequentia => "Sequentia",
            OfficePart::Supplicatio => "Supplicatio",
            OfficePart::Tropa => "Tropa",
            OfficePart::Tractus => "Tractus",
            OfficePart::Varia => "Varia",
            OfficePart::Unknown(code) if code.trim().is_empty() => "N/A",
            OfficePart::Unknown(code) => code,
        }
    }

    /// Card accent color as a `#rrggbb` string.
    pub fn color_hex(&self) -> &'static str {
        match self {
            OfficePart::Alleluia => "#b0d2e8",
            OfficePart::Antiphona => "#e0c85c",
            OfficePart::Canticum => "#707070",
            OfficePart::Communio => "#909050",
            OfficePart::Graduale => "#b0e070",
            OfficePart::Hymnus => "#c0a080",
            OfficePart::Improperia => "#8c5c44",
            OfficePart::Introitus => "#d04040",
            OfficePart::Kyriale => "#4040a0",
            OfficePart::Offertorium => "#809070",
            OfficePart::ToniCommunes => "#e0e0a0",
            OfficePart::Prosa => "#a050a0",
            OfficePart::Praefationes => "#d080a0",
            OfficePart::Psalmus => "#8090a0",
            OfficePart::ResponsoriumBreve => "#9c7c60",
            OfficePart::Responsorium => "#9c7c60",
            OfficePart::Rhythmus => "#e09050",
            OfficePart::Sequentia => "#a09070",
            OfficePart::Supplicatio => "#d04040",
            OfficePart::Tropa => "#80d0d0",
            OfficePart::Tractus => "#c09060",
            OfficePart::Varia => "#d0d0d0",
            OfficePart::Unknown(_) => DEFAULT_OFFICE_PART_COLOR,
        }
    }
}

impl fmt::Display for OfficePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One of the eight church modes, or whatever else the record carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChantMode {
    Numbered(u8),
    Unrecognized(String),
}

const ROMAN_MODES: [&str; 8] = ["I", "II", "III", "IV", "V", "VI", "VII", "VIII"];

impl ChantMode {
    pub fn from_code(code: &str) -> Self {
        match code.trim().parse::<u8>() {
            Ok(number @ 1..=8) => ChantMode::Numbered(number),
            _ => ChantMode::Unrecognized(code.to_string()),
        }
    }

    /// Roman numeral for modes 1-8; anything else is shown as-is.
    pub fn roman(&self) -> &str {
        match self {
            ChantMode::Numbered(number) => ROMAN_MODES[usize::from(*number) - 1],
            ChantMode::Unrecognized(raw) => raw,
        }
    }
}

impl fmt::Display for ChantMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.roman())
    }
}
