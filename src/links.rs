//! Deep links into the score image service and third-party GABC editors.
//! These are plain string templates; whether the target service accepts the
//! payload is its own business.

/// Pre-rendered score image for a chant id.
pub fn score_image_url(chant_id: i64) -> String {
    format!("https://gregobase.selapa.net/chant_img.php?id={chant_id}")
}

/// The chant's page on GregoBase.
pub fn gregobase_page_url(chant_id: i64) -> String {
    format!("https://gregobase.selapa.net/chant.php?id={chant_id}")
}

/// Third-party editors that accept GABC in their URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Editor {
    Neumz,
    SourceAndSummit,
    Illuminare,
    Benedictus,
}

impl Editor {
    pub const ALL: [Editor; 4] = [
        Editor::Neumz,
        Editor::SourceAndSummit,
        Editor::Illuminare,
        Editor::Benedictus,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Editor::Neumz => "Neumz",
            Editor::SourceAndSummit => "Source & Summit",
            Editor::Illuminare => "Illuminare",
            Editor::Benedictus => "Benedictus",
        }
    }

    /// Build the deep link carrying `encoded` (already URL-encoded GABC).
    fn url(&self, encoded: &str) -> String {
        match self {
            Editor::Neumz => format!("https://scrib.io/#q={encoded}"),
            Editor::SourceAndSummit => format!(
                "https://editor.sourceandsummit.com/alpha/#annotation%3A%20%0A%25%25%0A{encoded}"
            ),
            Editor::Illuminare => format!(
                "https://editor.sourceandsummit.com/legacy/#annotation%3A%20%0A%25%25%0A{encoded}"
            ),
            Editor::Benedictus => {
                format!("https://benedictus.liturgiacantada.com.br/#gabc=%0A%25%25%0A{encoded}")
            }
        }
    }
}

/// Characters `encodeURIComponent` leaves alone but `urlencoding` escapes.
const COMPONENT_SAFE: [(&str, &str); 5] = [
    ("%21", "!"),
    ("%27", "'"),
    ("%28", "("),
    ("%29", ")"),
    ("%2A", "*"),
];

/// Percent-encode a URL component the way browsers do, so the editor links
/// match the ones the web catalog produces.
pub fn encode_component(text: &str) -> String {
    COMPONENT_SAFE
        .iter()
        .fold(urlencoding::encode(text).into_owned(), |encoded, (escaped, raw)| {
            encoded.replace(escaped, raw)
        })
}

/// A named destination the user can open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalLink {
    pub label: String,
    pub url: String,
}

/// Every outbound link for one chant, rebuilt whenever the processed GABC
/// changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorLinks {
    pub gregobase: ExternalLink,
    /// Empty when the chant has no GABC source.
    pub editors: Vec<ExternalLink>,
}

impl EditorLinks {
    pub fn build(chant_id: i64, processed: &str) -> Self {
        let gregobase = ExternalLink {
            label: "GregoBase".to_string(),
            url: gregobase_page_url(chant_id),
        };

        let editors = if processed.is_empty() {
            Vec::new()
        } else {
            let encoded = encode_component(processed);
            Editor::ALL
                .iter()
                .map(|editor| ExternalLink {
                    label: editor.name().to_string(),
                    url: editor.url(&encoded),
                })
                .collect()
        };

        Self { gregobase, editors }
    }

    /// GregoBase first, then the editors.
    pub fn all(&self) -> Vec<&ExternalLink> {
        std::iter::once(&self.gregobase)
            .chain(self.editors.iter())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_gabc_into_each_editor() {
        let links = EditorLinks::build(1234, "(c4) A(f) (::)");
        assert_eq!(
            links.gregobase.url,
            "https://gregobase.selapa.net/chant.php?id=1234"
        );
        assert_eq!(links.editors.len(), 4);
        assert_eq!(
            links.editors[0].url,
            "https://scrib.io/#q=(c4)%20A(f)%20(%3A%3A)"
        );
        assert!(links.editors[1]
            .url
            .starts_with("https://editor.sourceandsummit.com/alpha/#annotation%3A%20%0A%25%25%0A(c4)"));
        assert!(links.editors[2].url.contains("/legacy/#annotation"));
        assert!(links.editors[3]
            .url
            .starts_with("https://benedictus.liturgiacantada.com.br/#gabc=%0A%25%25%0A"));
    }

    #[test]
    fn component_encoding_keeps_browser_safe_marks() {
        assert_eq!(encode_component("a(b)!*'c"), "a(b)!*'c");
        assert_eq!(encode_component("%28 ;"), "%2528%20%3B");
        assert_eq!(encode_component("é\n"), "%C3%A9%0A");
    }

    #[test]
    fn editors_are_omitted_without_source() {
        let links = EditorLinks::build(5, "");
        assert!(links.editors.is_empty());
        assert_eq!(links.all().len(), 1);
    }

    #[test]
    fn image_url_uses_the_id() {
        assert_eq!(
            score_image_url(42),
            "https://gregobase.selapa.net/chant_img.php?id=42"
        );
    }
}
