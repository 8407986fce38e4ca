//! Declarative field rules and the extractor that applies them.
//!
//! Each field owns an ordered list of [`Rule`]s. The first rule producing a
//! non-empty value wins; when none does the field is `None`. Missing
//! markup is normal and never an error. Only a selector that fails to
//! compile is.

use crate::error::ExtractionError;
use crate::model::{AlbumRecord, Field};
use scraper::{ElementRef, Selector};

/// Separator between release date and record type in the type line.
pub const TYPE_SEPARATOR: char = '•';

/// One way of pulling a value out of a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Whitespace-collapsed text of the first element matching the selector.
    Text(&'static str),
    /// First non-empty attribute, in `attrs` order, of the first match.
    Attr {
        selector: &'static str,
        attrs: &'static [&'static str],
    },
    /// Attribute of the nearest ancestor of the first match that itself
    /// matches `ancestor`.
    AncestorAttr {
        selector: &'static str,
        ancestor: &'static str,
        attr: &'static str,
    },
}

impl Rule {
    /// Apply this rule to `fragment` on behalf of `field`.
    pub fn apply(
        &self,
        field: Field,
        fragment: ElementRef<'_>,
    ) -> Result<Option<String>, ExtractionError> {
        match *self {
            Rule::Text(selector) => {
                let sel = compile(field, selector)?;
                Ok(fragment
                    .select(&sel)
                    .next()
                    .and_then(|el| non_empty(&visible_text(el))))
            }
            Rule::Attr { selector, attrs } => {
                let sel = compile(field, selector)?;
                Ok(fragment.select(&sel).next().and_then(|el| {
                    attrs
                        .iter()
                        .find_map(|name| el.value().attr(name).and_then(non_empty))
                }))
            }
            Rule::AncestorAttr {
                selector,
                ancestor,
                attr,
            } => {
                let sel = compile(field, selector)?;
                let anc = compile(field, ancestor)?;
                Ok(fragment.select(&sel).next().and_then(|el| {
                    el.ancestors()
                        .filter_map(ElementRef::wrap)
                        .find(|a| anc.matches(a))
                        .and_then(|a| a.value().attr(attr))
                        .and_then(non_empty)
                }))
            }
        }
    }
}

/// Apply `rules` in order and return the first value found.
pub fn first_match(
    field: Field,
    rules: &[Rule],
    fragment: ElementRef<'_>,
) -> Result<Option<String>, ExtractionError> {
    for rule in rules {
        if let Some(value) = rule.apply(field, fragment)? {
            return Ok(Some(value));
        }
    }
    Ok(None)
}

/// Marker selectors and per-field rules for one site layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleSet {
    /// One match per listing fragment.
    pub block: &'static str,
    /// Present when the page links to further results.
    pub more_results: &'static str,
    pub artist_name: &'static [Rule],
    pub album_name: &'static [Rule],
    /// Source of both `release_date` and `record_type`.
    pub type_line: &'static [Rule],
    pub image_url: &'static [Rule],
    pub album_url: &'static [Rule],
}

const ARTIST_NAME: &[Rule] = &[Rule::Text(".artistTitle")];

const ALBUM_NAME: &[Rule] = &[Rule::Text(".albumTitle")];

const TYPE_LINE: &[Rule] = &[Rule::Text(".type")];

// data-src first: src is often a lazy-load placeholder
const IMAGE_URL: &[Rule] = &[
    Rule::Attr {
        selector: ".image img",
        attrs: &["data-src", "src"],
    },
    Rule::Attr {
        selector: "img",
        attrs: &["data-src", "src"],
    },
];

const ALBUM_URL: &[Rule] = &[
    Rule::Attr {
        selector: ".albumTitle a",
        attrs: &["href"],
    },
    Rule::AncestorAttr {
        selector: ".albumTitle",
        ancestor: "a",
        attr: "href",
    },
];

impl Default for RuleSet {
    /// Album of the Year listing layout.
    fn default() -> Self {
        Self {
            block: ".albumBlock",
            more_results: ".largeButtonContainer .largeButton",
            artist_name: ARTIST_NAME,
            album_name: ALBUM_NAME,
            type_line: TYPE_LINE,
            image_url: IMAGE_URL,
            album_url: ALBUM_URL,
        }
    }
}

/// Turns one listing fragment into an [`AlbumRecord`].
#[derive(Debug, Clone, Default)]
pub struct FieldExtractor {
    rules: RuleSet,
}

impl FieldExtractor {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Extract every field of `fragment`. Read-only.
    pub fn extract(&self, fragment: ElementRef<'_>) -> Result<AlbumRecord, ExtractionError> {
        let (release_date, record_type) =
            match first_match(Field::RecordType, self.rules.type_line, fragment)? {
                Some(line) => split_type_line(&line),
                None => (None, None),
            };

        Ok(AlbumRecord {
            artist_name: first_match(Field::ArtistName, self.rules.artist_name, fragment)?,
            album_name: first_match(Field::AlbumName, self.rules.album_name, fragment)?,
            release_date,
            record_type,
            image_url: first_match(Field::ImageUrl, self.rules.image_url, fragment)?,
            album_url: first_match(Field::AlbumUrl, self.rules.album_url, fragment)?,
        })
    }
}

/// Split `"2024 • LP"` into `(Some("2024"), Some("LP"))`.
///
/// Without a separator the whole line is the record type. Segments after
/// the second are dropped.
pub fn split_type_line(line: &str) -> (Option<String>, Option<String>) {
    match line.split_once(TYPE_SEPARATOR) {
        Some((date, rest)) => {
            let kind = rest.split(TYPE_SEPARATOR).next().unwrap_or(rest);
            (non_empty(date), non_empty(kind))
        }
        None => (None, non_empty(line)),
    }
}

/// Text content with script/style bodies skipped and whitespace collapsed.
pub fn visible_text(el: ElementRef<'_>) -> String {
    let mut raw = String::new();
    for node in el.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|p| p.value().as_element().map(|e| e.name()))
            .is_some_and(|name| matches!(name, "script" | "style" | "noscript" | "template"));
        if !hidden {
            raw.push_str(text);
        }
    }
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn compile(field: Field, selector: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(selector).map_err(|e| ExtractionError::Selector {
        field,
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn extract(html: &str) -> AlbumRecord {
        let doc = Html::parse_fragment(html);
        let sel = Selector::parse(".albumBlock").unwrap();
        let block = doc.select(&sel).next().expect("fixture has a block");
        FieldExtractor::default().extract(block).unwrap()
    }

    fn type_fields(line: &str) -> (Option<String>, Option<String>) {
        split_type_line(line)
    }

    #[test]
    fn test_reference_fragment() {
        let record = extract(
            r#"<div class="albumBlock"><div class="artistTitle">Foo</div><div class="albumTitle"><a href="/x">Bar</a></div><div class="type">2024 • LP</div></div>"#,
        );
        assert_eq!(
            record,
            AlbumRecord {
                artist_name: Some("Foo".into()),
                album_name: Some("Bar".into()),
                release_date: Some("2024".into()),
                record_type: Some("LP".into()),
                image_url: None,
                album_url: Some("/x".into()),
            }
        );
    }

    #[test]
    fn test_type_line_single_separator() {
        assert_eq!(
            type_fields("Mar 3, 2023 • EP"),
            (Some("Mar 3, 2023".into()), Some("EP".into()))
        );
    }

    #[test]
    fn test_type_line_without_separator_is_type_only() {
        assert_eq!(type_fields("Mixtape"), (None, Some("Mixtape".into())));
    }

    #[test]
    fn test_type_line_extra_segments_dropped() {
        assert_eq!(
            type_fields("2020 • LP • Deluxe"),
            (Some("2020".into()), Some("LP".into()))
        );
    }

    #[test]
    fn test_type_line_empty_halves_are_null() {
        assert_eq!(type_fields("• LP"), (None, Some("LP".into())));
        assert_eq!(type_fields("2021 •"), (Some("2021".into()), None));
    }

    #[test]
    fn test_type_text_spread_over_elements() {
        let record = extract(
            r#"<div class="albumBlock"><div class="albumTitle">X</div>
               <div class="type">
                 2019 •
                 <span>Single</span>
               </div></div>"#,
        );
        assert_eq!(record.release_date.as_deref(), Some("2019"));
        assert_eq!(record.record_type.as_deref(), Some("Single"));
    }

    #[test]
    fn test_image_prefers_lazy_attribute() {
        let record = extract(
            r#"<div class="albumBlock"><div class="image"><img src="/placeholder.gif" data-src="/cover.jpg"></div><div class="artistTitle">A</div></div>"#,
        );
        assert_eq!(record.image_url.as_deref(), Some("/cover.jpg"));
    }

    #[test]
    fn test_image_falls_back_to_src_then_any_img() {
        let with_src = extract(
            r#"<div class="albumBlock"><div class="image"><img src="/cover.jpg"></div><div class="artistTitle">A</div></div>"#,
        );
        assert_eq!(with_src.image_url.as_deref(), Some("/cover.jpg"));

        let loose = extract(
            r#"<div class="albumBlock"><img data-src="/loose.jpg"><div class="artistTitle">A</div></div>"#,
        );
        assert_eq!(loose.image_url.as_deref(), Some("/loose.jpg"));
    }

    #[test]
    fn test_album_url_from_enclosing_anchor() {
        let record = extract(
            r#"<div class="albumBlock"><a href="/album/1-bar.php"><div class="albumTitle">Bar</div></a></div>"#,
        );
        assert_eq!(record.album_name.as_deref(), Some("Bar"));
        assert_eq!(record.album_url.as_deref(), Some("/album/1-bar.php"));
    }

    #[test]
    fn test_missing_fields_are_null() {
        let record = extract(r#"<div class="albumBlock"><div class="artistTitle">  Only Artist </div></div>"#);
        assert_eq!(record.artist_name.as_deref(), Some("Only Artist"));
        assert_eq!(record.album_name, None);
        assert_eq!(record.release_date, None);
        assert_eq!(record.record_type, None);
        assert_eq!(record.image_url, None);
        assert_eq!(record.album_url, None);
    }

    #[test]
    fn test_blank_text_is_null() {
        let record = extract(r#"<div class="albumBlock"><div class="artistTitle">   </div><div class="albumTitle"></div></div>"#);
        assert!(!record.is_identifiable());
    }

    #[test]
    fn test_visible_text_skips_scripts() {
        let record = extract(
            r#"<div class="albumBlock"><div class="artistTitle">Foo<script>var x = 1;</script></div></div>"#,
        );
        assert_eq!(record.artist_name.as_deref(), Some("Foo"));
    }

    #[test]
    fn test_bad_selector_is_extraction_error() {
        const BROKEN: &[Rule] = &[Rule::Text("[[")];
        let extractor = FieldExtractor::new(RuleSet {
            artist_name: BROKEN,
            ..RuleSet::default()
        });
        let doc = Html::parse_fragment(r#"<div class="albumBlock"><div class="artistTitle">Foo</div></div>"#);
        let sel = Selector::parse(".albumBlock").unwrap();
        let block = doc.select(&sel).next().unwrap();

        let err = extractor.extract(block).unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::Selector { field: Field::ArtistName, .. }
        ));
    }

    #[test]
    fn test_later_rule_used_when_earlier_finds_nothing() {
        const RULES: &[Rule] = &[Rule::Text(".missing"), Rule::Text(".artistTitle")];
        let doc = Html::parse_fragment(r#"<div class="albumBlock"><div class="artistTitle">Foo</div></div>"#);
        let sel = Selector::parse(".albumBlock").unwrap();
        let block = doc.select(&sel).next().unwrap();
        assert_eq!(
            first_match(Field::ArtistName, RULES, block).unwrap().as_deref(),
            Some("Foo")
        );
    }
}
