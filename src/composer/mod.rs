//! Directory HTML composition with Handlebars templates
//!
//! Turns an ordered list of households into one self-contained HTML document
//! ready for print-quality rendering. Two households go on each A4 page, in
//! input order; callers sort and filter before composing.
//!
//! Composition is pure: the same households, language and options always
//! produce byte-identical output. Anything date dependent (member ages) is
//! computed against [`ComposeOptions::reference_date`] rather than the clock.
//!
//! # Example
//!
//! ```rust,ignore
//! use kudumbam::composer::{DirectoryComposer, ComposeOptions};
//! use kudumbam::models::Language;
//!
//! let composer = DirectoryComposer::new()?;
//! let html = composer.compose(&households, Language::Both, &ComposeOptions::today())?;
//! ```

pub mod bilingual;
pub mod script;

use chrono::NaiveDate;
use handlebars::Handlebars;
use serde::Serialize;
use thiserror::Error;

use crate::i18n::t;
use crate::models::{sort_members, Household, Language};

use script::{smart_format_mixed, wrap_malayalam};

/// Document shell template
const DIRECTORY_TEMPLATE: &str = include_str!("../../templates/directory.hbs");

/// Household card partial
const CARD_TEMPLATE: &str = include_str!("../../templates/household_card.hbs");

/// Inline stylesheet
const STYLESHEET: &str = include_str!("../../templates/directory.css");

/// Households rendered on each page
pub const HOUSEHOLDS_PER_PAGE: usize = 2;

/// Errors raised while composing the directory document
#[derive(Error, Debug)]
pub enum ComposeError {
    /// Template failed to parse
    #[error("template parse error: {0}")]
    Template(#[from] Box<handlebars::TemplateError>),

    /// Template failed to render
    #[error("template rendering failed: {0}")]
    Render(#[from] handlebars::RenderError),
}

impl From<handlebars::TemplateError> for ComposeError {
    fn from(e: handlebars::TemplateError) -> Self {
        ComposeError::Template(Box::new(e))
    }
}

/// Inputs that are not part of the household data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComposeOptions {
    /// Date used to derive ages from dates of birth
    pub reference_date: NaiveDate,
}

impl ComposeOptions {
    pub fn new(reference_date: NaiveDate) -> Self {
        Self { reference_date }
    }

    /// Options anchored at the local current date
    pub fn today() -> Self {
        Self::new(chrono::Local::now().date_naive())
    }
}

/// Number of pages needed for `households` households
pub fn page_count(households: usize) -> usize {
    households.div_ceil(HOUSEHOLDS_PER_PAGE)
}

/// Download filename for an export made on `date`
///
/// Format: `family-directory-{language}-{YYYY-MM-DD}.pdf`
pub fn directory_filename(language: Language, date: NaiveDate) -> String {
    format!(
        "family-directory-{}-{}.pdf",
        language.as_str(),
        date.format("%Y-%m-%d")
    )
}

// ============================================================================
// Template Data
// ============================================================================

#[derive(Debug, Serialize)]
struct DocumentData {
    lang: &'static str,
    title_text: String,
    stylesheet: &'static str,
    pages: Vec<PageData>,
}

#[derive(Debug, Serialize)]
struct PageData {
    title_html: String,
    cards: Vec<CardData>,
    footer: String,
    page_break: bool,
}

#[derive(Debug, Serialize)]
struct CardData {
    house_number: String,
    address: String,
    phone: String,
    photo_url: Option<String>,
    photo_label: String,
    headers: Vec<HeaderData>,
    rows: Vec<RowData>,
    empty_message: String,
}

#[derive(Debug, Serialize)]
struct HeaderData {
    class: &'static str,
    label: String,
}

#[derive(Debug, Serialize)]
struct RowData {
    row_class: String,
    name: String,
    relationship: String,
    occupation: String,
    age: Option<u32>,
}

/// Localized labels shared by every card in one document
struct Labels {
    title_text: String,
    title_html: String,
    headers: Vec<(&'static str, String)>,
    empty_message: String,
    photo_label: String,
}

impl Labels {
    fn for_language(language: Language) -> Self {
        let title_en = t!("directory.title", locale = "en").to_string();
        let title_ml = t!("directory.title", locale = "ml").to_string();

        let (title_text, title_html) = match language {
            Language::English => (title_en.clone(), title_en),
            Language::Malayalam => (title_ml.clone(), wrap_malayalam(&title_ml)),
            Language::Both => (
                format!("{title_en} | {title_ml}"),
                format!("{title_en} | {}", wrap_malayalam(&title_ml)),
            ),
        };

        let locale = language.label_locale();
        let label = |text: &str| -> String {
            match language {
                Language::Malayalam => wrap_malayalam(text),
                _ => html_escape::encode_text(text).into_owned(),
            }
        };

        Self {
            title_text,
            title_html,
            headers: vec![
                ("name-header", label(&t!("directory.header.name", locale = locale))),
                ("relationship-header", label(&t!("directory.header.relationship", locale = locale))),
                ("occupation-header", label(&t!("directory.header.occupation", locale = locale))),
                ("age-header", label(&t!("directory.header.age", locale = locale))),
            ],
            empty_message: label(&t!("directory.no_members", locale = locale)),
            photo_label: t!("directory.photo_placeholder", locale = "en").to_string(),
        }
    }
}

// ============================================================================
// Composer
// ============================================================================

/// Directory composer with Handlebars template engine
pub struct DirectoryComposer {
    handlebars: Handlebars<'static>,
}

impl DirectoryComposer {
    /// Create a composer with the built-in templates
    pub fn new() -> Result<Self, ComposeError> {
        let mut handlebars = Handlebars::new();
        handlebars.register_template_string("directory", DIRECTORY_TEMPLATE)?;
        handlebars.register_partial("household_card", CARD_TEMPLATE)?;

        Ok(Self { handlebars })
    }

    /// Compose the directory document
    ///
    /// # Arguments
    /// * `households` - Households in page order, each with its members
    /// * `language` - Which bilingual fields to show
    /// * `options` - Reference date for derived ages
    pub fn compose(
        &self,
        households: &[Household],
        language: Language,
        options: &ComposeOptions,
    ) -> Result<String, ComposeError> {
        let labels = Labels::for_language(language);
        let total = page_count(households.len());

        let pages = households
            .chunks(HOUSEHOLDS_PER_PAGE)
            .enumerate()
            .map(|(index, pair)| PageData {
                title_html: labels.title_html.clone(),
                cards: pair
                    .iter()
                    .map(|h| card(h, language, &labels, options))
                    .collect(),
                footer: t!(
                    "directory.page_footer",
                    locale = "en",
                    current = index + 1,
                    total = total
                )
                .to_string(),
                page_break: index + 1 < total,
            })
            .collect();

        let data = DocumentData {
            lang: language.label_locale(),
            title_text: labels.title_text.clone(),
            stylesheet: STYLESHEET,
            pages,
        };

        let html = self.handlebars.render("directory", &data)?;

        tracing::debug!(
            households = households.len(),
            pages = total,
            language = %language,
            bytes = html.len(),
            "Composed directory document"
        );
        Ok(html)
    }
}

/// Compose with a freshly built composer
pub fn compose_directory(
    households: &[Household],
    language: Language,
    options: &ComposeOptions,
) -> Result<String, ComposeError> {
    DirectoryComposer::new()?.compose(households, language, options)
}

fn card(
    household: &Household,
    language: Language,
    labels: &Labels,
    options: &ComposeOptions,
) -> CardData {
    let mut members = household.members.clone();
    sort_members(&mut members);

    let rows = members
        .iter()
        .enumerate()
        .map(|(index, member)| {
            let mut row_class = if index % 2 == 0 {
                "table-row".to_string()
            } else {
                "table-row-alt".to_string()
            };
            if member.is_head {
                row_class.push_str(" head-row");
            }

            RowData {
                row_class,
                name: bilingual::cell(language, &member.name_en, &member.name_ml),
                relationship: bilingual::cell(
                    language,
                    &member.relationship_en,
                    &member.relationship_ml,
                ),
                occupation: bilingual::cell(
                    language,
                    &member.occupation_en,
                    &member.occupation_ml,
                ),
                age: member.display_age(options.reference_date),
            }
        })
        .collect();

    CardData {
        house_number: smart_format_mixed(&household.house_number),
        address: bilingual::address(language, &household.address_en, &household.address_ml),
        phone: household.phone.trim().to_string(),
        photo_url: household.photo_url.as_deref().and_then(photo_source),
        photo_label: labels.photo_label.clone(),
        headers: labels
            .headers
            .iter()
            .map(|(class, label)| HeaderData {
                class: *class,
                label: label.clone(),
            })
            .collect(),
        rows,
        empty_message: labels.empty_message.clone(),
    }
}

/// Accept only absolute http(s) photo references
fn photo_source(raw: &str) -> Option<String> {
    match url::Url::parse(raw.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url.to_string()),
        _ => {
            tracing::debug!(photo_url = %raw, "Ignoring unusable photo reference");
            None
        }
    }
}
