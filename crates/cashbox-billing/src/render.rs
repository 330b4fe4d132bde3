//! Template and PDF rendering for invoices.

use std::path::Path;
use std::sync::{Arc, LazyLock};

use printpdf::{BuiltinFont, Mm, PdfDocument};
use regex::Regex;
use serde_json::Value;
use tera::{Context, Tera};
use thiserror::Error;
use tracing::debug;

/// Name of the receipt template shipped with the crate.
pub const DEFAULT_TEMPLATE: &str = "receipt.html";

const RECEIPT_TEMPLATE: &str = include_str!("../templates/receipt.html");

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Template not found: {0}")]
    TemplateNotFound(String),
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),
    #[error("PDF error: {0}")]
    Pdf(String),
}

/// Renders a named template against a JSON context.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &str, context: &Value) -> Result<String, RenderError>;
}

/// Turns rendered HTML into a PDF document.
pub trait PdfRenderer: Send + Sync {
    fn render_pdf(&self, title: &str, html: &str) -> Result<Vec<u8>, RenderError>;
}

/// Tera-backed templates with the built-in receipt preloaded.
pub struct TeraRenderer {
    tera: Tera,
}

impl TeraRenderer {
    pub fn new() -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_template(DEFAULT_TEMPLATE, RECEIPT_TEMPLATE)?;
        Ok(Self { tera })
    }

    /// Also load every `*.html` template under `dir`. A template named
    /// `receipt.html` there replaces the built-in one.
    pub fn with_template_dir(mut self, dir: &Path) -> Result<Self, RenderError> {
        let glob = format!("{}/**/*.html", dir.display());
        let extra = Tera::new(&glob)?;
        debug!(dir = %dir.display(), count = extra.get_template_names().count(), "Loaded invoice templates");
        self.tera.extend(&extra)?;
        // `extend` keeps existing names, so overrides are added explicitly.
        if extra.get_template_names().any(|n| n == DEFAULT_TEMPLATE) {
            let source = std::fs::read_to_string(dir.join(DEFAULT_TEMPLATE))
                .map_err(|e| RenderError::TemplateNotFound(e.to_string()))?;
            self.tera.add_raw_template(DEFAULT_TEMPLATE, &source)?;
        }
        Ok(self)
    }

    pub fn add_template(&mut self, name: &str, source: &str) -> Result<(), RenderError> {
        self.tera.add_raw_template(name, source)?;
        Ok(())
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }
}

impl TemplateRenderer for TeraRenderer {
    fn render(&self, template: &str, context: &Value) -> Result<String, RenderError> {
        if !self.has_template(template) {
            return Err(RenderError::TemplateNotFound(template.to_string()));
        }
        let context = Context::from_value(context.clone())?;
        Ok(self.tera.render(template, &context)?)
    }
}

static STRIP_BLOCKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(style|script|head)(\s[^>]*)?>.*?</(style|script|head)>").expect("valid regex")
});
static LINE_BREAKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(p|div|tr|h[1-6]|li|table|thead|tbody)>").expect("valid regex")
});
static CELL_BREAKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</t[dh]>").expect("valid regex"));
static TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").expect("valid regex"));

/// Reduce HTML to the lines of text a reader would see.
pub fn html_to_lines(html: &str) -> Vec<String> {
    let text = STRIP_BLOCKS.replace_all(html, "");
    let text = LINE_BREAKS.replace_all(&text, "\n");
    let text = CELL_BREAKS.replace_all(&text, "   ");
    let text = TAGS.replace_all(&text, "");
    let text = decode_entities(&text);

    text.lines()
        .map(|line| SPACES.replace_all(line.trim(), " ").into_owned())
        .filter(|line| !line.is_empty())
        .collect()
}

fn decode_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).replace('\u{a0}', " ")
}

/// Lays out the text content of the HTML on A4 pages in Helvetica.
#[derive(Debug, Clone)]
pub struct TextPdfRenderer {
    pub font_size: f32,
    pub margin_mm: f32,
    pub line_height_mm: f32,
    pub wrap_at: usize,
}

impl Default for TextPdfRenderer {
    fn default() -> Self {
        Self {
            font_size: 11.0,
            margin_mm: 20.0,
            line_height_mm: 6.0,
            wrap_at: 90,
        }
    }
}

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;

impl PdfRenderer for TextPdfRenderer {
    fn render_pdf(&self, title: &str, html: &str) -> Result<Vec<u8>, RenderError> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;

        let top = PAGE_HEIGHT_MM - self.margin_mm;
        let mut current = doc.get_page(page).get_layer(layer);
        let mut y = top;

        let lines = html_to_lines(html);
        for line in lines.iter().flat_map(|line| wrap(line, self.wrap_at)) {
            if y < self.margin_mm {
                let (page, layer) =
                    doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
                current = doc.get_page(page).get_layer(layer);
                y = top;
            }
            current.use_text(line, self.font_size, Mm(self.margin_mm), Mm(y), &font);
            y -= self.line_height_mm;
        }

        doc.save_to_bytes().map_err(|e| RenderError::Pdf(e.to_string()))
    }
}

fn wrap(line: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            out.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// The template and PDF engines an invoice renders through.
#[derive(Clone)]
pub struct InvoiceRenderer {
    pub templates: Arc<dyn TemplateRenderer>,
    pub pdf: Arc<dyn PdfRenderer>,
}

impl InvoiceRenderer {
    pub fn new(templates: Arc<dyn TemplateRenderer>, pdf: Arc<dyn PdfRenderer>) -> Self {
        Self { templates, pdf }
    }

    /// Built-in receipt template and the text PDF layout.
    pub fn builtin() -> Result<Self, RenderError> {
        Ok(Self::new(
            Arc::new(TeraRenderer::new()?),
            Arc::new(TextPdfRenderer::default()),
        ))
    }
}
