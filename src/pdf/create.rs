//! Booklet PDF creation using lopdf
//!
//! [`BookletDocument`] is a thin page builder: it keeps one open page at a
//! time, collects content-stream operators and image XObjects for it, and
//! writes the page tree on save. Text uses the standard Helvetica fonts, so no
//! font data is embedded.

use std::path::Path;

use image::{imageops::FilterType, DynamicImage, GenericImageView, Rgb, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::{Error, Result};
use crate::layout::{PageDimensions, Rect};

/// Standard fonts available on every page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource_name(&self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

/// How image pixels are embedded
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Fidelity {
    /// Embed the decoded pixels as they are
    #[default]
    Direct,
    /// Downsample with Lanczos3 to this many pixels per inch of drawn size; never upsample
    Resampled { dpi: u32 },
}

/// Content of the page currently being built
#[derive(Debug, Default)]
struct OpenPage {
    content: String,
    xobjects: Dictionary,
    image_count: usize,
}

/// A PDF being assembled page by page
pub struct BookletDocument {
    doc: Document,
    pages_id: ObjectId,
    regular_font: ObjectId,
    bold_font: ObjectId,
    page: PageDimensions,
    fidelity: Fidelity,
    page_ids: Vec<ObjectId>,
    open: Option<OpenPage>,
}

impl BookletDocument {
    pub fn new(page: PageDimensions, fidelity: Fidelity) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let regular_font = add_standard_font(&mut doc, "Helvetica");
        let bold_font = add_standard_font(&mut doc, "Helvetica-Bold");

        Self {
            doc,
            pages_id,
            regular_font,
            bold_font,
            page,
            fidelity,
            page_ids: Vec::new(),
            open: None,
        }
    }

    pub fn page_dimensions(&self) -> PageDimensions {
        self.page
    }

    /// Number of pages, counting the open one
    pub fn page_count(&self) -> usize {
        self.page_ids.len() + usize::from(self.open.is_some())
    }

    pub fn has_open_page(&self) -> bool {
        self.open.is_some()
    }

    /// Finish the open page (if any) and start a blank one
    pub fn start_page(&mut self) {
        self.finish_page();
        self.open = Some(OpenPage::default());
    }

    /// Write the open page into the document
    pub fn finish_page(&mut self) {
        let Some(open) = self.open.take() else {
            return;
        };

        let content_id = self.doc.add_object(Stream::new(Dictionary::new(), open.content.into_bytes()));

        let mut fonts = Dictionary::new();
        fonts.set("F1", Object::Reference(self.regular_font));
        fonts.set("F2", Object::Reference(self.bold_font));

        let mut resources = Dictionary::new();
        resources.set("Font", Object::Dictionary(fonts));
        if open.image_count > 0 {
            resources.set("XObject", Object::Dictionary(open.xobjects));
        }

        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(self.pages_id));
        page.set("MediaBox", Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(self.page.width.pt() as f32),
            Object::Real(self.page.height.pt() as f32),
        ]));
        page.set("Contents", Object::Reference(content_id));
        page.set("Resources", Object::Dictionary(resources));

        let page_id = self.doc.add_object(Object::Dictionary(page));
        self.page_ids.push(page_id);
    }

    fn open_page(&mut self) -> Result<&mut OpenPage> {
        self.open
            .as_mut()
            .ok_or_else(|| Error::Render("no open page".to_string()))
    }

    /// Draw a single line of text with its baseline starting at `(x, y)`
    pub fn draw_text(&mut self, text: &str, font: Font, size: f32, x: f64, y: f64) -> Result<()> {
        let page = self.open_page()?;
        page.content.push_str("BT\n");
        page.content.push_str("0 g\n");
        page.content.push_str(&format!("/{} {} Tf\n", font.resource_name(), size));
        page.content.push_str(&format!("1 0 0 1 {:.2} {:.2} Tm\n", x, y));
        page.content.push_str(&format!("({}) Tj\n", escape_pdf_string(text)));
        page.content.push_str("ET\n");
        Ok(())
    }

    /// Draw text horizontally centered on the page
    pub fn draw_text_centered(&mut self, text: &str, font: Font, size: f32, y: f64) -> Result<()> {
        let x = (self.page.width.pt() - estimate_text_width(text, size)) / 2.0;
        self.draw_text(text, font, size, x.max(0.0), y)
    }

    /// Draw `image` scaled into `rect`
    pub fn draw_image(&mut self, image: &DynamicImage, rect: Rect) -> Result<()> {
        if image.width() == 0 || image.height() == 0 {
            return Err(Error::Render("image has no pixels".to_string()));
        }
        if !(rect.width > 0.0 && rect.height > 0.0) || !rect.x.is_finite() || !rect.y.is_finite() {
            return Err(Error::Render(format!("invalid target rectangle {:?}", rect)));
        }

        let pixels = prepare_pixels(image, rect, self.fidelity);
        let xobject_id = self.doc.add_object(image_xobject(&pixels)?);

        let page = self.open_page()?;
        page.image_count += 1;
        let name = format!("Im{}", page.image_count);
        page.xobjects.set(name.as_bytes().to_vec(), Object::Reference(xobject_id));
        page.content.push_str(&format!(
            "q\n{:.4} 0 0 {:.4} {:.4} {:.4} cm\n/{} Do\nQ\n",
            rect.width, rect.height, rect.x, rect.y, name
        ));
        Ok(())
    }

    /// Finish the open page, build the page tree and write the file
    ///
    /// Returns the number of pages written.
    pub fn save(mut self, path: &Path) -> Result<usize> {
        self.finish_page();

        let kids: Vec<Object> = self.page_ids.iter().map(|&id| Object::Reference(id)).collect();
        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Count", Object::Integer(self.page_ids.len() as i64));
        pages.set("Kids", Object::Array(kids));
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(self.pages_id));
        let catalog_id = self.doc.add_object(Object::Dictionary(catalog));
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        self.doc.compress();
        if let Err(e) = self.doc.save(path) {
            let _ = std::fs::remove_file(path);
            return Err(Error::Persistence {
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
        }

        Ok(self.page_ids.len())
    }
}

/// Register one of the 14 standard PDF fonts
fn add_standard_font(doc: &mut Document, base_font: &str) -> ObjectId {
    let mut font = Dictionary::new();
    font.set("Type", Object::Name(b"Font".to_vec()));
    font.set("Subtype", Object::Name(b"Type1".to_vec()));
    font.set("BaseFont", Object::Name(base_font.as_bytes().to_vec()));
    font.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
    doc.add_object(Object::Dictionary(font))
}

/// Flatten onto white and, for resampled fidelity, shrink to the target density
fn prepare_pixels(image: &DynamicImage, rect: Rect, fidelity: Fidelity) -> RgbImage {
    let (width, height) = image.dimensions();

    let resampled = match fidelity {
        Fidelity::Direct => None,
        Fidelity::Resampled { dpi } => {
            let target_w = (rect.width / 72.0 * dpi as f64).round().max(1.0) as u32;
            let target_h = (rect.height / 72.0 * dpi as f64).round().max(1.0) as u32;
            (target_w < width && target_h < height)
                .then(|| image.resize_exact(target_w, target_h, FilterType::Lanczos3))
        }
    };
    let image = resampled.as_ref().unwrap_or(image);

    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let blend = |c: u8| ((c as u16 * a as u16 + 255 * (255 - a as u16)) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

/// 8-bit RGB image XObject, Flate-compressed as soon as it is built
fn image_xobject(pixels: &RgbImage) -> Result<Stream> {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(pixels.width() as i64));
    dict.set("Height", Object::Integer(pixels.height() as i64));
    dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
    dict.set("BitsPerComponent", Object::Integer(8));

    let mut stream = Stream::new(dict, pixels.as_raw().clone());
    stream.compress()?;
    Ok(stream)
}

/// Escape a string for a PDF literal in WinAnsiEncoding
///
/// Latin-1 letters are written as octal escapes so the content stream stays
/// ASCII. Anything WinAnsi cannot show becomes `?`.
pub(crate) fn escape_pdf_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' | '(' | ')' => {
                out.push('\\');
                out.push(c);
            }
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            c if c.is_ascii() => out.push(c),
            '\u{a0}'..='\u{ff}' => out.push_str(&format!("\\{:03o}", c as u32)),
            _ => out.push('?'),
        }
    }
    out
}

/// Estimate text width for Helvetica (average glyph is about half an em)
pub(crate) fn estimate_text_width(text: &str, font_size: f32) -> f64 {
    text.chars().count() as f64 * font_size as f64 * 0.5
}
