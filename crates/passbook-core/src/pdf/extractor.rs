//! PDF statements via lopdf and pdf-extract.

use image::{DynamicImage, ImageBuffer, Rgba};
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, trace, warn};

use super::{Result, StatementDocument};
use crate::error::PdfError;

/// A loaded PDF statement.
///
/// Page texts are read once at load time; the lopdf handle is kept for page
/// rendering and dropped with the value.
pub struct PdfDocument {
    document: Document,
    /// Plain bytes, decrypted when the source was encrypted.
    raw_data: Vec<u8>,
    page_texts: Vec<String>,
}

impl PdfDocument {
    /// Parse a PDF, decrypting it with `password` (then the empty password)
    /// when it is encrypted.
    pub fn load(data: &[u8], password: Option<&str>) -> Result<Self> {
        let mut document = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        let raw_data = if document.is_encrypted() {
            let mut candidates: Vec<&str> = password.into_iter().collect();
            candidates.push("");

            let opened = candidates
                .iter()
                .any(|candidate| document.decrypt(*candidate).is_ok());
            if !opened {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF");

            let mut decrypted = Vec::new();
            document
                .save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            data.to_vec()
        };

        let pages = document.get_pages();
        if pages.is_empty() {
            return Err(PdfError::NoPages);
        }

        // pdf-extract lays text out by position; lopdf's own extractor breaks
        // a line at every text object, which splits table rows cell by cell.
        let page_texts = match pdf_extract::extract_text_from_mem_by_pages(&raw_data) {
            Ok(texts) if texts.len() == pages.len() => texts,
            Ok(texts) => {
                warn!(
                    "pdf-extract returned {} pages for a {}-page document, using lopdf text",
                    texts.len(),
                    pages.len()
                );
                lopdf_page_texts(&document)
            }
            Err(e) => {
                warn!("pdf-extract failed, using lopdf text: {}", e);
                lopdf_page_texts(&document)
            }
        };

        debug!("Loaded PDF with {} pages", pages.len());
        Ok(Self {
            document,
            raw_data,
            page_texts,
        })
    }

    /// Largest raster image painted on a page.
    fn largest_page_image(&self, page: u32) -> Result<Option<DynamicImage>> {
        let pages = self.document.get_pages();
        let page_id = pages.get(&page).ok_or(PdfError::InvalidPage(page))?;

        let mut best: Option<DynamicImage> = None;
        if let Some(resources) = self.page_resources(*page_id) {
            if let Ok(xobjects) = resources.get(b"XObject") {
                if let Ok((_, Object::Dictionary(xobj_dict))) = self.document.dereference(xobjects) {
                    for (_name, obj_ref) in xobj_dict.iter() {
                        let Ok((_, obj)) = self.document.dereference(obj_ref) else {
                            continue;
                        };
                        if let Some(img) = self.decode_image(obj) {
                            let area = |i: &DynamicImage| u64::from(i.width()) * u64::from(i.height());
                            if best.as_ref().is_none_or(|b| area(&img) > area(b)) {
                                best = Some(img);
                            }
                        }
                    }
                }
            }
        }
        Ok(best)
    }

    /// Every image object in the file, in object order.
    fn all_images(&self) -> Vec<DynamicImage> {
        let images: Vec<DynamicImage> = self
            .document
            .objects
            .values()
            .filter_map(|object| self.decode_image(object))
            .collect();
        debug!("Found {} images in document", images.len());
        images
    }

    fn decode_image(&self, obj: &Object) -> Option<DynamicImage> {
        let Object::Stream(stream) = obj else {
            return None;
        };
        let dict = &stream.dict;

        if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
            return None;
        }

        let width = u32::try_from(dict.get(b"Width").ok()?.as_i64().ok()?).ok()?;
        let height = u32::try_from(dict.get(b"Height").ok()?.as_i64().ok()?).ok()?;
        trace!("Found image object: {}x{}", width, height);

        if let Ok(filter) = dict.get(b"Filter") {
            let filter_name = match filter {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                _ => None,
            };

            match filter_name {
                Some(b"DCTDecode") => {
                    return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg).ok();
                }
                Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                    trace!("Skipping image with unsupported filter");
                    return None;
                }
                _ => {}
            }
        }

        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        let color_space = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|o| match o {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                Object::Reference(r) => self.document.get_object(*r).ok().and_then(|o| o.as_name().ok()),
                _ => None,
            })
            .unwrap_or(b"DeviceRGB");

        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8);

        raw_to_image(&data, width, height, color_space, bits)
    }

    /// Resources of a page, following inheritance through the page tree.
    fn page_resources(&self, node_id: ObjectId) -> Option<lopdf::Dictionary> {
        let Object::Dictionary(dict) = self.document.get_object(node_id).ok()? else {
            return None;
        };

        if let Ok(resources) = dict.get(b"Resources") {
            if let Ok((_, Object::Dictionary(res_dict))) = self.document.dereference(resources) {
                return Some(res_dict.clone());
            }
        }

        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => self.page_resources(*parent_id),
            _ => None,
        }
    }
}

fn lopdf_page_texts(document: &Document) -> Vec<String> {
    document
        .get_pages()
        .keys()
        .map(|number| document.extract_text(&[*number]).unwrap_or_default())
        .collect()
}

/// Build an image from uncompressed 8-bit RGB or gray samples.
fn raw_to_image(data: &[u8], width: u32, height: u32, color_space: &[u8], bits: i64) -> Option<DynamicImage> {
    if bits != 8 {
        trace!("Unsupported bits per component: {}", bits);
        return None;
    }

    let pixels = (width as usize) * (height as usize);
    let channels = match color_space {
        b"DeviceRGB" | b"RGB" => 3,
        b"DeviceGray" | b"G" => 1,
        _ => return None,
    };
    if data.len() < pixels * channels {
        trace!("Image data too short: {} < {}", data.len(), pixels * channels);
        return None;
    }

    let rgba: Vec<u8> = data[..pixels * channels]
        .chunks(channels)
        .flat_map(|px| match px {
            [r, g, b] => [*r, *g, *b, 255],
            [gray] => [*gray, *gray, *gray, 255],
            _ => [0, 0, 0, 255],
        })
        .collect();

    ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, rgba).map(DynamicImage::ImageRgba8)
}

impl StatementDocument for PdfDocument {
    fn page_count(&self) -> u32 {
        self.page_texts.len() as u32
    }

    fn page_text(&self, page: u32) -> Result<String> {
        let index = (page as usize)
            .checked_sub(1)
            .filter(|i| *i < self.page_texts.len())
            .ok_or(PdfError::InvalidPage(page))?;
        Ok(self.page_texts[index].clone())
    }

    fn document_text(&self) -> Result<String> {
        pdf_extract::extract_text_from_mem(&self.raw_data).map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    fn render_page(&self, page: u32, _dpi: u32) -> Result<DynamicImage> {
        if let Some(image) = self.largest_page_image(page)? {
            return Ok(image);
        }

        // Some scanners share one image dictionary across pages.
        let index = (page as usize).saturating_sub(1);
        self.all_images()
            .into_iter()
            .nth(index)
            .ok_or_else(|| PdfError::ImageExtraction(format!("no image found for page {}", page)))
    }
}
