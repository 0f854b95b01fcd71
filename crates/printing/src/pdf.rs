use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, ImageError, Rgb, RgbImage, RgbaImage};
use thiserror::Error;

/// JPEG quality used for the page image embedded in exported PDFs.
pub const PDF_IMAGE_QUALITY: u8 = 98;

const POINTS_PER_PIXEL: f32 = 72.0 / 96.0;

/// Errors raised while assembling a PDF document.
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("failed to encode page image: {0}")]
    Image(#[from] ImageError),
    #[error("object {0} was reserved but never written")]
    MissingObject(usize),
}

/// Wraps a captured page bitmap into a single-page PDF.
///
/// The media box is the nominal page size (`page_width_px` x `page_height_px`
/// at 96 DPI) with zero margin; the bitmap is stretched over the whole page,
/// so a 2x capture keeps its extra resolution.
pub fn encode_pdf_page(
    bitmap: &RgbaImage,
    page_width_px: u32,
    page_height_px: u32,
) -> Result<Vec<u8>, PdfError> {
    let (width, height) = bitmap.dimensions();
    let jpeg = encode_jpeg(bitmap)?;

    let media_width = fmt_float(page_width_px as f32 * POINTS_PER_PIXEL);
    let media_height = fmt_float(page_height_px as f32 * POINTS_PER_PIXEL);

    let mut builder = PdfBuilder::new();
    let catalog = builder.reserve();
    let pages = builder.reserve();
    let image = builder.add_stream(
        &format!(
            "/Type /XObject /Subtype /Image /Width {width} /Height {height} \
             /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /DCTDecode"
        ),
        &jpeg,
    );
    let content = format!("q\n{media_width} 0 0 {media_height} 0 0 cm\n/Im1 Do\nQ");
    let content = builder.add_stream("", content.as_bytes());
    let page = builder.add_object(format!(
        "<< /Type /Page /Parent {pages} 0 R /MediaBox [0 0 {media_width} {media_height}] \
         /Resources << /XObject << /Im1 {image} 0 R >> >> /Contents {content} 0 R >>"
    ));
    builder.set(pages, format!("<< /Type /Pages /Count 1 /Kids [{page} 0 R] >>"));
    builder.set(catalog, format!("<< /Type /Catalog /Pages {pages} 0 R >>"));

    builder.finish(catalog)
}

fn encode_jpeg(bitmap: &RgbaImage) -> Result<Vec<u8>, ImageError> {
    let (width, height) = bitmap.dimensions();
    let rgb = RgbImage::from_fn(width, height, |x, y| {
        let px = bitmap.get_pixel(x, y);
        Rgb([px[0], px[1], px[2]])
    });
    let mut data = Vec::new();
    JpegEncoder::new_with_quality(&mut data, PDF_IMAGE_QUALITY).encode(
        rgb.as_raw(),
        width,
        height,
        ColorType::Rgb8,
    )?;
    Ok(data)
}

fn fmt_float(value: f32) -> String {
    format!("{:.3}", value)
}

struct PdfBuilder {
    objects: Vec<Option<Vec<u8>>>,
}

impl PdfBuilder {
    fn new() -> Self {
        Self {
            objects: Vec::new(),
        }
    }

    fn reserve(&mut self) -> usize {
        self.objects.push(None);
        self.objects.len()
    }

    fn set(&mut self, number: usize, body: impl Into<String>) {
        if let Some(slot) = self.objects.get_mut(number - 1) {
            *slot = Some(body.into().into_bytes());
        }
    }

    fn add_object(&mut self, body: impl Into<String>) -> usize {
        self.objects.push(Some(body.into().into_bytes()));
        self.objects.len()
    }

    fn add_stream(&mut self, dictionary: &str, stream: &[u8]) -> usize {
        let separator = if dictionary.is_empty() { "" } else { " " };
        let mut body =
            format!("<< {dictionary}{separator}/Length {} >>\nstream\n", stream.len()).into_bytes();
        body.extend_from_slice(stream);
        body.extend_from_slice(b"\nendstream");
        self.objects.push(Some(body));
        self.objects.len()
    }

    fn finish(self, root: usize) -> Result<Vec<u8>, PdfError> {
        let mut output = Vec::new();
        output.extend_from_slice(b"%PDF-1.4\n%\xFF\xFF\xFF\xFF\n");
        let mut offsets = Vec::with_capacity(self.objects.len());

        for (position, object) in self.objects.iter().enumerate() {
            let number = position + 1;
            let body = object.as_ref().ok_or(PdfError::MissingObject(number))?;
            offsets.push(output.len());
            output.extend_from_slice(format!("{number} 0 obj\n").as_bytes());
            output.extend_from_slice(body);
            output.extend_from_slice(b"\nendobj\n");
        }

        let xref_start = output.len();
        let size = self.objects.len() + 1;
        output.extend_from_slice(format!("xref\n0 {size}\n0000000000 65535 f \n").as_bytes());
        for offset in offsets {
            output.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        output.extend_from_slice(
            format!("trailer\n<< /Size {size} /Root {root} 0 R >>\nstartxref\n{xref_start}\n%%EOF\n")
                .as_bytes(),
        );

        Ok(output)
    }
}
