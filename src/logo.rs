use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use image::RgbaImage;
use image::imageops::FilterType;

use crate::error::Error;
use crate::model::Bitmap;

/// Side length, in pixels, of the masked logo bitmap.
pub const LOGO_PIXELS: u32 = 100;

const MAX_LOGO_BYTES: u64 = 10 * 1024 * 1024;

/// Byte source for logo references.
pub trait Fetch {
    fn fetch(&mut self, url: &str) -> Result<Vec<u8>, Error>;
}

/// Fetches `http(s)://` references with ureq. Other schemes and bare
/// filesystem paths are rejected.
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { agent }
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&mut self, url: &str) -> Result<Vec<u8>, Error> {
        let fetch_err = |reason: String| Error::Fetch {
            url: url.to_string(),
            reason,
        };
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(fetch_err("only http and https logo URLs are fetched".to_string()));
        }

        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| fetch_err(e.to_string()))?;
        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(MAX_LOGO_BYTES)
            .read_to_end(&mut bytes)
            .map_err(|e| fetch_err(format!("failed to read response: {e}")))?;
        Ok(bytes)
    }
}

/// Resolves logo references to circular bitmaps, once per distinct URL.
///
/// Failures are logged and cached as "no logo"; they never reach the caller.
pub struct LogoResolver<'f> {
    fetcher: &'f mut dyn Fetch,
    retries: u32,
    cache: HashMap<String, Option<Arc<Bitmap>>>,
}

impl<'f> LogoResolver<'f> {
    /// `retries` is capped at one.
    pub fn new(fetcher: &'f mut dyn Fetch, retries: u32) -> Self {
        Self {
            fetcher,
            retries: retries.min(1),
            cache: HashMap::new(),
        }
    }

    pub fn resolve_logo(&mut self, url: &str) -> Option<Arc<Bitmap>> {
        if let Some(cached) = self.cache.get(url) {
            return cached.clone();
        }

        let t0 = std::time::Instant::now();
        let logo = match self.fetch_with_retry(url).and_then(|bytes| circular_logo(&bytes)) {
            Ok(bitmap) => {
                log::debug!(
                    "Logo {url} resolved in {:.1}ms",
                    t0.elapsed().as_secs_f64() * 1000.0
                );
                Some(Arc::new(bitmap))
            }
            Err(e) => {
                log::warn!("Logo unavailable, rendering header without it: {e}");
                None
            }
        };
        self.cache.insert(url.to_string(), logo.clone());
        logo
    }

    fn fetch_with_retry(&mut self, url: &str) -> Result<Vec<u8>, Error> {
        let mut attempt = 0;
        loop {
            match self.fetcher.fetch(url) {
                Ok(bytes) => return Ok(bytes),
                Err(e) if attempt < self.retries => {
                    log::debug!("Retrying logo fetch after error: {e}");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Decode any supported raster format into an RGBA bitmap.
pub fn decode_bitmap(bytes: &[u8]) -> Result<Bitmap, Error> {
    let img = image::load_from_memory(bytes).map_err(|e| Error::Image(e.to_string()))?;
    Ok(into_bitmap(img.to_rgba8()))
}

/// Decode, resize to a `LOGO_PIXELS` square and cut out the inscribed circle.
pub fn circular_logo(bytes: &[u8]) -> Result<Bitmap, Error> {
    let img = image::load_from_memory(bytes).map_err(|e| Error::Image(e.to_string()))?;
    let square = img
        .resize_exact(LOGO_PIXELS, LOGO_PIXELS, FilterType::Lanczos3)
        .to_rgba8();
    Ok(into_bitmap(apply_circular_mask(square)))
}

/// Multiply alpha by the coverage of a filled circle (destination-in),
/// with a one-pixel soft edge.
pub fn apply_circular_mask(mut img: RgbaImage) -> RgbaImage {
    let (w, h) = img.dimensions();
    let radius = w.min(h) as f32 / 2.0;
    let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);

    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let dx = x as f32 + 0.5 - cx;
        let dy = y as f32 + 0.5 - cy;
        let dist = (dx * dx + dy * dy).sqrt();
        let coverage = (radius - dist + 0.5).clamp(0.0, 1.0);
        pixel.0[3] = (pixel.0[3] as f32 * coverage).round() as u8;
    }
    img
}

fn into_bitmap(img: RgbaImage) -> Bitmap {
    Bitmap {
        width: img.width(),
        height: img.height(),
        rgba: img.into_raw(),
    }
}
