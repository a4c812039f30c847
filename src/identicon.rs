//! The public identicon type: digest → decoded layers and colours → pixels.

use crate::canvas::Canvas;
use crate::decoder::PatchConfiguration;
use crate::digest::{DigestSource, HashDigest, Sha256Source};
use crate::error::{IdiconError, Result};
use crate::gradient::paint_background;
use crate::layer::{composite_layers, LAYER_COUNT};
use crate::options::{parse_hex_color, RenderOptions};
use palette::Srgb;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Hex digits taken per background colour.
const COLOR_DIGITS: usize = 6;

enum Input {
    Digest(HashDigest),
    Text(String, Box<dyn DigestSource>),
}

struct Decoded {
    digest: HashDigest,
    configs: Vec<PatchConfiguration>,
    colors: [String; 4],
    rgb: [Srgb<u8>; 4],
}

/// Snapshot of everything derived from the digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugInfo {
    pub hash: String,
    pub colors: Vec<String>,
    pub configs: Vec<String>,
}

impl DebugInfo {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| IdiconError::Encode(e.to_string()))
    }
}

/// A deterministic identicon for one input.
///
/// Text inputs are hashed on first use and the outcome, success or failure,
/// is kept for the lifetime of the instance.
pub struct Idicon {
    input: Input,
    decoded: OnceLock<Result<Decoded>>,
}

impl Idicon {
    /// Identicon for `input`, hashed with SHA-256.
    pub fn new(input: impl Into<String>) -> Self {
        Self::with_source(input, Sha256Source)
    }

    /// Identicon for `input`, hashed by `source`.
    pub fn with_source(input: impl Into<String>, source: impl DigestSource + 'static) -> Self {
        Self {
            input: Input::Text(input.into(), Box::new(source)),
            decoded: OnceLock::new(),
        }
    }

    pub fn from_digest(digest: HashDigest) -> Self {
        Self {
            input: Input::Digest(digest),
            decoded: OnceLock::new(),
        }
    }

    pub fn from_words(words: &[u32]) -> Self {
        Self::from_digest(HashDigest::from_words(words))
    }

    fn decoded(&self) -> Result<&Decoded> {
        self.decoded
            .get_or_init(|| self.decode())
            .as_ref()
            .map_err(Clone::clone)
    }

    fn decode(&self) -> Result<Decoded> {
        let digest = match &self.input {
            Input::Digest(digest) => digest.clone(),
            Input::Text(text, source) => {
                log::debug!("Hashing identicon input ({} bytes)", text.len());
                source.digest(text)?
            }
        };

        let words = digest.words();
        let configs = words
            .iter()
            .take(LAYER_COUNT)
            .map(|&code| PatchConfiguration::decode(code))
            .collect::<Vec<_>>();

        let mut hex = words
            .iter()
            .skip(LAYER_COUNT)
            .map(|w| format!("{:08x}", w))
            .collect::<String>();
        if hex.len() < COLOR_DIGITS * 4 {
            log::warn!(
                "Digest has {} words; padding background colours with zeros",
                words.len()
            );
            hex.extend(std::iter::repeat('0').take(COLOR_DIGITS * 4 - hex.len()));
        }

        let mut colors: [String; 4] = Default::default();
        let mut rgb = [Srgb::new(0u8, 0, 0); 4];
        for i in 0..4 {
            let slice = &hex[i * COLOR_DIGITS..(i + 1) * COLOR_DIGITS];
            colors[i] = slice.to_string();
            rgb[i] = parse_hex_color(slice)?;
        }

        Ok(Decoded {
            digest,
            configs,
            colors,
            rgb,
        })
    }

    /// Paints the background and all pattern layers onto `canvas`.
    ///
    /// A zero-sized canvas is left alone. Every failure is reported before
    /// the first pixel is written.
    pub fn render(&self, canvas: &mut Canvas, options: &RenderOptions) -> Result<()> {
        if canvas.is_empty() {
            log::debug!("Skipping render onto empty canvas");
            return Ok(());
        }
        let decoded = self.decoded()?;
        let colors = options.palette.resolve()?;
        let size = options.layer_size(canvas.width(), canvas.height());

        paint_background(&decoded.rgb, canvas, options.gradient)?;
        composite_layers(canvas, &decoded.configs, options.cells, size, &colors);

        log::debug!(
            "Rendered identicon {}x{} (layers {}px, cells {:#05x})",
            canvas.width(),
            canvas.height(),
            size,
            options.cells.bits()
        );
        Ok(())
    }

    /// The four background colours as six-digit lowercase hex.
    pub fn colors(&self) -> Result<Vec<String>> {
        Ok(self.decoded()?.colors.to_vec())
    }

    pub fn patch_configurations(&self) -> Result<&[PatchConfiguration]> {
        Ok(&self.decoded()?.configs)
    }

    /// One `M:… S:… C:… X:…` line per layer.
    pub fn configurations(&self) -> Result<Vec<String>> {
        Ok(self
            .decoded()?
            .configs
            .iter()
            .map(ToString::to_string)
            .collect())
    }

    pub fn digest_string(&self) -> Result<String> {
        Ok(self.decoded()?.digest.to_hex_string())
    }

    pub fn debug_info(&self) -> Result<DebugInfo> {
        Ok(DebugInfo {
            hash: self.digest_string()?,
            colors: self.colors()?,
            configs: self.configurations()?,
        })
    }
}

/// Renders `input` onto a fresh `size` x `size` canvas and encodes it as PNG.
pub fn render_png(input: &str, size: u32, options: &RenderOptions) -> Result<Vec<u8>> {
    let mut canvas = Canvas::new(size, size);
    Idicon::new(input).render(&mut canvas, options)?;
    canvas.to_png()
}
