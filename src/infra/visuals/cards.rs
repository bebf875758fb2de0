// The rendered cards: ask lobby, duel arena, champion card and ship card.
//
// Everything here is synchronous CPU work. Callers run it on the blocking pool.

use ab_glyph::FontVec;
use image::{Rgba, RgbaImage};
use std::path::Path;

use super::canvas::{circular, decode, square, stretch, Canvas};
use super::VisualError;
use crate::core::fight::FightRecord;
use crate::core::ship::ShipReading;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const GOLD: Rgba<u8> = Rgba([255, 215, 0, 255]);

pub struct CardRenderer {
    font: Option<FontVec>,
    logo: Option<RgbaImage>,
    logo_bytes: Option<Vec<u8>>,
}

impl CardRenderer {
    /// Load the optional logo and font. Missing or broken assets are logged
    /// and the cards are drawn without them.
    pub fn load(logo_path: &Path, font_path: Option<&Path>) -> Self {
        let logo_bytes = match std::fs::read(logo_path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!(path = %logo_path.display(), "No logo loaded: {e}");
                None
            }
        };

        let font = font_path.and_then(|path| {
            let bytes = std::fs::read(path)
                .map_err(|e| tracing::warn!(path = %path.display(), "Font unreadable: {e}"))
                .ok()?;
            FontVec::try_from_vec(bytes)
                .map_err(|e| tracing::warn!(path = %path.display(), "Font invalid: {e}"))
                .ok()
        });

        if font.is_none() {
            tracing::info!("No card font configured; cards are drawn without text");
        }

        Self::from_parts(logo_bytes, font)
    }

    pub fn from_parts(logo_bytes: Option<Vec<u8>>, font: Option<FontVec>) -> Self {
        let logo = logo_bytes.as_deref().and_then(|bytes| {
            decode(bytes)
                .map_err(|e| tracing::warn!("Logo could not be decoded: {e}"))
                .ok()
        });

        Self {
            font,
            logo_bytes: logo.as_ref().and(logo_bytes),
            logo,
        }
    }

    /// The logo file as-is, for embed thumbnails.
    pub fn logo_bytes(&self) -> Option<&[u8]> {
        self.logo_bytes.as_deref()
    }

    /// 1200x600 lobby: both avatars inside glowing frames, "VS" between them.
    pub fn ask_lobby(&self, requester: &[u8], target: &[u8]) -> Result<Vec<u8>, VisualError> {
        const SIZE: u32 = 350;
        let mut canvas = Canvas::new(1200, 600, Rgba([15, 0, 8, 255]));

        let left = square(&decode(requester)?, SIZE);
        let right = square(&decode(target)?, SIZE);

        glow(&mut canvas, (100, 120), SIZE, [255, 20, 147]);
        glow(&mut canvas, (750, 120), SIZE, [255, 0, 0]);
        canvas.overlay(&left, 100, 120);
        canvas.overlay(&right, 750, 120);

        if let Some(font) = &self.font {
            canvas.text_centered(font, 120.0, (600, 295), Rgba([255, 0, 0, 255]), None, "VS");
        }

        canvas.encode_png()
    }

    /// 1200x600 arena: two circular avatars and crossed axes in the middle.
    pub fn arena(&self, challenger: &[u8], defender: &[u8]) -> Result<Vec<u8>, VisualError> {
        const SIZE: u32 = 450;
        let mut canvas = Canvas::new(1200, 600, Rgba([20, 20, 20, 255]));

        canvas.overlay(&circular(&decode(challenger)?, SIZE), 50, 75);
        canvas.overlay(&circular(&decode(defender)?, SIZE), 700, 75);

        let steel = Rgba([200, 200, 200, 255]);
        canvas.thick_line((530.0, 230.0), (670.0, 370.0), 15, steel);
        canvas.thick_line((670.0, 230.0), (530.0, 370.0), 15, steel);

        canvas.encode_png()
    }

    /// 1000x500 champion card over the veiled logo.
    pub fn winner_card(
        &self,
        avatar: &[u8],
        name: &str,
        record: &FightRecord,
    ) -> Result<Vec<u8>, VisualError> {
        const SIZE: u32 = 300;
        let mut canvas = Canvas::new(1000, 500, Rgba([15, 15, 15, 255]));

        if let Some(logo) = &self.logo {
            canvas.overlay(&stretch(logo, 1000, 500), 0, 0);
            canvas.veil(Rgba([0, 0, 0, 160]));
        }

        canvas.overlay(&circular(&decode(avatar)?, SIZE), 50, 100);
        canvas.ring((200, 250), 155, 10, GOLD);

        if let Some(font) = &self.font {
            let lines = [
                ("ARENA CHAMPION".to_string(), 80, Rgba([255, 69, 0, 255]), 48.0),
                (name.to_uppercase(), 130, WHITE, 56.0),
                (format!("TOTAL WINS: {}", record.wins), 220, GOLD, 36.0),
                (format!("CURRENT STREAK: {}", record.streak), 270, Rgba([255, 100, 0, 255]), 36.0),
                (format!("TOTAL FIGHTS: {}", record.fights), 320, Rgba([200, 200, 200, 255]), 36.0),
                (format!("WIN RATE: {:.1}%", record.win_rate()), 370, Rgba([0, 255, 127, 255]), 36.0),
            ];
            for (text, y, color, size) in lines {
                canvas.text(font, size, 400, y, color, &text);
            }
        }

        canvas.encode_png()
    }

    /// 1200x500 love meter: square avatars, a connection bar, the percentage,
    /// the logo stamp and a rounded progress bar.
    pub fn ship_card(
        &self,
        first: &[u8],
        second: &[u8],
        reading: &ShipReading,
    ) -> Result<Vec<u8>, VisualError> {
        const SIZE: u32 = 350;
        const BAR_WIDTH: u32 = 800;
        let percent = reading.percent.min(100);
        let mut canvas = Canvas::new(1200, 500, Rgba([30, 0, 5, 255]));

        canvas.overlay(&square(&decode(first)?, SIZE), 100, 75);
        canvas.overlay(&square(&decode(second)?, SIZE), 750, 75);

        canvas.blend_rect(450, 240, 300, 20, Rgba([255, 255, 255, 50]));

        if let Some(font) = &self.font {
            let heart = if reading.is_warm() {
                Rgba([255, 40, 100, 255])
            } else {
                Rgba([100, 100, 100, 255])
            };
            canvas.text_centered(
                font,
                150.0,
                (600, 250),
                WHITE,
                Some(Rgba([0, 0, 0, 255])),
                &format!("{percent}%"),
            );
            // Small heart-coloured underline so the mood reads without the number
            canvas.fill_rounded_rect(560, 330, 80, 10, 5, heart);
        }

        if let Some(logo) = &self.logo {
            canvas.overlay(&square(logo, 120), 540, 30);
        }

        let bar_start = ((1200 - BAR_WIDTH) / 2) as i32;
        canvas.fill_rounded_rect(bar_start, 430, BAR_WIDTH, 20, 10, Rgba([50, 50, 50, 255]));
        let filled = BAR_WIDTH * u32::from(percent) / 100;
        if filled > 0 {
            canvas.fill_rounded_rect(bar_start, 430, filled, 20, 10, Rgba([255, 50, 80, 255]));
        }

        canvas.encode_png()
    }
}

/// Fading frame around a square, strongest nearest the picture.
fn glow(canvas: &mut Canvas, pos: (i32, i32), size: u32, rgb: [u8; 3]) {
    const STEPS: u32 = 15;
    for i in (1..=STEPS).rev() {
        let alpha = (255.0 * (1.0 - i as f32 / STEPS as f32)) as u8;
        let offset = i as i32;
        canvas.blend_outline(
            pos.0 - offset,
            pos.1 - offset,
            size + 2 * i,
            size + 2 * i,
            2,
            Rgba([rgb[0], rgb[1], rgb[2], alpha]),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

    fn solid_png(color: [u8; 4]) -> Vec<u8> {
        Canvas::new(32, 32, Rgba(color)).encode_png().unwrap()
    }

    fn renderer() -> CardRenderer {
        CardRenderer::from_parts(Some(solid_png([0, 0, 255, 255])), None)
    }

    #[test]
    fn lobby_places_avatars_on_dark_background() {
        let png = renderer()
            .ask_lobby(&solid_png([0, 255, 0, 255]), &solid_png([255, 255, 0, 255]))
            .unwrap();
        assert_eq!(&png[..8], PNG_MAGIC);

        let image = decode(&png).unwrap();
        assert_eq!(image.dimensions(), (1200, 600));
        assert_eq!(*image.get_pixel(275, 295), Rgba([0, 255, 0, 255]));
        assert_eq!(*image.get_pixel(925, 295), Rgba([255, 255, 0, 255]));
        assert_eq!(*image.get_pixel(5, 5), Rgba([15, 0, 8, 255]));
    }

    #[test]
    fn arena_avatars_are_round() {
        let png = renderer()
            .arena(&solid_png([0, 255, 0, 255]), &solid_png([255, 0, 0, 255]))
            .unwrap();
        let image = decode(&png).unwrap();

        assert_eq!(image.dimensions(), (1200, 600));
        // Centre of the left avatar is filled, its bounding-box corner is not
        assert_eq!(*image.get_pixel(275, 300), Rgba([0, 255, 0, 255]));
        assert_eq!(*image.get_pixel(52, 77), Rgba([20, 20, 20, 255]));
        // Crossed axes meet in the middle
        assert_eq!(*image.get_pixel(600, 300), Rgba([200, 200, 200, 255]));
    }

    #[test]
    fn winner_card_draws_gold_ring_over_veiled_logo() {
        let record = FightRecord {
            wins: 3,
            fights: 4,
            streak: 2,
            ..Default::default()
        };
        let png = renderer()
            .winner_card(&solid_png([255, 255, 255, 255]), "champ", &record)
            .unwrap();
        let image = decode(&png).unwrap();

        assert_eq!(image.dimensions(), (1000, 500));
        assert_eq!(*image.get_pixel(200, 97), GOLD);
        // Blue logo darkened by the veil
        let veiled = image.get_pixel(900, 20);
        assert!(veiled.0[2] > 0 && veiled.0[2] < 150, "got {:?}", veiled);
    }

    #[test]
    fn ship_bar_fills_in_proportion() {
        let png = renderer()
            .ship_card(
                &solid_png([0, 255, 0, 255]),
                &solid_png([0, 255, 0, 255]),
                &ShipReading::new(50),
            )
            .unwrap();
        let image = decode(&png).unwrap();

        assert_eq!(image.dimensions(), (1200, 500));
        assert_eq!(*image.get_pixel(300, 440), Rgba([255, 50, 80, 255]));
        assert_eq!(*image.get_pixel(900, 440), Rgba([50, 50, 50, 255]));
        // Logo stamp
        assert_eq!(*image.get_pixel(600, 90), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn empty_meter_has_no_fill() {
        let png = renderer()
            .ship_card(
                &solid_png([0, 255, 0, 255]),
                &solid_png([0, 255, 0, 255]),
                &ShipReading::new(0),
            )
            .unwrap();
        let image = decode(&png).unwrap();
        assert_eq!(*image.get_pixel(215, 440), Rgba([50, 50, 50, 255]));
    }

    #[test]
    fn broken_avatar_is_a_decode_error() {
        let result = renderer().arena(b"not an image", &solid_png([0, 0, 0, 255]));
        assert!(matches!(result, Err(VisualError::Decode(_))));
    }

    #[test]
    fn broken_logo_is_ignored() {
        let renderer = CardRenderer::from_parts(Some(b"garbage".to_vec()), None);
        assert!(renderer.logo_bytes().is_none());
    }
}
