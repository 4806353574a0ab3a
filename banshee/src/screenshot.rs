use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::Context;
use wraith::Pixel;
use wraith::SCREEN_HEIGHT;
use wraith::SCREEN_WIDTH;

/// Flattens a frame into RGB8 bytes, repeating each pixel `scale` times in both directions.
pub fn scale_frame(frame: &[[Pixel; SCREEN_WIDTH]], scale: u32) -> Vec<u8> {
    let scale = scale.max(1) as usize;
    frame
        .iter()
        .flat_map(|line| std::iter::repeat(line).take(scale))
        .flat_map(|line| line.iter().flat_map(|p| std::iter::repeat(p).take(scale)))
        .flat_map(|p| [p.r, p.g, p.b])
        .collect()
}

pub fn write_png(path: &Path, frame: &[[Pixel; SCREEN_WIDTH]], scale: u32) -> anyhow::Result<()> {
    let scale = scale.max(1);
    let file = File::create(path)
        .with_context(|| format!("failed to create screenshot at {}", path.display()))?;
    let mut encoder = png::Encoder::new(
        BufWriter::new(file),
        SCREEN_WIDTH as u32 * scale,
        SCREEN_HEIGHT as u32 * scale,
    );
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&scale_frame(frame, scale))?;
    writer.finish()?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn checkerboard() -> Vec<[Pixel; SCREEN_WIDTH]> {
        (0..SCREEN_HEIGHT)
            .map(|y| {
                std::array::from_fn(|x| {
                    if (x + y) % 2 == 0 {
                        Pixel::WHITE
                    } else {
                        Pixel::BLACK
                    }
                })
            })
            .collect()
    }

    #[test]
    fn nearest_neighbour() {
        let frame = checkerboard();
        let data = scale_frame(&frame, 3);
        let width = SCREEN_WIDTH * 3;
        assert_eq!(data.len(), width * SCREEN_HEIGHT * 3 * 3);
        let at = |x: usize, y: usize| {
            let i = 3 * (y * width + x);
            Pixel::new(data[i], data[i + 1], data[i + 2])
        };
        for (x, y) in [(0, 0), (2, 2), (0, 2), (2, 0)] {
            assert_eq!(at(x, y), Pixel::WHITE);
        }
        assert_eq!(at(3, 0), Pixel::BLACK);
        assert_eq!(at(0, 3), Pixel::BLACK);
        assert_eq!(at(3, 3), Pixel::WHITE);
    }

    #[test]
    fn zero_scale_is_unscaled() {
        let frame = checkerboard();
        assert_eq!(scale_frame(&frame, 0), scale_frame(&frame, 1));
        assert_eq!(scale_frame(&frame, 1).len(), SCREEN_WIDTH * SCREEN_HEIGHT * 3);
    }

    #[test]
    fn png_has_scaled_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");
        write_png(&path, &checkerboard(), 2).unwrap();
        let decoder = png::Decoder::new(File::open(&path).unwrap());
        let reader = decoder.read_info().unwrap();
        let info = reader.info();
        assert_eq!(info.width, 320);
        assert_eq!(info.height, 288);
        assert_eq!(info.color_type, png::ColorType::Rgb);
    }
}
