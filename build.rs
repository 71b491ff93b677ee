use image::GenericImageView;
use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

const FRAMES_DIR: &str = "assets/frames";

/// Convert one PNG into a column-major 1-bit frame, MSB first from the top
fn convert_frame(
    input_path: &Path,
    target_width: u32,
    target_height: u32,
    threshold: u8,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed={}", input_path.display());

    let img = image::open(input_path)?;

    // Fit inside the target while keeping the aspect ratio
    let orig_ratio = img.width() as f32 / img.height() as f32;
    let target_ratio = target_width as f32 / target_height as f32;
    let (new_width, new_height) = if orig_ratio > target_ratio {
        (target_width, (target_width as f32 / orig_ratio) as u32)
    } else {
        ((target_height as f32 * orig_ratio) as u32, target_height)
    };

    let gray = img
        .resize(new_width, new_height, image::imageops::FilterType::Lanczos3)
        .to_luma8();

    let offset_x = (target_width - gray.width()) / 2;
    let offset_y = (target_height - gray.height()) / 2;
    let column_bytes = target_height.div_ceil(8);
    let mut buffer = vec![0u8; (column_bytes * target_width) as usize];

    for x in 0..target_width {
        for y in 0..target_height {
            let brightness = match (x.checked_sub(offset_x), y.checked_sub(offset_y)) {
                (Some(ix), Some(iy)) if ix < gray.width() && iy < gray.height() => {
                    gray.get_pixel(ix, iy)[0]
                }
                _ => 0,
            };

            // Bright pixels light up on an OLED
            if brightness >= threshold {
                let index = (x * column_bytes + y / 8) as usize;
                buffer[index] |= 0x80 >> (y % 8);
            }
        }
    }

    Ok(buffer)
}

fn frame_paths() -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(FRAMES_DIR) else {
        println!(
            "cargo:warning=Frame directory '{}' not found, building without animation",
            FRAMES_DIR
        );
        return Vec::new();
    };
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "png"))
        .collect();
    paths.sort();
    paths
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed={}", FRAMES_DIR);

    let out_dir = env::var("OUT_DIR")?;
    let output = Path::new(&out_dir).join("frames.bin");

    // Panel dimensions
    let (width, height) = (128u32, 64u32);

    let mut frames = Vec::new();
    for path in frame_paths() {
        match convert_frame(&path, width, height, 128) {
            Ok(frame) => frames.push(frame),
            Err(e) => println!("cargo:warning=Failed to convert {}: {}", path.display(), e),
        }
    }

    let mut file = File::create(&output)?;
    if frames.is_empty() {
        // empty table, the animation page stays blank
        return Ok(());
    }

    file.write_all(&(frames.len() as u16).to_le_bytes())?;
    file.write_all(&[width as u8, height as u8])?;
    for frame in &frames {
        file.write_all(frame)?;
    }
    Ok(())
}
