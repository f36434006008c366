//! Format conversion: DVI → SVG via `dvisvgm`, then SVG → PNG/JPG.
//!
//! `dvisvgm --no-fonts` converts glyphs to paths, so the SVG renders
//! identically without the TeX fonts installed — which is exactly the
//! situation on the machines the images are viewed on. The scale factor is
//! applied here, once, rather than in the rasteriser, so all three output
//! formats agree on dimensions.
//!
//! PNG comes from `rsvg-convert`. JPG is the PNG flattened onto a white
//! background in-process: JPEG has no alpha channel, and naively dropping
//! alpha turns the transparent page background black.

use crate::config::{BatchConfig, OutputFormat};
use crate::error::ItemError;
use crate::pipeline::{log_tail, run_tool, ToolRun, JOB_NAME};
use std::path::{Path, PathBuf};
use tracing::debug;

const LOG_TAIL_CHARS: usize = 4000;

/// Convert `item.dvi` in the workspace into the configured output format.
///
/// Returns the path of the final artifact, still inside the workspace;
/// placement into the output directory is the next stage's job.
pub async fn to_image(
    item_id: &str,
    workspace: &Path,
    config: &BatchConfig,
) -> Result<PathBuf, ItemError> {
    let svg_path = dvi_to_svg(item_id, workspace, config).await?;

    match config.format {
        OutputFormat::Svg => Ok(svg_path),
        OutputFormat::Png => svg_to_png(item_id, workspace, config).await,
        OutputFormat::Jpg => {
            let png_path = svg_to_png(item_id, workspace, config).await?;
            png_to_jpg(item_id, &png_path, config).await
        }
    }
}

async fn dvi_to_svg(
    item_id: &str,
    workspace: &Path,
    config: &BatchConfig,
) -> Result<PathBuf, ItemError> {
    let args = vec![
        "--no-fonts".to_string(),
        format!("--scale={}", config.scale),
        "--exact".to_string(),
        format!("{JOB_NAME}.dvi"),
    ];
    debug!("running {} for item '{}'", config.dvisvgm_command, item_id);
    let run = run_tool(
        &config.dvisvgm_command,
        &args,
        workspace,
        config.convert_timeout_secs,
    )
    .await
    .map_err(|e| ItemError::Conversion {
        id: item_id.to_string(),
        log: e,
    })?;

    let output = match run {
        ToolRun::TimedOut => {
            return Err(ItemError::Timeout {
                id: item_id.to_string(),
                stage: config.dvisvgm_command.clone(),
                secs: config.convert_timeout_secs,
            })
        }
        ToolRun::Completed(output) => output,
    };

    let svg_path = workspace.join(format!("{JOB_NAME}.svg"));
    if !output.ok || !svg_path.exists() {
        return Err(ItemError::Conversion {
            id: item_id.to_string(),
            log: log_tail(&output.log, LOG_TAIL_CHARS),
        });
    }
    Ok(svg_path)
}

async fn svg_to_png(
    item_id: &str,
    workspace: &Path,
    config: &BatchConfig,
) -> Result<PathBuf, ItemError> {
    let png_name = format!("{JOB_NAME}.png");
    let args = vec![
        "--format".to_string(),
        "png".to_string(),
        "--output".to_string(),
        png_name.clone(),
        format!("{JOB_NAME}.svg"),
    ];
    debug!("running {} for item '{}'", config.rsvg_command, item_id);
    let run = run_tool(
        &config.rsvg_command,
        &args,
        workspace,
        config.convert_timeout_secs,
    )
    .await
    .map_err(|e| ItemError::Conversion {
        id: item_id.to_string(),
        log: e,
    })?;

    let output = match run {
        ToolRun::TimedOut => {
            return Err(ItemError::Timeout {
                id: item_id.to_string(),
                stage: config.rsvg_command.clone(),
                secs: config.convert_timeout_secs,
            })
        }
        ToolRun::Completed(output) => output,
    };

    let png_path = workspace.join(png_name);
    if !output.ok || !png_path.exists() {
        return Err(ItemError::Conversion {
            id: item_id.to_string(),
            log: log_tail(&output.log, LOG_TAIL_CHARS),
        });
    }
    Ok(png_path)
}

/// Flatten the PNG onto white and encode as JPEG next to it.
///
/// Runs in `spawn_blocking`: decoding and re-encoding a large render is
/// CPU-bound work that would otherwise stall the runtime's worker threads.
async fn png_to_jpg(
    item_id: &str,
    png_path: &Path,
    config: &BatchConfig,
) -> Result<PathBuf, ItemError> {
    let jpg_path = png_path.with_extension("jpg");
    let src = png_path.to_path_buf();
    let dst = jpg_path.clone();
    let quality = config.jpeg_quality;
    let id = item_id.to_string();

    tokio::task::spawn_blocking(move || flatten_to_jpeg(&src, &dst, quality))
        .await
        .map_err(|e| ItemError::Conversion {
            id: id.clone(),
            log: format!("JPEG encode task panicked: {e}"),
        })?
        .map_err(|e| ItemError::Conversion { id, log: e })?;

    Ok(jpg_path)
}

/// Blocking implementation of the white-background JPEG flatten.
fn flatten_to_jpeg(png_path: &Path, jpg_path: &Path, quality: u8) -> Result<(), String> {
    let rgba = image::open(png_path)
        .map_err(|e| format!("failed to decode {}: {e}", png_path.display()))?
        .to_rgba8();

    let (width, height) = rgba.dimensions();
    let mut flat = image::RgbImage::from_pixel(width, height, image::Rgb([255, 255, 255]));
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = pixel[3] as u32;
        if alpha == 0 {
            continue;
        }
        let blend = |fg: u8| ((fg as u32 * alpha + 255 * (255 - alpha)) / 255) as u8;
        flat.put_pixel(x, y, image::Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
    }

    let mut file = std::fs::File::create(jpg_path)
        .map_err(|e| format!("failed to create {}: {e}", jpg_path.display()))?;
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut file, quality);
    flat.write_with_encoder(encoder)
        .map_err(|e| format!("failed to encode JPEG: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_composites_transparency_onto_white() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("in.png");
        let jpg = dir.path().join("out.jpg");

        // 2×1: fully transparent | opaque black
        let mut img = image::RgbaImage::new(2, 1);
        img.put_pixel(0, 0, image::Rgba([0, 0, 0, 0]));
        img.put_pixel(1, 0, image::Rgba([0, 0, 0, 255]));
        img.save(&png).unwrap();

        flatten_to_jpeg(&png, &jpg, 95).unwrap();

        let out = image::open(&jpg).unwrap().to_rgb8();
        // transparent pixel became white, not black (allow JPEG loss)
        assert!(out.get_pixel(0, 0)[0] > 240, "got: {:?}", out.get_pixel(0, 0));
        assert!(out.get_pixel(1, 0)[0] < 15, "got: {:?}", out.get_pixel(1, 0));
    }

    #[test]
    fn flatten_blends_partial_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("in.png");
        let jpg = dir.path().join("out.jpg");

        // 50 % black over white should land near mid-grey
        let img = image::RgbaImage::from_pixel(1, 1, image::Rgba([0, 0, 0, 128]));
        img.save(&png).unwrap();

        flatten_to_jpeg(&png, &jpg, 95).unwrap();

        let out = image::open(&jpg).unwrap().to_rgb8();
        let v = out.get_pixel(0, 0)[0];
        assert!((110..=145).contains(&v), "expected ~127, got {v}");
    }
}
