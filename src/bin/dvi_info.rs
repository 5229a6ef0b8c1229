use std::env;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use dvi_index::{DviReader, DviReaderConfiguration};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        bail!(
            "Usage: {} <file.dvi>... [--no-specials] [--no-paper-size]",
            args[0]
        );
    }

    let mut configuration = DviReaderConfiguration::default();
    let mut paths = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "--no-specials" => configuration.prescan_specials = false,
            "--no-paper-size" => configuration.detect_paper_size = false,
            flag if flag.starts_with("--") => bail!("Unknown option {}", flag),
            path => paths.push(path),
        }
    }

    let mut buffers = Vec::with_capacity(paths.len());
    for path in &paths {
        let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path))?;
        buffers.push(Arc::<[u8]>::from(data));
    }

    let results = DviReader::read_many(buffers, &configuration);
    let mut failed = false;
    for (path, result) in paths.iter().zip(results) {
        println!("{}", "=".repeat(60));
        println!("{}", path);
        println!("{}", "=".repeat(60));

        let doc = match result {
            Ok(doc) => doc,
            Err(e) => {
                eprintln!("ERROR: {}", e);
                failed = true;
                continue;
            }
        };

        println!("  Format: {}", doc.version());
        println!("  Comment: {}", doc.generator_comment());
        println!("  Magnification: {}", doc.magnification());
        println!("  cm per DVI unit: {:e}", doc.cm_per_dvi_unit());
        println!("  Stage: {:?}", doc.stage());
        if let Some(size) = doc.suggested_paper_size() {
            println!("  Paper size: {}", size);
        }

        println!("\nPages: {}", doc.total_pages());
        for (i, offset) in doc.page_offsets().iter().enumerate().take(10) {
            let counter = doc.page_counters(i).map(|c| c[0]).unwrap_or_default();
            println!("  {}. offset {} (\\count0 = {})", i + 1, offset, counter);
        }
        if doc.page_offsets().len() > 10 {
            println!("  ... and {} more", doc.page_offsets().len() - 10);
        }

        println!("\nFonts: {}", doc.font_definitions().len());
        for font in doc.font_definitions().values() {
            println!(
                "  [{}] {} at {:.3}x",
                font.font_id,
                font.font_name,
                font.enlargement(doc.magnification())
            );
        }

        if let Some(summary) = doc.special_summary() {
            println!(
                "\nSpecials: {} ({} PostScript, {} source)",
                summary.total_specials, summary.postscript_specials, summary.source_specials
            );
        }

        if !doc.notifications().is_empty() {
            println!("\nNotifications ({} errors):", doc.error_count());
            for notification in doc.notifications().iter() {
                println!("  {}", notification);
            }
        }
    }

    if failed {
        bail!("Some files could not be decoded");
    }
    Ok(())
}
