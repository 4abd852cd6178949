//! `pdf-x`: a thin CLI wrapper over the `pdf-x-core` rendering pipeline (§6).
//!
//! Converts PDF pages to raster images, or prints a quick `--info` summary,
//! mapping library errors to the exit codes §6 defines.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pdf_x_core::config::{OutputMode, RenderOptions, RendererChoice};
use pdf_x_core::decoder::portable::PortableDecoder;
use pdf_x_core::decoder::{DecodeSource, PageDecoder};
use pdf_x_core::input::{self, AcquiredInput, Source};
use pdf_x_core::orchestrator::{convert, ConvertOptions, PageSelection};
use pdf_x_core::pipeline_error::ConvertError;

#[derive(Parser, Debug)]
#[command(name = "pdf-x", version, about = "Convert PDF pages to raster images")]
struct Args {
    /// Path, `file://` path, or `http(s)://` URL to the input PDF.
    input: Option<String>,

    /// Print `{num_pages, size_bytes}` for the input and exit, without rendering.
    #[arg(long)]
    info: bool,

    /// Print capability/version details (native decoder, encoder availability) and exit.
    #[arg(long = "version-info")]
    version_info: bool,

    /// Output directory for rendered pages. Required unless `--info`/`--version-info`.
    #[arg(short = 'o', long = "output-dir")]
    output_dir: Option<PathBuf>,

    /// Pages to render: "all", or a comma-separated list of 1-based page numbers.
    /// Defaults to the first six pages.
    #[arg(short = 'p', long = "pages")]
    pages: Option<String>,

    /// Output image format.
    #[arg(long, default_value = "webp")]
    format: String,

    /// Filename prefix for rendered pages (file mode): `{prefix}_{page}.{ext}`.
    #[arg(long, default_value = "page")]
    prefix: String,

    /// Encoder quality, 0-100 (WebP/JPEG only).
    #[arg(long)]
    quality: Option<u8>,

    /// Explicit renderer backend override.
    #[arg(long)]
    renderer: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to start the tokio runtime");

    runtime.block_on(run(args))
}

async fn run(args: Args) -> ExitCode {
    if args.version_info {
        print_version_info();
        return ExitCode::SUCCESS;
    }

    let Some(input) = args.input.as_deref() else {
        eprintln!("error: an input path or URL is required");
        return ExitCode::from(2);
    };

    let source = match parse_source(input) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(2);
        }
    };

    if args.info {
        return match print_info(source).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("error: {err}");
                ExitCode::from(err.exit_code() as u8)
            }
        };
    }

    let Some(output_dir) = args.output_dir.clone() else {
        eprintln!("error: -o/--output-dir is required");
        return ExitCode::from(2);
    };

    let options = match build_convert_options(&args, output_dir) {
        Ok(o) => o,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(err.exit_code() as u8);
        }
    };

    match convert(source, options).await {
        Ok(result) => {
            println!(
                "{{\"success\":true,\"num_pages\":{},\"rendered_pages\":{},\"format\":\"{}\",\"renderer_used\":\"{}\",\"total_ms\":{}}}",
                result.num_pages,
                result.rendered_pages,
                result.format.extension(),
                result.renderer_used,
                result.timing.total_ms,
            );
            for page in &result.pages {
                if page.success {
                    println!("  page {}: ok ({}x{})", page.page_index, page.width_px, page.height_px);
                } else {
                    eprintln!(
                        "  page {}: failed ({})",
                        page.page_index,
                        page.error.as_ref().map(|e| e.to_string()).unwrap_or_default()
                    );
                }
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

fn parse_source(input: &str) -> Result<Source, ConvertError> {
    if let Some(path) = input.strip_prefix("file://") {
        return Ok(Source::LocalPath(PathBuf::from(path)));
    }
    if input.starts_with("http://") || input.starts_with("https://") {
        return Ok(Source::Remote(input.to_string()));
    }
    Ok(Source::LocalPath(PathBuf::from(input)))
}

fn build_convert_options(args: &Args, output_dir: PathBuf) -> Result<ConvertOptions, ConvertError> {
    let pages = match args.pages.as_deref() {
        None => PageSelection::DefaultFirstSix,
        Some("all") => PageSelection::All,
        Some(list) => {
            let mut parsed = Vec::new();
            for part in list.split(',') {
                let part = part.trim();
                if part.is_empty() {
                    continue;
                }
                let page: u32 = part
                    .parse()
                    .map_err(|_| ConvertError::InvalidInput(format!("invalid page number: {part}")))?;
                parsed.push(page);
            }
            PageSelection::Explicit(parsed)
        }
    };

    let format = pdf_x_core::config::OutputFormat::parse(&args.format)?;
    let renderer = match args.renderer.as_deref() {
        None => RendererChoice::Auto,
        Some("native") => RendererChoice::Native,
        Some("portable") => RendererChoice::Portable,
        Some(other) => {
            return Err(ConvertError::InvalidInput(format!("unknown renderer: {other}")));
        }
    };

    let mut render_opts = RenderOptions { format, renderer, ..RenderOptions::default() };
    if let Some(quality) = args.quality {
        render_opts.webp_quality = quality;
        render_opts.jpeg_quality = quality;
    }
    render_opts.validate()?;

    Ok(ConvertOptions {
        pages,
        output_mode: OutputMode::File { output_dir, prefix: args.prefix.clone() },
        render_opts,
        cancellation: None,
    })
}

async fn print_info(source: Source) -> Result<(), ConvertError> {
    let thresholds = pdf_x_core::config::Thresholds::from_env();
    let acquired = input::acquire(&source, &thresholds, false).await?;
    let size_bytes = acquired.size();

    let decode_source = match &acquired {
        AcquiredInput::Buffered { bytes } => DecodeSource::Buffered(bytes.clone()),
        AcquiredInput::Streamed { size, prefix_bytes, fetcher } => {
            DecodeSource::Streamed { size: *size, prefix: prefix_bytes.clone(), fetcher: fetcher.clone() }
        }
    };
    let decoder = PortableDecoder::new(tokio::runtime::Handle::current());
    let num_pages = match decoder.open(decode_source) {
        Ok(mut handle) => {
            let count = decoder.page_count(&mut handle).unwrap_or(0);
            decoder.close(handle);
            count
        }
        Err(_) => 0,
    };

    println!("{{\"num_pages\":{num_pages},\"size_bytes\":{size_bytes}}}");
    Ok(())
}

fn print_version_info() {
    let config = pdf_x_core::config::Config::global();
    println!("pdf-x {}", env!("CARGO_PKG_VERSION"));
    println!(
        "native_decoder_available: {}{}",
        config.capabilities.native_decoder_available,
        config
            .capabilities
            .native_decoder_version
            .as_deref()
            .map(|v| format!(" ({v})"))
            .unwrap_or_default()
    );
    println!("native_stream_available: {}", config.capabilities.native_stream_available);
    println!("native_encoder_available: {}", config.capabilities.native_encoder_available);
}
