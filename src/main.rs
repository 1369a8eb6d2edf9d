use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;

use acta_pdf::{Error, FontFiles, HeaderPolicy, LayoutOptions, PageTotal};

#[derive(Parser, Debug)]
#[command(version, about = "Render meeting minutes (Acta JSON) into a paginated PDF")]
struct Args {
    /// Acta record as JSON
    input: PathBuf,

    /// Output PDF path
    output: PathBuf,

    /// Image stretched across the header band
    #[arg(long)]
    header_image: Option<PathBuf>,

    /// Image stretched across the footer band
    #[arg(long)]
    footer_image: Option<PathBuf>,

    /// Regular TrueType face (requires --font-bold and --font-italic)
    #[arg(long, requires_all = ["font_bold", "font_italic"])]
    font_regular: Option<PathBuf>,

    #[arg(long, requires = "font_regular")]
    font_bold: Option<PathBuf>,

    #[arg(long, requires = "font_regular")]
    font_italic: Option<PathBuf>,

    /// Draw the header on overflow pages too
    #[arg(long)]
    header_every_page: bool,

    /// Stamp this total in "page X of Y" instead of counting pages
    #[arg(long)]
    fixed_total: Option<usize>,

    /// Logo download timeout in seconds
    #[arg(long, default_value = "5")]
    logo_timeout: u64,
}

fn read(path: &Path) -> Result<Vec<u8>, Error> {
    std::fs::read(path)
        .map_err(|e| Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", e, path.display()))))
}

fn options(args: &Args) -> Result<LayoutOptions, Error> {
    let mut options = LayoutOptions {
        logo_timeout: Duration::from_secs(args.logo_timeout),
        ..LayoutOptions::default()
    };
    if args.header_every_page {
        options.header_policy = HeaderPolicy::EveryPage;
    }
    if let Some(total) = args.fixed_total {
        options.page_total = PageTotal::Fixed(total);
    }
    options.header_background = args.header_image.as_deref().map(read).transpose()?;
    options.footer_background = args.footer_image.as_deref().map(read).transpose()?;
    if let (Some(regular), Some(bold), Some(italic)) = (&args.font_regular, &args.font_bold, &args.font_italic) {
        options.fonts = Some(FontFiles {
            regular: read(regular)?,
            bold: read(bold)?,
            italic: read(italic)?,
        });
    }
    Ok(options)
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let result = options(&args).and_then(|opts| acta_pdf::convert_acta_file(&args.input, &args.output, &opts));
    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
