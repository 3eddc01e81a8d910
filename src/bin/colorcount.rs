use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use colorcount::{Attributes, ColorCount, Treemap};
use std::path::PathBuf;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Array of {color, rgb, count, percentage} objects
    Json,
    /// One color per line
    Text,
    /// Treemap of the colors
    Svg,
}

/// Lists the dominant colors of PNG images.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// One or more PNG files
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Maximum number of colors to list
    #[arg(short = 'n', long, default_value_t = 20)]
    max_colors: usize,

    /// Group similar shades with median cut; -n is then the palette size (2-256)
    #[arg(long)]
    palette: bool,

    /// Levels per channel (1-256); lower values merge similar shades
    #[arg(short, long, default_value_t = 32)]
    precision: u16,

    /// Pixels with lower alpha are ignored (1-255)
    #[arg(long, default_value_t = colorcount::DEFAULT_MIN_OPACITY)]
    min_opacity: u8,

    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Treemap size for SVG output
    #[arg(long, default_value = "400x300", value_parser = parse_size)]
    size: (f64, f64),

    /// Print progress messages to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn parse_size(s: &str) -> Result<(f64, f64)> {
    let Some((w, h)) = s.split_once(['x', 'X']) else {
        bail!("expected WIDTHxHEIGHT, e.g. 400x300");
    };
    Ok((w.trim().parse().context("bad width")?, h.trim().parse().context("bad height")?))
}

impl Args {
    fn check(&self) -> Result<()> {
        if self.palette && !(2..=colorcount::MAX_PALETTE_COLORS).contains(&self.max_colors) {
            bail!("--palette needs 2 to {} colors", colorcount::MAX_PALETTE_COLORS);
        }
        if self.format == Format::Svg && self.inputs.len() > 1 {
            bail!("--format svg takes one input at a time, got {}", self.inputs.len());
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    args.check()?;

    let mut attr = Attributes::new();
    if args.verbose {
        attr.set_log_callback(|_, msg| eprintln!("{msg}"));
    }
    attr.set_max_colors(args.max_colors)?;
    attr.set_color_precision(args.precision).context("--precision must be between 1 and 256")?;
    attr.set_min_opacity(args.min_opacity).context("--min-opacity must be between 1 and 255")?;

    let mut results = Vec::with_capacity(args.inputs.len());
    for input in &args.inputs {
        let bitmap = lodepng::decode32_file(input)
            .with_context(|| format!("can't decode {}", input.display()))?;
        if args.verbose {
            eprintln!("{}: {}x{}", input.display(), bitmap.width, bitmap.height);
        }
        let image = attr.new_image_borrowed(&bitmap.buffer, bitmap.width, bitmap.height);
        let res = if args.palette { attr.palette(&image, args.max_colors) } else { attr.quantize(&image) };
        let res = res.with_context(|| format!("can't count colors of {}", input.display()))?;
        results.push((input, res.into_colors()));
    }

    match args.format {
        Format::Json => println!("{}", to_json(&results)?),
        Format::Text => {
            for (input, colors) in &results {
                if results.len() > 1 {
                    println!("{}:", input.display());
                }
                for c in colors {
                    println!("{}  rgb({:>3},{:>3},{:>3})  {:>6.2}%  {}", c.color, c.rgb.r, c.rgb.g, c.rgb.b, c.percentage, c.count);
                }
            }
        },
        Format::Svg => {
            let (width, height) = args.size;
            let treemap = Treemap::new(width, height).context("--size must be non-negative")?;
            if let [(_, colors)] = &results[..] {
                print!("{}", treemap.render_svg(colors));
            }
        },
    }
    Ok(())
}

/// An array of colors for one input, an object keyed by path for more
fn to_json(results: &[(&PathBuf, Vec<ColorCount>)]) -> Result<String> {
    if let [(_, colors)] = results {
        return Ok(serde_json::to_string_pretty(colors)?);
    }
    let by_path: serde_json::Map<_, _> = results.iter()
        .map(|(path, colors)| -> Result<(String, serde_json::Value)> {
            Ok((path.display().to_string(), serde_json::to_value(colors)?))
        })
        .collect::<Result<_>>()?;
    Ok(serde_json::to_string_pretty(&by_path)?)
}

#[test]
fn sizes() {
    assert_eq!((400., 300.), parse_size("400x300").unwrap());
    assert_eq!((12., 7.5), parse_size(" 12 X 7.5").unwrap());
    assert!(parse_size("400").is_err());
    assert!(parse_size("wide x tall").is_err());
}

#[test]
fn json_per_input() {
    use serde_json::json;

    let red = colorcount::quantize(&[255, 0, 0, 255, 255, 0, 0, 255], 2, 1, 20, 32).unwrap();
    let blue = colorcount::quantize(&[0, 0, 255, 255], 1, 1, 20, 32).unwrap();
    let (a, b) = (PathBuf::from("a.png"), PathBuf::from("b.png"));

    let one: serde_json::Value = serde_json::from_str(&to_json(&[(&a, red.clone())]).unwrap()).unwrap();
    assert_eq!(json!([{"color": "#f80000", "rgb": [248, 0, 0], "count": 2, "percentage": 100.0}]), one);

    let two: serde_json::Value = serde_json::from_str(&to_json(&[(&a, red), (&b, blue)]).unwrap()).unwrap();
    assert_eq!(json!({
        "a.png": [{"color": "#f80000", "rgb": [248, 0, 0], "count": 2, "percentage": 100.0}],
        "b.png": [{"color": "#0000f8", "rgb": [0, 0, 248], "count": 1, "percentage": 100.0}],
    }), two);
}

#[test]
fn svg_takes_one_input() {
    let args = Args::try_parse_from(["colorcount", "-f", "svg", "a.png", "b.png"]).unwrap();
    assert!(args.check().is_err());
    let args = Args::try_parse_from(["colorcount", "-f", "svg", "--size", "80x60", "a.png"]).unwrap();
    args.check().unwrap();
    assert_eq!((80., 60.), args.size);
    let args = Args::try_parse_from(["colorcount", "a.png", "b.png"]).unwrap();
    args.check().unwrap();
}

#[test]
fn palette_size() {
    let args = Args::try_parse_from(["colorcount", "--palette", "-n", "1", "a.png"]).unwrap();
    assert!(args.check().is_err());
    let args = Args::try_parse_from(["colorcount", "--palette", "-n", "10", "a.png"]).unwrap();
    args.check().unwrap();
    assert!(args.palette);
}
