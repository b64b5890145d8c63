use std::fs::File;
use std::io::{ self, BufWriter, Write };
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use rayshade::camera::Camera;
use rayshade::canvas::ImageWriter;
use rayshade::color::Color;
use rayshade::consts::{ NUM_THREADS, OUT_FILE };
use rayshade::parallel::render_parallel;
use rayshade::scene::Scene;

/// The scene rendered when no scene file is given.
const DEMO_SCENE: &str = include_str!("../scenes/demo.json");

/// Longest line allowed in a PPM file.
const PPM_LINE_WIDTH: usize = 70;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// JSON scene description. Renders a built-in demo scene if omitted.
    scene: Option<PathBuf>,

    /// Where to write the rendered PPM image.
    #[clap(short, long, default_value = OUT_FILE)]
    output: PathBuf,

    /// Number of render threads.
    #[clap(short, long, default_value_t = NUM_THREADS)]
    threads: usize,

    /// Override the canvas width from the scene.
    #[clap(long)]
    width: Option<usize>,

    /// Override the canvas height from the scene.
    #[clap(long)]
    height: Option<usize>,
}

/// Writes plain (P3) PPM images.
///
/// Components are scaled to 0..=255 and clamped. Each canvas row starts a new
/// line, and no line exceeds 70 columns.
struct PpmWriter<W: Write> {
    out: W,
}

impl<W: Write> PpmWriter<W> {
    fn new(out: W) -> PpmWriter<W> {
        PpmWriter { out }
    }
}

fn scale_component(c: f64) -> u8 {
    (c * 255.0).round().clamp(0.0, 255.0) as u8
}

impl<W: Write> ImageWriter for PpmWriter<W> {
    type Error = io::Error;

    fn write(&mut self, width: usize, height: usize,
        pixel_at: &dyn Fn(usize, usize) -> Color) -> io::Result<()> {
        // Write PPM header, as well as metadata
        writeln!(self.out, "P3")?;
        writeln!(self.out, "{} {}", width, height)?;
        writeln!(self.out, "255")?;

        for y in 0..height {
            let mut col = 0;
            for x in 0..width {
                let c = pixel_at(x, y);
                for component in [c.r, c.g, c.b] {
                    let s = scale_component(component).to_string();

                    if col > 0 && col + 1 + s.len() > PPM_LINE_WIDTH {
                        writeln!(self.out)?;
                        col = 0;
                    } else if col > 0 {
                        write!(self.out, " ")?;
                        col += 1;
                    }

                    write!(self.out, "{}", s)?;
                    col += s.len();
                }
            }

            writeln!(self.out)?;
        }

        self.out.flush()
    }
}

fn load_scene(args: &Args) -> anyhow::Result<Scene> {
    let mut scene = match args.scene {
        Some(ref path) => {
            let file = File::open(path)
                .with_context(|| format!("opening scene {}", path.display()))?;
            Scene::from_reader(io::BufReader::new(file))
                .with_context(|| format!("loading scene {}", path.display()))?
        },
        None => {
            log::info!("No scene given; rendering the built-in demo");
            Scene::from_json(DEMO_SCENE)?
        },
    };

    if args.width.is_some() || args.height.is_some() {
        let resized = Camera::new(
            args.width.unwrap_or(scene.camera.hsize()),
            args.height.unwrap_or(scene.camera.vsize()),
            scene.camera.field_of_view(),
        )?.with_transform(*scene.camera.transform())?;

        scene.camera = resized;
    }

    Ok(scene)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let scene = load_scene(&args)?;
    let canvas = render_parallel(&scene.camera, &scene.world, args.threads)?;

    let out = File::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    canvas.write_to(&mut PpmWriter::new(BufWriter::new(out)))
        .with_context(|| format!("writing {}", args.output.display()))?;

    log::info!("Saved render to {}.", args.output.display());
    Ok(())
}

#[test]
fn ppm_header_and_pixels() {
    let mut canvas = rayshade::canvas::Canvas::new(5, 3);
    canvas.write_pixel(0, 0, &Color::rgb(1.5, 0.0, 0.0));
    canvas.write_pixel(2, 1, &Color::rgb(0.0, 0.5, 0.0));
    canvas.write_pixel(4, 2, &Color::rgb(-0.5, 0.0, 1.0));

    let mut writer = PpmWriter::new(Vec::new());
    canvas.write_to(&mut writer).unwrap();
    let ppm = String::from_utf8(writer.out).unwrap();

    assert_eq!(ppm, "P3\n5 3\n255\n\
        255 0 0 0 0 0 0 0 0 0 0 0 0 0 0\n\
        0 0 0 0 0 0 0 128 0 0 0 0 0 0 0\n\
        0 0 0 0 0 0 0 0 0 0 0 0 0 0 255\n");
}

#[test]
fn ppm_lines_are_wrapped() {
    let mut canvas = rayshade::canvas::Canvas::new(10, 2);
    for y in 0..2 {
        for x in 0..10 {
            canvas.write_pixel(x, y, &Color::rgb(1.0, 0.8, 0.6));
        }
    }

    let mut writer = PpmWriter::new(Vec::new());
    canvas.write_to(&mut writer).unwrap();
    let ppm = String::from_utf8(writer.out).unwrap();
    let lines: Vec<&str> = ppm.lines().skip(3).collect();

    assert_eq!(lines, vec![
        "255 204 153 255 204 153 255 204 153 255 204 153 255 204 153 255 204",
        "153 255 204 153 255 204 153 255 204 153 255 204 153",
        "255 204 153 255 204 153 255 204 153 255 204 153 255 204 153 255 204",
        "153 255 204 153 255 204 153 255 204 153 255 204 153",
    ]);
}
