use crate::color::Color;

/// A sink for finished images.
///
/// The core never writes files itself. A writer is handed the canvas
/// dimensions and a lookup for every pixel, and decides how to encode them.
pub trait ImageWriter {
    type Error;

    fn write(&mut self, width: usize, height: usize,
        pixel_at: &dyn Fn(usize, usize) -> Color)
        -> std::result::Result<(), Self::Error>;
}

/// A canvas for drawing pixels.
///
/// This structure mostly stores the results of the ray tracer. Once the user
/// specifies the desired image width and height, the `Camera` generates rays
/// which are cast onto a `World`'s objects.
///
/// Colors are stored unclamped; clamping is up to the `ImageWriter`.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct Canvas {
    width: usize,
    height: usize,

    /// The pixels of the canvas, stored as a flattened row-major vector.
    pixels: Vec<Color>,
}

impl Canvas {
    /// Creates a new black canvas with specified width and height.
    pub fn new(width: usize, height: usize) -> Canvas {
        Canvas {
            width,
            height,
            pixels: vec![Color::black(); width * height]
        }
    }

    /// The width of the canvas, in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The height of the canvas, in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Writes a color to a location on the `Canvas`.
    ///
    /// Out-of-bounds pixels are ignored. Pixels are specified in row-column
    /// order, where `y` is the row of the pixel, and `x` is the column. Rows
    /// and columns are zero-indexed.
    ///
    /// # Examples
    ///
    /// Writing a pixel to the fourth column, second row on an 8-by-8 canvas:
    ///
    /// ```
    /// # use rayshade::color::Color;
    /// # use rayshade::canvas::Canvas;
    /// let purple = Color::rgb(1.0, 0.0, 1.0);
    /// let mut canvas = Canvas::new(8, 8);
    /// canvas.write_pixel(4, 2, &purple);
    /// assert_eq!(canvas.read_pixel(4, 2).unwrap(), purple);
    /// ```
    pub fn write_pixel(&mut self, x: usize, y: usize, pixel: &Color) {
        // Silently ignore out-of-bounds pixels
        if x >= self.width || y >= self.height {
            return;
        }

        self.pixels[(y * self.width) + x] = *pixel;
    }

    /// Reads a color from a location on the `Canvas`.
    ///
    /// If the specified pixel location is out-of-bounds, `None` is returned.
    pub fn read_pixel(&self, x: usize, y: usize) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None
        }

        Some(self.pixels[(y * self.width) + x])
    }

    /// Iterates over pixels as `(x, y, color)`, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Color)> + '_ {
        let width = self.width;
        self.pixels.iter().enumerate()
            .map(move |(i, c)| (i % width, i / width, *c))
    }

    /// The raw pixel buffer, for writers that fill whole rows at once.
    pub(crate) fn pixels_mut(&mut self) -> &mut [Color] {
        &mut self.pixels
    }

    /// Hands the canvas to an image writer.
    pub fn write_to<W: ImageWriter>(&self, writer: &mut W)
        -> std::result::Result<(), W::Error> {
        let pixel_at = |x: usize, y: usize| {
            self.read_pixel(x, y).unwrap_or_default()
        };

        writer.write(self.width, self.height, &pixel_at)
    }
}

#[cfg(test)]
struct CollectingWriter {
    seen: Vec<(usize, usize, Color)>,
}

#[cfg(test)]
impl ImageWriter for CollectingWriter {
    type Error = ();

    fn write(&mut self, width: usize, height: usize,
        pixel_at: &dyn Fn(usize, usize) -> Color) -> Result<(), ()> {
        for y in 0..height {
            for x in 0..width {
                self.seen.push((x, y, pixel_at(x, y)));
            }
        }

        Ok(())
    }
}

#[test]
fn new_canvas_is_black() {
    let c = Canvas::new(10, 20);

    assert_eq!(c.width(), 10);
    assert_eq!(c.height(), 20);
    assert!(c.iter().all(|(_, _, p)| p == Color::black()));
}

#[test]
fn out_of_bounds_pixels() {
    let mut c = Canvas::new(4, 3);
    c.write_pixel(4, 0, &Color::red());
    c.write_pixel(0, 3, &Color::red());

    assert!(c.read_pixel(4, 0).is_none());
    assert!(c.iter().all(|(_, _, p)| p == Color::black()));
}

#[test]
fn pixels_are_not_clamped() {
    let mut c = Canvas::new(2, 2);
    c.write_pixel(1, 1, &Color::rgb(1.5, -0.5, 0.0));

    assert_eq!(c.read_pixel(1, 1).unwrap(), Color::rgb(1.5, -0.5, 0.0));
}

#[test]
fn iter_walks_rows_in_order() {
    let mut c = Canvas::new(2, 2);
    c.write_pixel(1, 0, &Color::red());
    c.write_pixel(0, 1, &Color::green());

    let pixels: Vec<_> = c.iter().collect();
    assert_eq!(pixels, vec![
        (0, 0, Color::black()),
        (1, 0, Color::red()),
        (0, 1, Color::green()),
        (1, 1, Color::black()),
    ]);
}

#[test]
fn write_to_visits_every_pixel() {
    let mut c = Canvas::new(3, 2);
    c.write_pixel(2, 1, &Color::blue());

    let mut writer = CollectingWriter { seen: Vec::new() };
    c.write_to(&mut writer).unwrap();

    assert_eq!(writer.seen.len(), 6);
    assert_eq!(writer.seen[5], (2, 1, Color::blue()));
}
