use super::instruction::Point;

/// Surface size and axis margins, in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Layout {
    pub width: f64,
    pub height: f64,
    /// Space reserved for the vertical axis labels.
    pub left: f64,
    /// Space reserved for the horizontal axis labels.
    pub bottom: f64,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 400.0,
            left: 50.0,
            bottom: 20.0,
        }
    }
}

impl Layout {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn plot_width(&self) -> f64 {
        self.width - self.left
    }

    pub fn plot_height(&self) -> f64 {
        self.height - self.bottom
    }

    /// Strictly right of the vertical axis and above the horizontal one.
    pub fn in_plot(&self, p: Point) -> bool {
        p.x > self.left && p.y < self.plot_height()
    }

    /// Fraction of the plot width under `x`, 0 when left of the axis.
    pub fn cursor_fraction(&self, x: f64) -> f64 {
        let width = self.plot_width();
        if width <= 0.0 {
            return 0.5;
        }
        (x - self.left).max(0.0) / width
    }

    pub fn clamp(&self, p: Point) -> Point {
        Point::new(p.x.clamp(0.0, self.width.max(0.0)), p.y.clamp(0.0, self.height.max(0.0)))
    }
}
