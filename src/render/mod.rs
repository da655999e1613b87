pub mod layout;
pub mod glass;
pub mod animator;

/// A point in page or viewport space, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Bounding box for a laid-out node
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl LayoutBox {
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains_y(&self, y: f32) -> bool {
        y >= self.y && y < self.bottom()
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &LayoutBox) -> LayoutBox {
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = (self.x + self.width).max(other.x + other.width);
        let y1 = self.bottom().max(other.bottom());
        LayoutBox {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        }
    }

    pub fn translate(&self, dx: f32, dy: f32) -> LayoutBox {
        LayoutBox {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

/// The visible window onto the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub scroll_x: f32,
    pub scroll_y: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }

    pub fn scroll_offset(&self) -> Point {
        Point::new(self.scroll_x, self.scroll_y)
    }

    /// Viewport coordinates → page-absolute coordinates.
    pub fn to_page(&self, client: Point) -> Point {
        Point::new(client.x + self.scroll_x, client.y + self.scroll_y)
    }

    /// Page-absolute coordinates → viewport coordinates.
    pub fn to_client(&self, page: Point) -> Point {
        Point::new(page.x - self.scroll_x, page.y - self.scroll_y)
    }

    /// Scroll vertically by `dy`, clamped to the page.
    pub fn scroll_by(&mut self, dy: f32, page_height: f32) {
        let max = (page_height - self.height).max(0.0);
        self.scroll_y = (self.scroll_y + dy).clamp(0.0, max);
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 800.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_to_page_adds_scroll() {
        let mut vp = Viewport::new(800.0, 600.0);
        vp.scroll_y = 50.0;
        assert_eq!(vp.to_page(Point::new(100.0, 200.0)), Point::new(100.0, 250.0));
        assert_eq!(vp.to_client(Point::new(100.0, 250.0)), Point::new(100.0, 200.0));
    }

    #[test]
    fn scroll_is_clamped_to_page() {
        let mut vp = Viewport::new(800.0, 600.0);
        vp.scroll_by(-40.0, 2000.0);
        assert_eq!(vp.scroll_y, 0.0);
        vp.scroll_by(5000.0, 2000.0);
        assert_eq!(vp.scroll_y, 1400.0);
    }
}
