//! Cracked-glass decoration geometry.
//!
//! A crack is a fan of radial fractures around an impact point, each with a
//! few short branches. Geometry is generated once per decoration, relative
//! to the impact point, and painted by whatever surface hosts the page.

use rand::Rng;

use crate::render::Point;

const RADIAL_CRACKS: usize = 12;
const MIN_LENGTH: f32 = 100.0;
const LENGTH_JITTER: f32 = 50.0;

/// One straight fracture line, offsets relative to the impact point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrackSegment {
    pub from: Point,
    pub to: Point,
    pub width: f32,
    pub alpha: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrackPattern {
    pub segments: Vec<CrackSegment>,
    /// Radius of the darkened halo behind the cracks
    pub halo_radius: f32,
}

impl CrackPattern {
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        let mut segments = Vec::with_capacity(RADIAL_CRACKS * 5);

        for i in 0..RADIAL_CRACKS {
            let angle = i as f32 * std::f32::consts::PI / 6.0;
            let length = MIN_LENGTH + rng.random::<f32>() * LENGTH_JITTER;
            let (sin, cos) = angle.sin_cos();

            segments.push(CrackSegment {
                from: Point::new(0.0, 0.0),
                to: Point::new(cos * length, sin * length),
                width: 2.0,
                alpha: 0.6,
            });

            let branches = rng.random_range(2..=4);
            for _ in 0..branches {
                let branch_angle = angle + (rng.random::<f32>() - 0.5) * 0.5;
                let branch_length = length * 0.4;
                let start = length * 0.3 + rng.random::<f32>() * length * 0.4;
                let origin = Point::new(cos * start, sin * start);
                segments.push(CrackSegment {
                    from: origin,
                    to: Point::new(
                        origin.x + branch_angle.cos() * branch_length,
                        origin.y + branch_angle.sin() * branch_length,
                    ),
                    width: 1.0,
                    alpha: 0.3,
                });
            }
        }

        Self {
            segments,
            halo_radius: MIN_LENGTH + LENGTH_JITTER,
        }
    }
}
