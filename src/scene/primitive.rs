// scene/primitive.rs
use glam::{Vec3, Vec4};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Line,
    Triangle,
    Quad,
}

impl PrimitiveKind {
    pub fn vertex_count(self) -> usize {
        match self {
            PrimitiveKind::Line => 2,
            PrimitiveKind::Triangle => 3,
            PrimitiveKind::Quad => 4,
        }
    }
}

/// Where a primitive takes its color from when it is emitted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrimitiveColor {
    Current,
    Complement,
    Rgba(Vec4),
}

/// Raw line, triangle or quad in the coordinate space of the directive
/// emitting it. Points are counter-clockwise for front faces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Primitive {
    pub kind: PrimitiveKind,
    points: [Vec3; 4],
    pub color: PrimitiveColor,
}

impl Primitive {
    pub fn line(a: Vec3, b: Vec3) -> Self {
        Self {
            kind: PrimitiveKind::Line,
            points: [a, b, Vec3::ZERO, Vec3::ZERO],
            color: PrimitiveColor::Complement,
        }
    }

    pub fn triangle(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self {
            kind: PrimitiveKind::Triangle,
            points: [a, b, c, Vec3::ZERO],
            color: PrimitiveColor::Current,
        }
    }

    pub fn quad(a: Vec3, b: Vec3, c: Vec3, d: Vec3) -> Self {
        Self {
            kind: PrimitiveKind::Quad,
            points: [a, b, c, d],
            color: PrimitiveColor::Current,
        }
    }

    pub fn with_color(mut self, color: PrimitiveColor) -> Self {
        self.color = color;
        self
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points[..self.kind.vertex_count()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_are_trimmed_to_kind() {
        let line = Primitive::line(Vec3::ZERO, Vec3::X);
        assert_eq!(line.points().len(), 2);
        assert_eq!(line.color, PrimitiveColor::Complement);

        let quad = Primitive::quad(Vec3::ZERO, Vec3::X, Vec3::ONE, Vec3::Y);
        assert_eq!(quad.points().len(), 4);
        assert_eq!(quad.color, PrimitiveColor::Current);
    }
}
