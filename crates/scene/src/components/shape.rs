/// Pick volume in the entity's local space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Shape {
    Sphere { radius: f64 },
    /// Quad in the local XY plane, centred on the origin.
    Quad { width: f64, height: f64 },
}

impl Shape {
    pub fn sphere(radius: f64) -> Self {
        Shape::Sphere { radius }
    }

    pub fn quad(size: f64) -> Self {
        Shape::Quad {
            width: size,
            height: size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Shape;

    #[test]
    fn square_quad_helper() {
        assert_eq!(
            Shape::quad(2.0),
            Shape::Quad {
                width: 2.0,
                height: 2.0
            }
        );
    }
}
