//! Capture guide alignment.
//!
//! A detected face counts as aligned when it is the only face, its width is
//! between 55% and 95% of the guide width, its centre is within the
//! tolerance of the guide centre, and its box stays inside the guide grown
//! by the tolerance.

use serde::Serialize;

use super::FaceRegion;

/// Default slack around the guide, in preview pixels
pub const DEFAULT_TOLERANCE: f64 = 60.0;

const MIN_WIDTH_RATIO: f64 = 0.55;
const MAX_WIDTH_RATIO: f64 = 0.95;

/// Result of checking detected faces against the guide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    NoFace,
    MultipleFaces,
    TooFar,
    TooClose,
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    OutsideGuide,
    Aligned,
}

impl Alignment {
    pub fn is_aligned(&self) -> bool {
        matches!(self, Self::Aligned)
    }

    /// Guidance for the user
    pub fn hint(&self) -> &'static str {
        match self {
            Self::NoFace => "No face detected",
            Self::MultipleFaces => "More than one face detected",
            Self::TooFar => "Face too far, move closer to the camera",
            Self::TooClose => "Face too close, move away from the camera",
            Self::MoveLeft => "Move to the left",
            Self::MoveRight => "Move to the right",
            Self::MoveUp => "Move up",
            Self::MoveDown => "Move down",
            Self::OutsideGuide => "Place your face inside the oval",
            Self::Aligned => "Perfect position",
        }
    }
}

/// Oval capture guide shown over the camera preview
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceGuide {
    bounds: FaceRegion,
    tolerance: f64,
}

impl FaceGuide {
    pub fn new(bounds: FaceRegion) -> Self {
        Self {
            bounds,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn assess(&self, faces: &[FaceRegion]) -> Alignment {
        let face = match faces {
            [] => return Alignment::NoFace,
            [face] => face,
            _ => return Alignment::MultipleFaces,
        };

        let guide = &self.bounds;
        if face.width < guide.width * MIN_WIDTH_RATIO {
            return Alignment::TooFar;
        }
        if face.width > guide.width * MAX_WIDTH_RATIO {
            return Alignment::TooClose;
        }

        let (face_x, face_y) = face.center();
        let (guide_x, guide_y) = guide.center();

        if (face_x - guide_x).abs() >= self.tolerance {
            return if face_x < guide_x {
                Alignment::MoveRight
            } else {
                Alignment::MoveLeft
            };
        }
        if (face_y - guide_y).abs() >= self.tolerance {
            return if face_y < guide_y {
                Alignment::MoveDown
            } else {
                Alignment::MoveUp
            };
        }

        let t = self.tolerance;
        let inside = face.x >= guide.x - t
            && face.x + face.width <= guide.x + guide.width + t
            && face.y >= guide.y - t
            && face.y + face.height <= guide.y + guide.height + t;
        if !inside {
            return Alignment::OutsideGuide;
        }

        Alignment::Aligned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guide() -> FaceGuide {
        FaceGuide::new(FaceRegion {
            x: 100.0,
            y: 100.0,
            width: 280.0,
            height: 360.0,
        })
    }

    fn face(cx: f64, cy: f64, width: f64, height: f64) -> FaceRegion {
        FaceRegion {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
        }
    }

    #[test]
    fn counts_faces_first() {
        assert_eq!(guide().assess(&[]), Alignment::NoFace);
        let f = face(240.0, 280.0, 200.0, 240.0);
        assert_eq!(guide().assess(&[f, f]), Alignment::MultipleFaces);
    }

    #[test]
    fn size_bounds() {
        assert_eq!(guide().assess(&[face(240.0, 280.0, 100.0, 120.0)]), Alignment::TooFar);
        assert_eq!(guide().assess(&[face(240.0, 280.0, 270.0, 300.0)]), Alignment::TooClose);
    }

    #[test]
    fn direction_hints_point_toward_the_guide() {
        assert_eq!(guide().assess(&[face(150.0, 280.0, 200.0, 240.0)]), Alignment::MoveRight);
        assert_eq!(guide().assess(&[face(330.0, 280.0, 200.0, 240.0)]), Alignment::MoveLeft);
        assert_eq!(guide().assess(&[face(240.0, 200.0, 200.0, 240.0)]), Alignment::MoveDown);
        assert_eq!(guide().assess(&[face(240.0, 360.0, 200.0, 240.0)]), Alignment::MoveUp);
    }

    #[test]
    fn tall_face_spills_outside() {
        let tall = face(240.0, 280.0, 200.0, 520.0);
        assert_eq!(guide().assess(&[tall]), Alignment::OutsideGuide);
    }

    #[test]
    fn centred_face_is_aligned() {
        let result = guide().assess(&[face(250.0, 270.0, 200.0, 240.0)]);
        assert!(result.is_aligned());
        assert_eq!(result.hint(), "Perfect position");
    }
}
