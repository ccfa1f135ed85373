//! Bounding box types with typed coordinate spaces.
//!
//! Boxes are stored in XYXY form (xmin, ymin, xmax, ymax). The marker
//! type parameter distinguishes absolute pixel coordinates from
//! normalized (0.0 to 1.0) coordinates at compile time, so a pixel box
//! cannot be written into a YOLO label line without an explicit
//! conversion.
//!
//! Note: constructors do NOT enforce that min < max or that normalized
//! values stay inside [0,1]. Malformed boxes pass through unclamped;
//! the check subcommand is where range problems get reported.

use std::fmt;

/// Marker type for absolute pixel coordinates, top-left origin.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pixel {}

/// Marker type for normalized coordinates (fractions of image size).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Normalized {}

/// An axis-aligned bounding box in XYXY format.
#[derive(Clone, Copy, PartialEq)]
pub struct BBox<TSpace> {
    xmin: f64,
    ymin: f64,
    xmax: f64,
    ymax: f64,
    _space: std::marker::PhantomData<TSpace>,
}

impl<TSpace> BBox<TSpace> {
    /// Creates a box from explicit corner coordinates.
    #[inline]
    pub fn from_xyxy(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
            _space: std::marker::PhantomData,
        }
    }

    /// Creates a box from XYWH form, (x, y) being the top-left corner.
    ///
    /// This is the form COCO annotations use.
    #[inline]
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::from_xyxy(x, y, x + width, y + height)
    }

    /// Creates a box from center-form (cx, cy, w, h).
    ///
    /// This is the form YOLO label lines use.
    #[inline]
    pub fn from_cxcywh(cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self::from_xyxy(cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0)
    }

    #[inline]
    pub fn xmin(&self) -> f64 {
        self.xmin
    }

    #[inline]
    pub fn ymin(&self) -> f64 {
        self.ymin
    }

    #[inline]
    pub fn xmax(&self) -> f64 {
        self.xmax
    }

    #[inline]
    pub fn ymax(&self) -> f64 {
        self.ymax
    }

    /// Width of the box. May be negative for malformed input.
    #[inline]
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    /// Height of the box. May be negative for malformed input.
    #[inline]
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Converts to center-form (cx, cy, w, h).
    #[inline]
    pub fn to_cxcywh(&self) -> (f64, f64, f64, f64) {
        (
            (self.xmin + self.xmax) / 2.0,
            (self.ymin + self.ymax) / 2.0,
            self.width(),
            self.height(),
        )
    }

    /// Returns true if all coordinates are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.xmin.is_finite()
            && self.ymin.is_finite()
            && self.xmax.is_finite()
            && self.ymax.is_finite()
    }
}

impl BBox<Pixel> {
    /// Converts pixel coordinates to normalized coordinates.
    pub fn to_normalized(&self, image_width: f64, image_height: f64) -> BBox<Normalized> {
        BBox::from_xyxy(
            self.xmin / image_width,
            self.ymin / image_height,
            self.xmax / image_width,
            self.ymax / image_height,
        )
    }
}

impl BBox<Normalized> {
    /// Converts normalized coordinates back to pixel coordinates.
    pub fn to_pixel(&self, image_width: f64, image_height: f64) -> BBox<Pixel> {
        BBox::from_xyxy(
            self.xmin * image_width,
            self.ymin * image_height,
            self.xmax * image_width,
            self.ymax * image_height,
        )
    }
}

impl<TSpace> fmt::Debug for BBox<TSpace> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BBox")
            .field("xmin", &self.xmin)
            .field("ymin", &self.ymin)
            .field("xmax", &self.xmax)
            .field("ymax", &self.ymax)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_xywh_computes_corners() {
        let bbox: BBox<Pixel> = BBox::from_xywh(10.0, 20.0, 30.0, 40.0);
        assert_eq!(bbox.xmin(), 10.0);
        assert_eq!(bbox.ymin(), 20.0);
        assert_eq!(bbox.xmax(), 40.0);
        assert_eq!(bbox.ymax(), 60.0);
    }

    #[test]
    fn center_form_of_the_worked_example() {
        // Image 100x200, COCO bbox [10, 20, 30, 40].
        let bbox: BBox<Pixel> = BBox::from_xywh(10.0, 20.0, 30.0, 40.0);
        let (cx, cy, w, h) = bbox.to_normalized(100.0, 200.0).to_cxcywh();
        assert!((cx - 0.25).abs() < 1e-12);
        assert!((cy - 0.20).abs() < 1e-12);
        assert!((w - 0.30).abs() < 1e-12);
        assert!((h - 0.20).abs() < 1e-12);
    }

    #[test]
    fn center_form_roundtrip() {
        let original: BBox<Pixel> = BBox::from_xywh(15.0, 25.0, 50.0, 30.0);
        let (cx, cy, w, h) = original.to_normalized(640.0, 480.0).to_cxcywh();
        let restored = BBox::<Normalized>::from_cxcywh(cx, cy, w, h).to_pixel(640.0, 480.0);
        assert!((original.xmin() - restored.xmin()).abs() < 1e-9);
        assert!((original.ymin() - restored.ymin()).abs() < 1e-9);
        assert!((original.xmax() - restored.xmax()).abs() < 1e-9);
        assert!((original.ymax() - restored.ymax()).abs() < 1e-9);
    }

    #[test]
    fn out_of_range_values_are_not_clamped() {
        let bbox: BBox<Pixel> = BBox::from_xywh(90.0, 0.0, 50.0, 10.0);
        let norm = bbox.to_normalized(100.0, 100.0);
        assert!(norm.xmax() > 1.0);
    }

    #[test]
    fn non_finite_detected() {
        let bbox: BBox<Pixel> = BBox::from_xyxy(f64::NAN, 0.0, 1.0, 1.0);
        assert!(!bbox.is_finite());
    }
}
