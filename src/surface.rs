use std::fmt;

/// Backing-store dimensions in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for PixelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A drawable element whose backing store is sized independently of its
/// displayed CSS size.
pub trait DisplaySurface {
    /// Displayed size in CSS pixels.
    fn css_size(&self) -> (f64, f64);
    fn device_pixel_ratio(&self) -> f64;
    fn backing_size(&self) -> PixelSize;
    fn set_backing_size(&mut self, size: PixelSize);
}

/// Backing size that matches the surface's displayed size at its current
/// device pixel ratio. Fractional products are truncated the way a canvas
/// truncates assignments to `width`/`height`.
pub fn desired_backing_size<S: DisplaySurface + ?Sized>(surface: &S) -> PixelSize {
    let (css_width, css_height) = surface.css_size();
    let ratio = surface.device_pixel_ratio();
    PixelSize::new(to_device_pixels(css_width, ratio), to_device_pixels(css_height, ratio))
}

fn to_device_pixels(css: f64, ratio: f64) -> u32 {
    let value = css * ratio;
    if value.is_finite() && value > 0.0 {
        // `as` saturates at u32::MAX.
        value as u32
    } else {
        0
    }
}

/// Applies the desired backing size if it differs from the current one.
/// Returns the new size when a change was made.
pub fn fit_to_display<S: DisplaySurface + ?Sized>(surface: &mut S) -> Option<PixelSize> {
    let desired = desired_backing_size(surface);
    if desired == surface.backing_size() {
        return None;
    }
    surface.set_backing_size(desired);
    Some(desired)
}

/// Applies the desired backing size unconditionally. Used once at startup,
/// before the rendering module exists.
pub fn initial_fit<S: DisplaySurface + ?Sized>(surface: &mut S) -> PixelSize {
    let desired = desired_backing_size(surface);
    surface.set_backing_size(desired);
    desired
}

/// In-memory surface with a settable layout, for headless runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualSurface {
    css_width: f64,
    css_height: f64,
    ratio: f64,
    backing: PixelSize,
}

impl VirtualSurface {
    /// A surface displayed at `css_width` x `css_height` whose backing store
    /// has not been sized yet.
    pub fn new(css_width: f64, css_height: f64, ratio: f64) -> Self {
        Self {
            css_width,
            css_height,
            ratio,
            backing: PixelSize::default(),
        }
    }

    /// Changes the displayed layout without touching the backing store,
    /// like a browser reflow before its `resize` event is handled.
    pub fn set_layout(&mut self, css_width: f64, css_height: f64) {
        self.css_width = css_width;
        self.css_height = css_height;
    }

    pub fn set_device_pixel_ratio(&mut self, ratio: f64) {
        self.ratio = ratio;
    }
}

impl DisplaySurface for VirtualSurface {
    fn css_size(&self) -> (f64, f64) {
        (self.css_width, self.css_height)
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.ratio
    }

    fn backing_size(&self) -> PixelSize {
        self.backing
    }

    fn set_backing_size(&mut self, size: PixelSize) {
        self.backing = size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backing_size_scales_by_pixel_ratio() {
        let mut surface = VirtualSurface::new(800.0, 600.0, 2.0);
        assert_eq!(fit_to_display(&mut surface), Some(PixelSize::new(1600, 1200)));
        assert_eq!(surface.backing_size(), PixelSize::new(1600, 1200));
        assert_eq!(fit_to_display(&mut surface), None);
    }

    #[test]
    fn fractional_products_truncate_and_stay_stable() {
        let mut surface = VirtualSurface::new(333.0, 101.0, 1.5);
        assert_eq!(fit_to_display(&mut surface), Some(PixelSize::new(499, 151)));
        assert_eq!(fit_to_display(&mut surface), None);
    }

    #[test]
    fn initial_fit_writes_even_when_unchanged() {
        let mut surface = VirtualSurface::new(0.0, 0.0, 1.0);
        assert_eq!(initial_fit(&mut surface), PixelSize::new(0, 0));
        surface.set_layout(10.0, 20.0);
        assert_eq!(initial_fit(&mut surface), PixelSize::new(10, 20));
    }

    #[test]
    fn degenerate_inputs_clamp_to_zero() {
        let surface = VirtualSurface::new(-5.0, f64::NAN, 2.0);
        assert_eq!(desired_backing_size(&surface), PixelSize::new(0, 0));
    }

    #[test]
    fn ratio_change_alone_triggers_a_refit() {
        let mut surface = VirtualSurface::new(400.0, 300.0, 1.0);
        initial_fit(&mut surface);
        surface.set_device_pixel_ratio(3.0);
        assert_eq!(fit_to_display(&mut surface), Some(PixelSize::new(1200, 900)));
    }
}
