use crate::Errors;
use anyhow::Result;

/// Single-channel intensity frame, row-major f32 pixels.
///
/// All spatial math in the crate (corner scoring, patch sampling, optical
/// flow) runs on this representation; color conversion happens once at
/// construction.
#[derive(Clone, Debug)]
pub struct Frame {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl Frame {
    pub fn from_intensity(width: usize, height: usize, data: Vec<f32>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Errors::EmptyFrame.into());
        }
        if data.len() != width * height {
            return Err(Errors::FrameShape {
                width,
                height,
                got: data.len(),
            }
            .into());
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn from_luma8(width: usize, height: usize, data: &[u8]) -> Result<Self> {
        Self::from_intensity(
            width,
            height,
            data.iter().map(|v| *v as f32 / 255.0).collect(),
        )
    }

    /// Interleaved RGB input, converted with BT.601 luma weights.
    pub fn from_rgb8(width: usize, height: usize, data: &[u8]) -> Result<Self> {
        if data.len() != width * height * 3 {
            return Err(Errors::FrameShape {
                width,
                height,
                got: data.len() / 3,
            }
            .into());
        }
        let luma = data
            .chunks_exact(3)
            .map(|px| {
                (0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32) / 255.0
            })
            .collect();
        Self::from_intensity(width, height, luma)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[f32] {
        &self.data
    }

    /// Pixel access with coordinates clamped to the frame border.
    pub fn get(&self, x: i64, y: i64) -> f32 {
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        self.data[y * self.width + x]
    }

    /// Bilinear sample at a fractional position, clamped at borders.
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let p00 = self.get(x0, y0);
        let p10 = self.get(x0 + 1, y0);
        let p01 = self.get(x0, y0 + 1);
        let p11 = self.get(x0 + 1, y0 + 1);

        (1.0 - fy) * ((1.0 - fx) * p00 + fx * p10) + fy * ((1.0 - fx) * p01 + fx * p11)
    }

    /// Halves both dimensions with a 2x2 box filter. Used to build flow
    /// pyramids.
    pub fn downsample_half(&self) -> Frame {
        let width = (self.width / 2).max(1);
        let height = (self.height / 2).max(1);
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let (sx, sy) = (2 * x as i64, 2 * y as i64);
                let acc = self.get(sx, sy)
                    + self.get(sx + 1, sy)
                    + self.get(sx, sy + 1)
                    + self.get(sx + 1, sy + 1);
                data.push(acc / 4.0);
            }
        }
        Frame {
            width,
            height,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::utils::frame::Frame;
    use crate::EPS;

    #[test]
    fn shape_validation() {
        assert!(Frame::from_intensity(2, 2, vec![0.0; 3]).is_err());
        assert!(Frame::from_intensity(0, 2, vec![]).is_err());
        assert!(Frame::from_intensity(2, 2, vec![0.0; 4]).is_ok());
    }

    #[test]
    fn luma_weights() {
        let f = Frame::from_rgb8(1, 1, &[255, 0, 0]).unwrap();
        assert!((f.get(0, 0) - 0.299).abs() < EPS);
        let f = Frame::from_rgb8(1, 1, &[0, 255, 0]).unwrap();
        assert!((f.get(0, 0) - 0.587).abs() < EPS);
    }

    #[test]
    fn bilinear_interpolates() {
        let f = Frame::from_intensity(2, 1, vec![0.0, 1.0]).unwrap();
        assert!((f.sample(0.25, 0.0) - 0.25).abs() < EPS);
        assert!((f.sample(0.75, 0.0) - 0.75).abs() < EPS);
    }

    #[test]
    fn clamped_access() {
        let f = Frame::from_intensity(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(f.get(-5, -5), 1.0);
        assert_eq!(f.get(10, 10), 4.0);
    }

    #[test]
    fn downsample_averages() {
        let f = Frame::from_intensity(2, 2, vec![0.0, 1.0, 1.0, 2.0]).unwrap();
        let d = f.downsample_half();
        assert_eq!(d.width(), 1);
        assert_eq!(d.height(), 1);
        assert!((d.get(0, 0) - 1.0).abs() < EPS);
    }
}
