use crate::utils::frame::Frame;
use rand::distributions::Uniform;
use rand::prelude::ThreadRng;
use rand::Rng;

/// Smooth multi-frequency texture translated by `(dx, dy)`.
///
/// Content that sits at `(x, y)` in the untranslated frame appears at
/// `(x + dx, y + dy)`, which gives optical-flow tests a known displacement.
pub fn textured_frame(width: usize, height: usize, dx: f32, dy: f32) -> Frame {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let (sx, sy) = (x as f32 - dx, y as f32 - dy);
            let v = 0.5
                + 0.2 * (0.4 * sx).sin() * (0.3 * sy).cos()
                + 0.15 * (0.23 * sx + 0.31 * sy).sin()
                + 0.1 * (0.17 * sx - 0.29 * sy).cos();
            data.push(v);
        }
    }
    Frame::from_intensity(width, height, data).unwrap()
}

/// Dark frame with Gaussian blobs at the given centers. Blob rims produce
/// strong corner responses for detector tests.
pub fn blobs_frame(width: usize, height: usize, centers: &[(f32, f32)]) -> Frame {
    let sigma2 = 2.0 * 2.0f32;
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let mut v = 0.0;
            for (cx, cy) in centers {
                let d2 = (x as f32 - cx).powi(2) + (y as f32 - cy).powi(2);
                v += (-d2 / (2.0 * sigma2)).exp();
            }
            data.push(v.min(1.0));
        }
    }
    Frame::from_intensity(width, height, data).unwrap()
}

/// Finite sequence of textured frames drifting at a constant velocity.
pub struct TexturedScene {
    width: usize,
    height: usize,
    velocity: (f32, f32),
    tick: usize,
    remaining: usize,
}

impl TexturedScene {
    pub fn new(width: usize, height: usize, velocity: (f32, f32), frames: usize) -> Self {
        Self {
            width,
            height,
            velocity,
            tick: 0,
            remaining: frames,
        }
    }
}

impl Iterator for TexturedScene {
    type Item = Frame;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let t = self.tick as f32;
        self.tick += 1;
        Some(textured_frame(
            self.width,
            self.height,
            self.velocity.0 * t,
            self.velocity.1 * t,
        ))
    }
}

/// Endless sequence of blob frames whose centers drift with uniform jitter.
pub struct DriftingBlobsScene {
    width: usize,
    height: usize,
    centers: Vec<(f32, f32)>,
    velocity: (f32, f32),
    gen: ThreadRng,
    jitter: Option<Uniform<f32>>,
}

impl DriftingBlobsScene {
    pub fn new(
        width: usize,
        height: usize,
        centers: Vec<(f32, f32)>,
        velocity: (f32, f32),
        jitter: f32,
    ) -> Self {
        Self {
            width,
            height,
            centers,
            velocity,
            gen: rand::thread_rng(),
            jitter: (jitter > 0.0).then(|| Uniform::new(-jitter, jitter)),
        }
    }
}

impl Iterator for DriftingBlobsScene {
    type Item = Frame;

    fn next(&mut self) -> Option<Self::Item> {
        let frame = blobs_frame(self.width, self.height, &self.centers);
        for c in &mut self.centers {
            c.0 += self.velocity.0;
            c.1 += self.velocity.1;
            if let Some(j) = &self.jitter {
                c.0 += self.gen.sample(j);
                c.1 += self.gen.sample(j);
            }
        }
        Some(frame)
    }
}
