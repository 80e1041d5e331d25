//! Renderer interface and a CPU rasteriser.
//!
//! The tick thread owns exactly one [`Renderer`]. It is handed the world
//! and a [`Camera`] and fills a [`Frame`] with rows stored bottom-up, the
//! read-back order of a graphics context. Callers flip rows before handing
//! pixels to clients.
//!
//! [`RasterRenderer`] needs no GPU: it paints the screen-space rectangle of
//! every displayed ground and cube far-to-near in its fill colour. That is
//! enough for view requests to carry pose-dependent pixels and for the
//! capture barrier to be exercised end to end.

use glam::{Mat4, Vec3, Vec4};

use cubeworld_agents::Cube;
use cubeworld_world::{CameraPreset, kinematics};

use crate::world::World;

/// Corners of a ground tile in model space.
const GROUND_CORNERS: [Vec3; 4] = [
    Vec3::new(-1.0, 0.0, -1.0),
    Vec3::new(1.0, 0.0, -1.0),
    Vec3::new(1.0, 0.0, 1.0),
    Vec3::new(-1.0, 0.0, 1.0),
];

/// A pixel buffer as produced by a renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Bytes per pixel.
    pub channels: u32,
    /// Rows, bottom row first.
    pub pixels: Vec<u8>,
}

impl Frame {
    /// A zeroed frame of the given size.
    pub fn new(width: u32, height: u32, channels: u32) -> Self {
        let mut frame = Self {
            width,
            height,
            channels,
            pixels: Vec::new(),
        };
        frame.pixels.resize(frame.byte_len(), 0);
        frame
    }

    /// Bytes in one row.
    pub fn row_bytes(&self) -> usize {
        to_usize(self.width).saturating_mul(to_usize(self.channels))
    }

    /// Bytes in the whole frame.
    pub fn byte_len(&self) -> usize {
        self.row_bytes().saturating_mul(to_usize(self.height))
    }

    /// Whether nothing has been drawn into it.
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

fn to_usize(v: u32) -> usize {
    usize::try_from(v).unwrap_or(usize::MAX)
}

/// Where a frame is rendered from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// World to eye.
    pub view: Mat4,
    /// Eye to clip.
    pub projection: Mat4,
    /// Display-only rotation added to every cube model.
    pub display_rotation: Vec3,
    /// Cube to leave out, usually the one looking.
    pub hide: Option<usize>,
}

impl Camera {
    /// Camera on the front face of `cube`, looking along its yaw and gaze.
    pub fn first_person(cube: &Cube, fov_degrees: f32, width: u32, height: u32, display_rotation: Vec3) -> Self {
        Self {
            view: kinematics::first_person_view(cube.position, cube.yaw(), cube.scale_factor, cube.gaze, Vec3::Y),
            projection: kinematics::perspective(fov_degrees, width, height),
            display_rotation,
            hide: Some(cube.index),
        }
    }

    /// Camera at a fixed preset.
    pub fn preset(preset: &CameraPreset, fov_degrees: f32, width: u32, height: u32, display_rotation: Vec3) -> Self {
        Self {
            view: preset.view(),
            projection: kinematics::perspective(fov_degrees, width, height),
            display_rotation,
            hide: None,
        }
    }
}

/// Produces pixels for a camera. Implementations are single-threaded and
/// only ever called from the tick thread.
pub trait Renderer: Send {
    /// Render `world` through `camera` into `frame`, resizing it to
    /// `width` x `height` x `channels`.
    fn render(&mut self, world: &World, camera: &Camera, width: u32, height: u32, channels: u32, frame: &mut Frame);
}

/// Flat-shaded rectangle rasteriser.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterRenderer;

/// One rectangle to paint.
struct Sprite {
    /// Eye-space depth of the centre; more negative is farther.
    depth: f32,
    /// (xmin, ymin, xmax, ymax), bottom-left origin.
    rect: [f32; 4],
    color: Vec4,
}

impl RasterRenderer {
    /// Create a renderer.
    pub const fn new() -> Self {
        Self
    }

    fn sprite(model: Mat4, corners: &[Vec3], color: Vec4, camera: &Camera, width: u32, height: u32) -> Option<Sprite> {
        let model_view = camera.view * model;
        let depth = model_view.transform_point3(Vec3::ZERO).z;
        #[allow(clippy::cast_precision_loss)]
        let (w, h) = (width as f32, height as f32);
        let mut rect = [f32::MAX, f32::MAX, f32::MIN, f32::MIN];
        let mut seen = false;
        for corner in corners {
            let Some(p) = kinematics::project_point(*corner, model_view, camera.projection, width, height) else {
                continue;
            };
            seen = true;
            rect[0] = rect[0].min(p.x);
            rect[1] = rect[1].min(p.y);
            rect[2] = rect[2].max(p.x);
            rect[3] = rect[3].max(p.y);
        }
        if !seen {
            return None;
        }
        let rect = [
            rect[0].clamp(0.0, w),
            rect[1].clamp(0.0, h),
            rect[2].clamp(0.0, w),
            rect[3].clamp(0.0, h),
        ];
        if rect[0] >= rect[2] || rect[1] >= rect[3] {
            return None;
        }
        Some(Sprite { depth, rect, color })
    }

    fn fill(frame: &mut Frame, sprite: &Sprite) {
        let channels = to_usize(frame.channels);
        let row_bytes = frame.row_bytes();
        if channels == 0 || row_bytes == 0 {
            return;
        }
        let color = rgba_bytes(sprite.color);
        let [x0, y0, x1, y1] = sprite.rect.map(pixel);
        for row in frame
            .pixels
            .chunks_exact_mut(row_bytes)
            .skip(y0)
            .take(y1.saturating_sub(y0))
        {
            for px in row.chunks_exact_mut(channels).skip(x0).take(x1.saturating_sub(x0)) {
                for (dst, src) in px.iter_mut().zip(color) {
                    *dst = src;
                }
            }
        }
    }
}

impl Renderer for RasterRenderer {
    fn render(&mut self, world: &World, camera: &Camera, width: u32, height: u32, channels: u32, frame: &mut Frame) {
        frame.width = width;
        frame.height = height;
        frame.channels = channels;
        frame.pixels.clear();
        frame.pixels.resize(frame.byte_len(), 0);

        let background = rgba_bytes(world.window.background);
        for px in frame.pixels.chunks_exact_mut(to_usize(channels).max(1)) {
            for (dst, src) in px.iter_mut().zip(background) {
                *dst = src;
            }
        }

        let mut sprites: Vec<Sprite> = Vec::new();
        for (_, ground) in world.grounds.iter() {
            if ground.active && ground.display
                && let Some(s) = Self::sprite(ground.model(), &GROUND_CORNERS, ground.color, camera, width, height)
            {
                sprites.push(s);
            }
        }
        for cube in world.cubes.iter() {
            if !cube.is_live() || camera.hide == Some(cube.index) {
                continue;
            }
            let model = cube.model(camera.display_rotation);
            if let Some(s) = Self::sprite(model, &kinematics::CUBE_CORNERS, cube.color, camera, width, height) {
                sprites.push(s);
            }
        }

        sprites.sort_by(|a, b| a.depth.total_cmp(&b.depth));
        for sprite in &sprites {
            Self::fill(frame, sprite);
        }
    }
}

/// Colour in 0..1 to RGBA bytes.
fn rgba_bytes(color: Vec4) -> [u8; 4] {
    color.to_array().map(|c| {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let byte = (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        byte
    })
}

/// Window coordinate to pixel index.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn pixel(v: f32) -> usize {
    v.max(0.0).round() as usize
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use cubeworld_types::PlayerKind;

    use super::*;
    use crate::world::tests::{add_cube, make_world};

    fn top_down() -> CameraPreset {
        CameraPreset {
            position: Vec3::new(0.0, 30.0, 0.1),
            target: Vec3::ZERO,
            up: Vec3::Y,
        }
    }

    fn pixel_at(frame: &Frame, x: usize, y: usize) -> &[u8] {
        let channels = to_usize(frame.channels);
        let start = y * frame.row_bytes() + x * channels;
        &frame.pixels[start..start + channels]
    }

    #[test]
    fn frame_sizes() {
        let frame = Frame::new(4, 2, 3);
        assert_eq!(frame.row_bytes(), 12);
        assert_eq!(frame.pixels.len(), 24);
    }

    #[test]
    fn empty_world_is_background() {
        let mut world = World::new(&crate::config::CapacityConfig::default());
        world.window.background = Vec4::new(1.0, 0.0, 0.0, 1.0);
        let camera = Camera::preset(&top_down(), 60.0, 8, 8, Vec3::ZERO);
        let mut frame = Frame::default();
        RasterRenderer::new().render(&world, &camera, 8, 8, 4, &mut frame);
        assert_eq!(frame.pixels.len(), 256);
        assert_eq!(pixel_at(&frame, 3, 3), &[255, 0, 0, 255]);
    }

    #[test]
    fn cube_is_painted_over_ground() {
        let mut world = make_world();
        let c = add_cube(&mut world, PlayerKind::Male, 0.0, 0.0, 10.0);
        world.cubes.get_mut(c).unwrap().color = Vec4::new(0.0, 0.0, 1.0, 1.0);
        let camera = Camera::preset(&top_down(), 60.0, 64, 64, Vec3::ZERO);
        let mut frame = Frame::default();
        RasterRenderer::new().render(&world, &camera, 64, 64, 4, &mut frame);
        assert_eq!(pixel_at(&frame, 32, 32), &[0, 0, 255, 255]);
        // ground grey just off the cube
        assert_eq!(pixel_at(&frame, 32, 40), &[128, 128, 128, 255]);
    }

    #[test]
    fn viewer_is_hidden_from_itself() {
        let mut world = make_world();
        let c = add_cube(&mut world, PlayerKind::Male, 0.0, 0.0, 10.0);
        let camera = Camera::first_person(world.cubes.get(c).unwrap(), 60.0, 16, 16, Vec3::ZERO);
        assert_eq!(camera.hide, Some(c));
        let mut frame = Frame::default();
        RasterRenderer::new().render(&world, &camera, 16, 16, 4, &mut frame);
        assert_eq!(frame.byte_len(), 16 * 16 * 4);
    }
}
