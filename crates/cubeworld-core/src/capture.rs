//! Frame barriers between view requests and the tick thread.
//!
//! Every cube slot and every ground slot owns a [`FrameBarrier`]: a pixel
//! buffer behind a mutex plus a condition variable. The handshake is:
//!
//! 1. A session worker arms the barrier with the first frame it will
//!    accept (`pixels_frame_start`), then waits on the condition variable.
//! 2. The tick thread, after a tick, renders into every armed barrier whose
//!    start frame has been reached, stamps `pixels_frame`, disarms it and
//!    notifies.
//! 3. The worker wakes (or times out), copies the buffer out, flips the
//!    rows to top-down and converts RGBA to BGR.
//!
//! A timed-out wait still returns whatever was captured last.

use std::time::Duration;

use parking_lot::{Condvar, Mutex, MutexGuard};

use cubeworld_types::{CubeUuid, PixelMode};

use crate::render::Frame;

/// Why a view could not be served.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    /// No cube has this uuid.
    #[error("unknown cube {0}")]
    UnknownCube(CubeUuid),

    /// The cube is inactive, hidden or not bound to a client.
    #[error("cube {0} cannot be viewed")]
    ScreenViewNotAllowed(CubeUuid),

    /// The ground is unknown, inactive, hidden or not enabled.
    #[error("ground {index} cannot be viewed")]
    GroundViewNotAllowed {
        /// Requested ground slot.
        index: i64,
    },
}

/// Shared state of one barrier.
#[derive(Debug, Clone, Default)]
pub struct CaptureSlot {
    /// Last rendered frame, rows bottom-up.
    pub frame: Frame,
    /// Frame counter at the last capture; `None` before the first.
    pub pixels_frame: Option<u64>,
    /// Earliest frame counter the current waiter accepts.
    pub pixels_frame_start: u64,
    /// A waiter is expecting a capture.
    pub armed: bool,
    /// Label box of the viewed cube, image coordinates.
    pub bounding_box: [f32; 4],
}

/// Pixels copied out of a barrier, ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Channels per pixel after conversion.
    pub channels: u32,
    /// Channel layout.
    pub mode: PixelMode,
    /// Rows top-down.
    pub pixels: Vec<u8>,
    /// Label box, image coordinates.
    pub bounding_box: [f32; 4],
    /// Frame counter at capture; `None` if nothing was ever captured.
    pub pixels_frame: Option<u64>,
    /// Frame the request asked for.
    pub pixels_frame_start: u64,
    /// The wait gave up before a fresh capture arrived.
    pub timed_out: bool,
}

/// Per-view rendezvous between one session worker and the tick thread.
#[derive(Debug, Default)]
pub struct FrameBarrier {
    slot: Mutex<CaptureSlot>,
    ready: Condvar,
}

impl FrameBarrier {
    /// An unarmed barrier with an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the slot.
    pub fn lock(&self) -> MutexGuard<'_, CaptureSlot> {
        self.slot.lock()
    }

    /// Ask for a capture at or after frame `start`.
    pub fn arm(&self, start: u64, bounding_box: [f32; 4]) {
        let mut slot = self.slot.lock();
        slot.pixels_frame_start = start;
        slot.bounding_box = bounding_box;
        slot.armed = true;
    }

    /// Whether a capture is wanted at frame `frame`.
    pub fn is_due(&self, frame: u64) -> bool {
        let slot = self.slot.lock();
        slot.armed && frame >= slot.pixels_frame_start
    }

    /// If due, let `render` fill the buffer, stamp it with `frame` and wake
    /// the waiter. Returns whether a capture happened.
    pub fn capture_if_due(&self, frame: u64, render: impl FnOnce(&mut Frame)) -> bool {
        {
            let mut slot = self.slot.lock();
            if !slot.armed || frame < slot.pixels_frame_start {
                return false;
            }
            render(&mut slot.frame);
            slot.pixels_frame = Some(frame);
            slot.armed = false;
        }
        self.ready.notify_all();
        true
    }

    /// Wait up to `timeout` for the armed capture, then copy the image out.
    pub fn wait(&self, timeout: Duration) -> ViewImage {
        let mut slot = self.slot.lock();
        let result = self.ready.wait_while_for(&mut slot, |s| s.armed, timeout);
        let timed_out = result.timed_out();
        if timed_out {
            tracing::warn!(
                start = slot.pixels_frame_start,
                last = ?slot.pixels_frame,
                "view wait timed out"
            );
        }
        image_from(&slot, timed_out)
    }
}

/// Copy a slot into a client image: rows top-down, three BGR channels
/// whatever the capture layout.
pub fn image_from(slot: &CaptureSlot, timed_out: bool) -> ViewImage {
    let frame = &slot.frame;
    let flipped = flip_rows(&frame.pixels, frame.row_bytes());
    let channels = usize::try_from(frame.channels).unwrap_or_default();
    ViewImage {
        width: frame.width,
        height: frame.height,
        channels: 3,
        mode: PixelMode::Bgr,
        pixels: to_bgr(&flipped, channels),
        bounding_box: slot.bounding_box,
        pixels_frame: slot.pixels_frame,
        pixels_frame_start: slot.pixels_frame_start,
        timed_out,
    }
}

/// Reverse the order of rows.
pub fn flip_rows(pixels: &[u8], row_bytes: usize) -> Vec<u8> {
    if row_bytes == 0 {
        return pixels.to_vec();
    }
    pixels.rchunks_exact(row_bytes).flatten().copied().collect()
}

/// Repack `channels`-wide pixels as BGR. Alpha is dropped and one or two
/// channel pixels are read as grey.
pub fn to_bgr(pixels: &[u8], channels: usize) -> Vec<u8> {
    if channels == 0 {
        return Vec::new();
    }
    pixels
        .chunks_exact(channels)
        .flat_map(|px| match *px {
            [r, g, b, ..] => [b, g, r],
            [v, ..] => [v, v, v],
            [] => [0, 0, 0],
        })
        .collect()
}

/// Barriers for every cube and ground slot.
#[derive(Debug)]
pub struct CaptureRegistry {
    cubes: Vec<FrameBarrier>,
    grounds: Vec<FrameBarrier>,
}

impl CaptureRegistry {
    /// One barrier per slot.
    pub fn new(cubes: usize, grounds: usize) -> Self {
        Self {
            cubes: (0..cubes).map(|_| FrameBarrier::new()).collect(),
            grounds: (0..grounds).map(|_| FrameBarrier::new()).collect(),
        }
    }

    /// Barrier of cube slot `index`.
    pub fn cube(&self, index: usize) -> Option<&FrameBarrier> {
        self.cubes.get(index)
    }

    /// Barrier of ground slot `index`.
    pub fn ground(&self, index: usize) -> Option<&FrameBarrier> {
        self.grounds.get(index)
    }

    /// Cube slots with a pending capture at `frame`.
    pub fn due_cubes(&self, frame: u64) -> Vec<usize> {
        due(&self.cubes, frame)
    }

    /// Ground slots with a pending capture at `frame`.
    pub fn due_grounds(&self, frame: u64) -> Vec<usize> {
        due(&self.grounds, frame)
    }
}

fn due(barriers: &[FrameBarrier], frame: u64) -> Vec<usize> {
    barriers
        .iter()
        .enumerate()
        .filter(|(_, b)| b.is_due(frame))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn flip_reverses_rows() {
        let pixels = [1, 1, 2, 2, 3, 3];
        assert_eq!(flip_rows(&pixels, 2), vec![3, 3, 2, 2, 1, 1]);
    }

    #[test]
    fn bgr_conversion() {
        let rgba = [10, 20, 30, 255, 40, 50, 60, 255];
        assert_eq!(to_bgr(&rgba, 4), vec![30, 20, 10, 60, 50, 40]);
        assert_eq!(to_bgr(&[10, 20, 30, 40, 50, 60], 3), vec![30, 20, 10, 60, 50, 40]);
        assert_eq!(to_bgr(&[9, 7], 1), vec![9, 9, 9, 7, 7, 7]);
        assert!(to_bgr(&[1, 2, 3], 0).is_empty());
    }

    #[test]
    fn three_channel_capture_is_labelled_bgr() {
        let barrier = FrameBarrier::new();
        barrier.arm(0, [0.0; 4]);
        barrier.capture_if_due(0, |f| {
            *f = Frame::new(2, 1, 3);
            f.pixels.copy_from_slice(&[1, 2, 3, 4, 5, 6]);
        });
        let image = barrier.wait(Duration::from_secs(1));
        assert_eq!(image.mode, PixelMode::Bgr);
        assert_eq!(image.channels, 3);
        assert_eq!(image.pixels, vec![3, 2, 1, 6, 5, 4]);
    }

    #[test]
    fn capture_waits_for_start_frame() {
        let barrier = FrameBarrier::new();
        barrier.arm(5, [0.0; 4]);
        assert!(!barrier.capture_if_due(4, |_| {}));
        assert!(barrier.capture_if_due(5, |f| *f = Frame::new(1, 1, 4)));
        // disarmed after one capture
        assert!(!barrier.capture_if_due(6, |_| {}));
        assert_eq!(barrier.lock().pixels_frame, Some(5));
    }

    #[test]
    fn waiter_wakes_on_capture() {
        let barrier = Arc::new(FrameBarrier::new());
        barrier.arm(2, [1.0, 2.0, 3.0, 4.0]);

        let producer = Arc::clone(&barrier);
        let handle = thread::spawn(move || {
            for frame in 0..10 {
                producer.capture_if_due(frame, |f| {
                    *f = Frame::new(2, 2, 4);
                    f.pixels.fill(7);
                });
                thread::sleep(Duration::from_millis(5));
            }
        });

        let image = barrier.wait(Duration::from_secs(3));
        handle.join().unwrap();
        assert!(!image.timed_out);
        assert_eq!(image.pixels_frame, Some(2));
        assert_eq!(image.mode, PixelMode::Bgr);
        assert_eq!(image.channels, 3);
        assert_eq!(image.pixels.len(), 12);
        assert!((image.bounding_box[3] - 4.0).abs() < f32::EPSILON);
    }

    #[test]
    fn timeout_returns_last_capture() {
        let barrier = FrameBarrier::new();
        barrier.arm(0, [0.0; 4]);
        barrier.capture_if_due(0, |f| *f = Frame::new(1, 1, 3));
        barrier.arm(100, [0.0; 4]);
        let image = barrier.wait(Duration::from_millis(20));
        assert!(image.timed_out);
        assert_eq!(image.pixels_frame, Some(0));
        assert_eq!(image.mode, PixelMode::Bgr);
    }

    #[test]
    fn registry_reports_due_slots() {
        let registry = CaptureRegistry::new(3, 1);
        registry.cube(1).unwrap().arm(0, [0.0; 4]);
        registry.ground(0).unwrap().arm(9, [0.0; 4]);
        assert_eq!(registry.due_cubes(0), vec![1]);
        assert!(registry.due_grounds(0).is_empty());
        assert!(registry.cube(3).is_none());
    }
}
