//! Widgets whose pixels are shown on the overlay and mirrored into the 3D scene

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use glam::Vec2;
use image::{Rgba, RgbaImage};

use super::canvas::{rgb, rgba, Canvas, TextRasterizer};

/// A widget rendered independently of the 3D scene
///
/// The mirror only ever reads from a widget: either its live pixels or a placeholder it paints
/// on request.
pub trait Widget {
    fn name(&self) -> &str;

    /// Native pixel size; mirror buffers and overlay quads are sized from this
    fn size(&self) -> (u32, u32);

    /// Changes whenever the widget's visible content changes
    fn revision(&self) -> u64;

    /// Current frame when the widget is presenting live content
    fn live_frame(&self) -> Option<&RgbaImage>;

    /// Whether painting the placeholder needs text rendering
    fn placeholder_needs_text(&self) -> bool {
        true
    }

    /// Paint the stand-in artwork shown when there are no live pixels
    fn paint_placeholder(&self, canvas: &mut Canvas, text: Option<&TextRasterizer>);
}

/// Widgets are shared between the host UI and the renderer
pub type SharedWidget = Rc<RefCell<dyn Widget>>;

/// Supplies decoded video frames
pub trait FrameSource {
    /// Frame for the given playback position, or `None` while nothing is decodable
    fn frame_at(&mut self, position: Duration) -> Option<RgbaImage>;
}

/// Animated colour bars, standing in for a decoded video
#[derive(Debug, Clone)]
pub struct TestPatternSource {
    width: u32,
    height: u32,
}

impl TestPatternSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl FrameSource for TestPatternSource {
    fn frame_at(&mut self, position: Duration) -> Option<RgbaImage> {
        const BARS: [u32; 7] = [
            0xc0c0c0, 0xc0c000, 0x00c0c0, 0x00c000, 0xc000c0, 0xc00000, 0x0000c0,
        ];
        let shift = (position.as_secs_f32() * 60.0) as u32;
        let bar_width = (self.width / BARS.len() as u32).max(1);
        Some(RgbaImage::from_fn(self.width, self.height, |x, _| {
            let bar = ((x + shift) / bar_width) as usize % BARS.len();
            rgb(BARS[bar])
        }))
    }
}

/// The stage's video player
pub struct VideoWidget {
    title: String,
    width: u32,
    height: u32,
    playing: bool,
    position: Duration,
    source: Option<Box<dyn FrameSource>>,
    frame: Option<RgbaImage>,
    revision: u64,
}

impl std::fmt::Debug for VideoWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoWidget")
            .field("title", &self.title)
            .field("playing", &self.playing)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

impl VideoWidget {
    pub const WIDTH: u32 = 1920;
    pub const HEIGHT: u32 = 1080;

    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            width: Self::WIDTH,
            height: Self::HEIGHT,
            playing: false,
            position: Duration::ZERO,
            source: None,
            frame: None,
            revision: 0,
        }
    }

    pub fn with_source(mut self, source: Box<dyn FrameSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn position(&self) -> Duration {
        self.position
    }

    /// Play if paused, pause if playing; returns the new playing state
    pub fn toggle_playback(&mut self) -> bool {
        self.playing = !self.playing;
        if !self.playing {
            self.frame = None;
        }
        self.revision += 1;
        log::info!(
            "Video {}",
            if self.playing { "playing" } else { "paused" }
        );
        self.playing
    }

    /// Move the playhead and decode the frame under it
    pub fn advance(&mut self, dt: Duration) {
        if !self.playing {
            return;
        }
        self.position += dt;
        if let Some(source) = self.source.as_mut() {
            self.frame = source.frame_at(self.position);
            self.revision += 1;
        }
    }
}

impl Widget for VideoWidget {
    fn name(&self) -> &str {
        "video"
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn revision(&self) -> u64 {
        self.revision
    }

    fn live_frame(&self) -> Option<&RgbaImage> {
        self.frame.as_ref().filter(|_| self.playing)
    }

    fn paint_placeholder(&self, canvas: &mut Canvas, text: Option<&TextRasterizer>) {
        let (w, h) = (canvas.width() as f32, canvas.height() as f32);
        let centre = Vec2::new(w / 2.0, h / 2.0);
        canvas.clear(rgb(0x000000));
        if let Some(text) = text {
            canvas.draw_text_centered(text, &self.title, 48.0, centre.x, 120.0, rgb(0xffffff), true);
        }
        canvas.fill_circle(centre, 80.0, rgba(0xffffff, 204));
        canvas.fill_triangle(
            [
                centre + Vec2::new(-30.0, -40.0),
                centre + Vec2::new(-30.0, 40.0),
                centre + Vec2::new(50.0, 0.0),
            ],
            rgb(0xff0000),
        );
    }
}

/// Stand-in for the voice assistant's panel, which cannot be captured directly
#[derive(Debug, Clone)]
pub struct AssistantPanelWidget {
    open: bool,
    revision: u64,
}

impl AssistantPanelWidget {
    pub const WIDTH: u32 = 600;
    pub const HEIGHT: u32 = 800;

    const HINT: [&'static str; 3] = [
        "Click the microphone button",
        "in the bottom right corner",
        "to interact with the AI Assistant",
    ];

    pub fn new() -> Self {
        Self {
            open: false,
            revision: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Mirror the assistant's open state; the microphone button lights up while open
    pub fn set_open(&mut self, open: bool) {
        if self.open != open {
            self.open = open;
            self.revision += 1;
        }
    }
}

impl Default for AssistantPanelWidget {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for AssistantPanelWidget {
    fn name(&self) -> &str {
        "assistant-panel"
    }

    fn size(&self) -> (u32, u32) {
        (Self::WIDTH, Self::HEIGHT)
    }

    fn revision(&self) -> u64 {
        self.revision
    }

    fn live_frame(&self) -> Option<&RgbaImage> {
        None
    }

    fn paint_placeholder(&self, canvas: &mut Canvas, text: Option<&TextRasterizer>) {
        let (w, h) = (canvas.width() as i64, canvas.height() as i64);
        let cx = w as f32 / 2.0;
        let white: Rgba<u8> = rgb(0xffffff);

        canvas.clear(rgb(0x000000));
        canvas.fill_rect(0, 0, w, 60, rgb(0x1e1e1e));
        canvas.fill_rect(0, 60, w, h - 140, rgb(0x121212));
        canvas.fill_rect(20, 80, w - 40, 120, rgb(0x2a2a2a));
        canvas.fill_rect(0, h - 80, w, 80, rgb(0x1e1e1e));

        if let Some(text) = text {
            canvas.draw_text_centered(text, "Voice Assistant", 28.0, cx, 40.0, white, true);
            for (line, y) in Self::HINT.iter().zip([130.0, 160.0, 190.0]) {
                canvas.draw_text_centered(text, line, 18.0, cx, y, white, false);
            }
        }

        let button = if self.open { 0xd93025 } else { 0x0b57d0 };
        let mic = Vec2::new(cx, h as f32 - 40.0);
        canvas.fill_circle(mic, 30.0, rgb(button));
        canvas.fill_rounded_rect(
            Vec2::new(cx - 5.0, h as f32 - 55.0),
            Vec2::new(10.0, 20.0),
            5.0,
            white,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggling_playback_flips_state_and_bumps_revision() {
        let mut video = VideoWidget::new("Educational Video");
        assert!(!video.is_playing());
        assert!(video.toggle_playback());
        assert_eq!(video.revision(), 1);
        assert!(!video.toggle_playback());
        assert_eq!(video.revision(), 2);
    }

    #[test]
    fn paused_video_has_no_live_frame() {
        let mut video = VideoWidget::new("clip").with_source(Box::new(TestPatternSource::new(8, 4)));
        video.advance(Duration::from_millis(16));
        assert!(video.live_frame().is_none());
        assert_eq!(video.position(), Duration::ZERO);

        video.toggle_playback();
        video.advance(Duration::from_millis(16));
        assert_eq!(video.live_frame().map(|f| f.dimensions()), Some((8, 4)));

        video.toggle_playback();
        assert!(video.live_frame().is_none());
    }

    #[test]
    fn video_placeholder_draws_the_play_button() {
        let video = VideoWidget::new("clip");
        let mut image = RgbaImage::new(VideoWidget::WIDTH, VideoWidget::HEIGHT);
        video.paint_placeholder(&mut Canvas::new(&mut image), None);
        // inside the red triangle, left of centre
        assert_eq!(image.get_pixel(940, 540).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(10, 10).0, [0, 0, 0, 255]);
    }

    #[test]
    fn assistant_button_reflects_open_state() {
        let mut panel = AssistantPanelWidget::new();
        let mut closed = RgbaImage::new(600, 800);
        panel.paint_placeholder(&mut Canvas::new(&mut closed), None);
        assert_eq!(closed.get_pixel(300 - 20, 760).0, [0x0b, 0x57, 0xd0, 255]);

        panel.set_open(true);
        panel.set_open(true);
        assert_eq!(panel.revision(), 1);
        let mut open = RgbaImage::new(600, 800);
        panel.paint_placeholder(&mut Canvas::new(&mut open), None);
        assert_eq!(open.get_pixel(300 - 20, 760).0, [0xd9, 0x30, 0x25, 255]);
    }
}
