use std::sync::Arc;

use ratatui::{
    Frame,
    buffer::Buffer,
    layout::Rect,
    widgets::{Block, BorderType, Borders, Widget},
};
use rustfft::{Fft, FftPlanner, num_complex::Complex};
use tracing::info;

use crate::media::SampleBuf;
use crate::theme::{Theme, lerp};

pub const FFT_SIZE: usize = 64;
pub const BIN_COUNT: usize = FFT_SIZE / 2;

// Analyser defaults of the Web Audio API
const SMOOTHING: f32 = 0.8;
const MIN_DECIBELS: f32 = -100.0;
const MAX_DECIBELS: f32 = -30.0;

const BAR_CHARS: &[char] = &[' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const BAR_WIDTH: u16 = 1;
const BAR_GAP: u16 = 1;

/// Frequency analysis over the tapped sample stream, producing byte
/// magnitudes per bin the way an `AnalyserNode` does.
pub struct Analyser {
    samples: SampleBuf,
    fft: Arc<dyn Fft<f32>>,
    window: [f32; FFT_SIZE],
    smoothed: [f32; BIN_COUNT],
    data: [u8; BIN_COUNT],
}

impl Analyser {
    pub fn new(samples: SampleBuf) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);

        // Blackman window
        let mut window = [0.0f32; FFT_SIZE];
        for (i, w) in window.iter_mut().enumerate() {
            let x = 2.0 * std::f32::consts::PI * i as f32 / FFT_SIZE as f32;
            *w = 0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos();
        }

        Analyser {
            samples,
            fft,
            window,
            smoothed: [0.0; BIN_COUNT],
            data: [0; BIN_COUNT],
        }
    }

    pub fn frequency_bin_count(&self) -> usize {
        BIN_COUNT
    }

    pub fn data(&self) -> &[u8; BIN_COUNT] {
        &self.data
    }

    /// Analyse the newest `FFT_SIZE` samples and update the byte magnitudes.
    pub fn refresh(&mut self) {
        let mut input = [Complex::new(0.0f32, 0.0); FFT_SIZE];
        if let Ok(buf) = self.samples.lock() {
            // Zero-pad at the front while the buffer is still filling
            let take = buf.len().min(FFT_SIZE);
            let start = FFT_SIZE - take;
            for (slot, &s) in input[start..].iter_mut().zip(buf.iter().skip(buf.len() - take)) {
                *slot = Complex::new(s, 0.0);
            }
        } else {
            return;
        }
        self.process(&mut input);
    }

    fn process(&mut self, input: &mut [Complex<f32>; FFT_SIZE]) {
        for (c, w) in input.iter_mut().zip(self.window.iter()) {
            c.re *= w;
        }
        self.fft.process(input);

        let range = MAX_DECIBELS - MIN_DECIBELS;
        for k in 0..BIN_COUNT {
            let magnitude = input[k].norm() / FFT_SIZE as f32;
            self.smoothed[k] = SMOOTHING * self.smoothed[k] + (1.0 - SMOOTHING) * magnitude;
            let db = 20.0 * self.smoothed[k].max(f32::MIN_POSITIVE).log10();
            let scaled = 255.0 / range * (db - MIN_DECIBELS);
            self.data[k] = scaled.clamp(0.0, 255.0) as u8;
        }
    }
}

/// The analysis node is created at most once, on first playback.
pub enum AnalysisGraph {
    Uninitialized,
    Attached(Analyser),
}

impl AnalysisGraph {
    /// Returns true only on the call that performed the attachment.
    pub fn ensure_attached(&mut self, samples: &SampleBuf) -> bool {
        if let AnalysisGraph::Attached(_) = self {
            return false;
        }
        let analyser = Analyser::new(Arc::clone(samples));
        info!(fft_size = FFT_SIZE, bins = analyser.frequency_bin_count(), "analyser attached");
        *self = AnalysisGraph::Attached(analyser);
        true
    }

    pub fn analyser(&self) -> Option<&Analyser> {
        match self {
            AnalysisGraph::Attached(a) => Some(a),
            AnalysisGraph::Uninitialized => None,
        }
    }

}

/// Per-frame redraw work. Runs only between a play and the next pause.
#[derive(Debug, Default)]
pub struct DrawTask {
    running: bool,
    frames: u64,
}

impl DrawTask {
    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Advance one animation frame. Returns whether analysis ran.
    pub fn tick(&mut self, graph: &mut AnalysisGraph) -> bool {
        if !self.running {
            return false;
        }
        match graph {
            AnalysisGraph::Attached(analyser) => {
                analyser.refresh();
                self.frames += 1;
                true
            }
            AnalysisGraph::Uninitialized => false,
        }
    }
}

/// Bars mirrored around the horizontal centre, lowest bin in the middle.
struct SpectrumWidget<'a> {
    data: &'a [u8],
    theme: &'a Theme,
    block: Option<Block<'a>>,
}

impl<'a> SpectrumWidget<'a> {
    fn new(data: &'a [u8], theme: &'a Theme) -> Self {
        SpectrumWidget {
            data,
            theme,
            block: None,
        }
    }

    fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl Widget for SpectrumWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = if let Some(block) = self.block {
            let inner = block.inner(area);
            block.render(area, buf);
            inner
        } else {
            area
        };

        if inner.width < 2 || inner.height == 0 || self.data.is_empty() {
            return;
        }

        let step = BAR_WIDTH + BAR_GAP;
        let half = inner.width / 2;
        let per_side = (half / step) as usize;
        if per_side == 0 {
            return;
        }
        let max_height = inner.height as usize;
        let center = inner.x + half;

        for i in 0..per_side {
            let bin = i * self.data.len() / per_side;
            let value = self.data[bin] as usize;
            let total_eighths = value * max_height * 8 / 255;
            let full_rows = total_eighths / 8;
            let remainder = total_eighths % 8;
            let bar_rows = full_rows + usize::from(remainder > 0);
            let offset = i as u16 * step;

            for row in 0..bar_rows {
                let y = inner.y + (max_height - 1 - row) as u16;
                let ch = if row < full_rows { '█' } else { BAR_CHARS[remainder] };
                // Gradient runs from the base colour at the floor to the accent at the bar top
                let t = if bar_rows > 1 {
                    row as f32 / (bar_rows - 1) as f32
                } else {
                    1.0
                };
                let color = lerp(self.theme.base, self.theme.accent, t);

                for w in 0..BAR_WIDTH {
                    let right = center + offset + w;
                    let left = center - 1 - offset - w;
                    for x in [left, right] {
                        if x >= inner.x && x < inner.x + inner.width {
                            buf[(x, y)].set_char(ch).set_fg(color);
                        }
                    }
                }
            }
        }
    }
}

pub fn draw_visualizer(
    frame: &mut Frame,
    area: Rect,
    graph: &AnalysisGraph,
    task: &DrawTask,
    theme: &Theme,
) {
    let title = if task.is_running() { " Visualizer " } else { " Visualizer (paused) " };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(title);
    match graph.analyser() {
        Some(analyser) => {
            let w = SpectrumWidget::new(analyser.data(), theme).block(block);
            frame.render_widget(w, area);
        }
        None => frame.render_widget(block, area),
    }
}
