//! Monthly reads sparkline for the dashboard

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// Block characters for increasing counts (8 levels)
const BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// One cell per month, scaled against the busiest month
pub struct ReadsSparkline<'a> {
    counts: &'a [u64],
    /// Month to highlight (index into counts)
    current: Option<usize>,
    style: Style,
    marker_style: Style,
}

impl<'a> ReadsSparkline<'a> {
    pub fn new(counts: &'a [u64]) -> Self {
        Self {
            counts,
            current: None,
            style: Style::default().fg(Color::Cyan),
            marker_style: Style::default().fg(Color::Yellow),
        }
    }

    pub fn current(mut self, index: usize) -> Self {
        self.current = Some(index);
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    fn max(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    fn count_to_block(&self, count: u64) -> char {
        let max = self.max();
        if max == 0 {
            return BLOCKS[0];
        }
        let normalized = count.min(max) as f64 / max as f64;
        BLOCKS[((normalized * 7.0).round() as usize).min(7)]
    }
}

impl Widget for ReadsSparkline<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        // Two columns per month so the line stays readable
        for (i, count) in self.counts.iter().enumerate() {
            let x = area.x + (i as u16) * 2;
            if x >= area.right() {
                break;
            }
            let style = if self.current == Some(i) {
                self.marker_style
            } else {
                self.style
            };
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(self.count_to_block(*count)).set_style(style);
            }
        }
    }
}
