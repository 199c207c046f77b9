/// Character-cell rasterizer for terminal rendering
use crossterm::{
    style::{Color as TermColor, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::Point2;
use std::convert::Infallible;
use std::io::Write;
use vplane_core::{Color, Rasterizer, Viewport};

/// Character luminosity ramp for face shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &['.', ':', '-', '=', '+', '*', '#', '%', '@'];

const MARKER_CHAR: char = 'o';

/// Upper bound on samples per line; projected offsets are clamped well below it
const MAX_LINE_STEPS: f64 = 20_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub glyph: char,
    pub color: Color,
}

/// A terminal-sized grid that primitives are painted into, back to front.
///
/// Primitives arrive in viewport pixels and are scaled onto the grid. There is
/// no depth buffer: every draw overwrites what is already there.
pub struct CellCanvas {
    columns: usize,
    rows: usize,
    viewport: Viewport,
    cells: Vec<Option<Cell>>,
}

impl CellCanvas {
    pub fn new(columns: usize, rows: usize, viewport: Viewport) -> Self {
        Self {
            columns,
            rows,
            viewport,
            cells: vec![None; columns * rows],
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn resize(&mut self, columns: usize, rows: usize) {
        self.columns = columns;
        self.rows = rows;
        self.cells = vec![None; columns * rows];
    }

    pub fn clear(&mut self) {
        self.cells.fill(None);
    }

    pub fn cell(&self, column: usize, row: usize) -> Option<Cell> {
        if column < self.columns && row < self.rows {
            self.cells[row * self.columns + column]
        } else {
            None
        }
    }

    /// Horizontal and vertical cells per viewport pixel
    fn scale(&self) -> (f64, f64) {
        (
            self.columns as f64 / self.viewport.width as f64,
            self.rows as f64 / self.viewport.height as f64,
        )
    }

    fn to_cells(&self, point: Point2<f64>) -> (f64, f64) {
        let (sx, sy) = self.scale();
        (point.x * sx, point.y * sy)
    }

    fn set(&mut self, column: usize, row: usize, glyph: char, color: Color) {
        if column < self.columns && row < self.rows {
            self.cells[row * self.columns + column] = Some(Cell { glyph, color });
        }
    }

    /// Paint the cell containing a fractional cell position
    fn plot(&mut self, column: f64, row: f64, glyph: char, color: Color) {
        if column >= 0.0 && row >= 0.0 {
            self.set(column as usize, row as usize, glyph, color);
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let mut current = None;
        for row in 0..self.rows {
            for column in 0..self.columns {
                match self.cells[row * self.columns + column] {
                    Some(cell) => {
                        if current != Some(cell.color) {
                            writer.queue(SetForegroundColor(term_color(cell.color)))?;
                            current = Some(cell.color);
                        }
                        writer.queue(Print(cell.glyph))?;
                    }
                    None => {
                        writer.queue(Print(' '))?;
                    }
                }
            }
            if row + 1 < self.rows {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl Rasterizer for CellCanvas {
    type Error = Infallible;

    fn fill_circle(&mut self, center: Point2<f64>, radius: u32, color: Color) -> Result<(), Self::Error> {
        let (sx, sy) = self.scale();
        let (cx, cy) = self.to_cells(center);
        // at least half a cell so every visible marker covers its own cell
        let rx = (radius as f64 * sx).max(0.5);
        let ry = (radius as f64 * sy).max(0.5);

        let first_row = (cy - ry).floor().max(0.0) as usize;
        let last_row = ((cy + ry).ceil().max(0.0) as usize).min(self.rows);
        let first_column = (cx - rx).floor().max(0.0) as usize;
        let last_column = ((cx + rx).ceil().max(0.0) as usize).min(self.columns);

        for row in first_row..last_row {
            for column in first_column..last_column {
                let dx = (column as f64 + 0.5 - cx) / rx;
                let dy = (row as f64 + 0.5 - cy) / ry;
                if dx * dx + dy * dy <= 1.0 {
                    self.set(column, row, MARKER_CHAR, color);
                }
            }
        }
        self.plot(cx, cy, MARKER_CHAR, color);
        Ok(())
    }

    fn line(&mut self, from: Point2<f64>, to: Point2<f64>, color: Color) -> Result<(), Self::Error> {
        let (x0, y0) = self.to_cells(from);
        let (x1, y1) = self.to_cells(to);
        let (dx, dy) = (x1 - x0, y1 - y0);
        let glyph = line_glyph(dx, dy);

        let steps = dx.abs().max(dy.abs()).ceil().clamp(1.0, MAX_LINE_STEPS) as u32;
        for step in 0..=steps {
            let t = step as f64 / steps as f64;
            self.plot(x0 + dx * t, y0 + dy * t, glyph, color);
        }
        Ok(())
    }

    fn fill_polygon(&mut self, points: &[Point2<f64>], color: Color) -> Result<(), Self::Error> {
        if points.len() < 3 {
            return Ok(());
        }
        let vertices: Vec<(f64, f64)> = points.iter().map(|p| self.to_cells(*p)).collect();
        let glyph = luminosity_glyph(color);

        let min_y = vertices.iter().map(|v| v.1).fold(f64::INFINITY, f64::min);
        let max_y = vertices.iter().map(|v| v.1).fold(f64::NEG_INFINITY, f64::max);
        let first_row = min_y.floor().max(0.0) as usize;
        let last_row = (max_y.ceil().max(0.0) as usize).min(self.rows);

        // Even-odd scanline fill, sampled at cell centres
        let mut crossings = Vec::new();
        for row in first_row..last_row {
            let y = row as f64 + 0.5;
            crossings.clear();
            for (i, &(ax, ay)) in vertices.iter().enumerate() {
                let (bx, by) = vertices[(i + 1) % vertices.len()];
                if (ay <= y && by > y) || (by <= y && ay > y) {
                    crossings.push(ax + (y - ay) / (by - ay) * (bx - ax));
                }
            }
            crossings.sort_by(f64::total_cmp);
            for span in crossings.chunks_exact(2) {
                let start = (span[0] - 0.5).ceil().max(0.0) as usize;
                let end = ((span[1] - 0.5).floor().max(-1.0) + 1.0) as usize;
                for column in start..end.min(self.columns) {
                    self.set(column, row, glyph, color);
                }
            }
        }
        Ok(())
    }
}

fn term_color(color: Color) -> TermColor {
    TermColor::Rgb {
        r: color.r,
        g: color.g,
        b: color.b,
    }
}

/// Pick a glyph that follows the slope of a line in screen space (y down)
fn line_glyph(dx: f64, dy: f64) -> char {
    let (ax, ay) = (dx.abs(), dy.abs());
    if ay * 2.0 < ax {
        '-'
    } else if ax * 2.0 < ay {
        '|'
    } else if (dx > 0.0) == (dy > 0.0) {
        '\\'
    } else {
        '/'
    }
}

fn luminosity_glyph(color: Color) -> char {
    let luminance = 0.2126 * color.r as f64 + 0.7152 * color.g as f64 + 0.0722 * color.b as f64;
    let index = (luminance / 255.0 * (LUMINOSITY_RAMP.len() - 1) as f64).round() as usize;
    LUMINOSITY_RAMP[index.min(LUMINOSITY_RAMP.len() - 1)]
}
