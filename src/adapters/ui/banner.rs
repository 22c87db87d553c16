//! Startup banner: FIGlet title shaded top-to-bottom between two colors, then a subtitle.

use crossterm::queue;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use figlet_rs::FIGfont;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const AMBER: Rgb = Rgb(0xf2, 0x9e, 0x38);
    pub const TEAL: Rgb = Rgb(0x0b, 0x6e, 0x8f);

    /// Color at position `step` of `steps` between `self` and `to` (both ends included).
    fn shade(self, to: Rgb, step: usize, steps: usize) -> Rgb {
        if steps <= 1 {
            return to;
        }
        let t = step.min(steps - 1) as f64 / (steps - 1) as f64;
        let channel = |a: u8, b: u8| {
            let (a, b) = (f64::from(a), f64::from(b));
            (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
        };
        Rgb(
            channel(self.0, to.0),
            channel(self.1, to.1),
            channel(self.2, to.2),
        )
    }
}

impl From<Rgb> for Color {
    fn from(c: Rgb) -> Self {
        Color::Rgb {
            r: c.0,
            g: c.1,
            b: c.2,
        }
    }
}

pub struct Banner {
    title: String,
    subtitle: String,
    top: Rgb,
    bottom: Rgb,
}

impl Banner {
    pub fn new(title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
            top: Rgb::AMBER,
            bottom: Rgb::TEAL,
        }
    }

    pub fn with_colors(mut self, top: Rgb, bottom: Rgb) -> Self {
        self.top = top;
        self.bottom = bottom;
        self
    }

    /// Banner rows with their color. The subtitle takes the top color.
    pub fn rows(&self) -> Vec<(String, Rgb)> {
        let art = FIGfont::standard()
            .ok()
            .and_then(|font| font.convert(&self.title).map(|fig| fig.to_string()))
            .unwrap_or_else(|| self.title.clone());
        let art: Vec<&str> = art.lines().filter(|l| !l.trim().is_empty()).collect();
        let steps = art.len();

        let mut rows: Vec<(String, Rgb)> = art
            .into_iter()
            .enumerate()
            .map(|(i, line)| (line.to_string(), self.top.shade(self.bottom, i, steps)))
            .collect();
        if !self.subtitle.is_empty() {
            rows.push((self.subtitle.clone(), self.top));
        }
        rows
    }

    pub fn write_to(&self, out: &mut impl Write) -> io::Result<()> {
        for (line, color) in self.rows() {
            queue!(
                out,
                SetForegroundColor(color.into()),
                Print(line),
                ResetColor,
                Print("\r\n")
            )?;
        }
        out.flush()
    }
}

/// Prints the default banner to stdout. Terminal errors are ignored.
pub fn print_welcome() {
    let banner = Banner::new(
        "DATAMART",
        format!("datamart-dash v{}", env!("CARGO_PKG_VERSION")),
    );
    let _ = banner.write_to(&mut io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shade_endpoints_and_midpoint() {
        let black = Rgb(0, 0, 0);
        let white = Rgb(255, 255, 255);
        assert_eq!(black.shade(white, 0, 3), black);
        assert_eq!(black.shade(white, 2, 3), white);
        assert_eq!(black.shade(white, 1, 3), Rgb(128, 128, 128));
        assert_eq!(white.shade(black, 1, 3), Rgb(128, 128, 128));
        assert_eq!(white.shade(black, 2, 3), black);
        assert_eq!(black.shade(white, 0, 1), white);
    }

    #[test]
    fn test_rows_run_from_top_to_bottom_color() {
        let banner = Banner::new("DM", "v1").with_colors(Rgb(10, 20, 30), Rgb(200, 100, 0));
        let rows = banner.rows();
        assert!(rows.len() > 2);

        let art = &rows[..rows.len() - 1];
        assert_eq!(art[0].1, Rgb(10, 20, 30));
        assert_eq!(art[art.len() - 1].1, Rgb(200, 100, 0));
        assert_eq!(rows.last(), Some(&("v1".to_string(), Rgb(10, 20, 30))));
    }

    #[test]
    fn test_empty_subtitle_is_omitted() {
        let with = Banner::new("DM", "v1").rows().len();
        let without = Banner::new("DM", "").rows().len();
        assert_eq!(with, without + 1);
    }

    #[test]
    fn test_write_to_emits_colored_lines() {
        let banner = Banner::new("DM", "subtitle").with_colors(Rgb(1, 2, 3), Rgb(4, 5, 6));
        let mut buf: Vec<u8> = Vec::new();
        banner.write_to(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("\x1b[38;2;1;2;3m"));
        assert!(text.contains("\x1b[38;2;4;5;6m"));
        assert!(text.contains("subtitle"));
        assert_eq!(text.matches("\r\n").count(), banner.rows().len());
    }
}
