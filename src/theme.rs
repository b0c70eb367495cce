use crate::markup::{self, Block, Inline};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub dark: bool,
    pub text: Color,
    pub muted: Color,
    pub heading: Color,
    pub border: Color,
    pub user: Color,
    pub assistant: Color,
    pub info: Color,
    pub error: Color,
}

impl Palette {
    pub fn for_mode(dark: bool) -> Self {
        if dark { Self::dark() } else { Self::light() }
    }

    pub fn dark() -> Self {
        Self {
            dark: true,
            text: Color::Gray,
            muted: Color::DarkGray,
            heading: Color::White,
            border: Color::DarkGray,
            user: Color::LightBlue,
            assistant: Color::Gray,
            info: Color::DarkGray,
            error: Color::LightRed,
        }
    }

    pub fn light() -> Self {
        Self {
            dark: false,
            text: Color::Black,
            muted: Color::Gray,
            heading: Color::Black,
            border: Color::Gray,
            user: Color::Blue,
            assistant: Color::Black,
            info: Color::Gray,
            error: Color::Red,
        }
    }

    pub fn toggled(self) -> Self {
        Self::for_mode(!self.dark)
    }

    fn body(&self) -> Style {
        Style::default().fg(self.text)
    }

    fn heading_style(&self, level: u8) -> Style {
        let style = Style::default()
            .fg(self.heading)
            .add_modifier(Modifier::BOLD);
        if level <= 2 {
            style.add_modifier(Modifier::UNDERLINED)
        } else {
            style
        }
    }
}

/// Markup text straight to styled terminal text.
pub fn render_text(text: &str, palette: &Palette) -> Text<'static> {
    Text::from(block_lines(&markup::render(text), palette))
}

pub fn block_lines(blocks: &[Block], palette: &Palette) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for block in blocks {
        match block {
            Block::Heading { level, content } => {
                lines.push(Line::from(spans(content, palette.heading_style(*level))));
            }
            Block::Paragraph(content) => {
                lines.push(Line::from(spans(content, palette.body())));
            }
            Block::List { items, .. } => {
                for item in items {
                    let mut line = vec![Span::styled("  • ", Style::default().fg(palette.muted))];
                    line.extend(spans(item, palette.body()));
                    lines.push(Line::from(line));
                }
            }
            Block::Table { header, rows } => table_lines(header, rows, palette, &mut lines),
            Block::LineBreak => lines.push(Line::default()),
        }
    }
    lines
}

fn spans(content: &[Inline], base: Style) -> Vec<Span<'static>> {
    content
        .iter()
        .map(|run| match run {
            Inline::Plain(text) => Span::styled(text.clone(), base),
            Inline::Bold(text) => Span::styled(text.clone(), base.add_modifier(Modifier::BOLD)),
        })
        .collect()
}

fn table_lines(
    header: &[Vec<Inline>],
    rows: &[Vec<Vec<Inline>>],
    palette: &Palette,
    out: &mut Vec<Line<'static>>,
) {
    let columns = rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in std::iter::once(header).chain(rows.iter().map(Vec::as_slice)) {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(markup::plain_text(cell).chars().count());
        }
    }

    let border = Style::default().fg(palette.border);
    let header_style = palette.body().add_modifier(Modifier::BOLD);

    out.push(table_row(header, &widths, header_style, border));
    let rule = widths
        .iter()
        .map(|w| "─".repeat(w + 2))
        .collect::<Vec<_>>()
        .join("┼");
    out.push(Line::from(Span::styled(format!("├{}┤", rule), border)));
    for row in rows {
        out.push(table_row(row, &widths, palette.body(), border));
    }
}

fn table_row(
    cells: &[Vec<Inline>],
    widths: &[usize],
    style: Style,
    border: Style,
) -> Line<'static> {
    let mut line = vec![Span::styled("│", border)];
    for (i, width) in widths.iter().enumerate() {
        let cell = cells.get(i).map(Vec::as_slice).unwrap_or(&[]);
        let used = markup::plain_text(cell).chars().count();
        line.push(Span::raw(" "));
        line.extend(spans(cell, style));
        line.push(Span::raw(" ".repeat(width - used + 1)));
        line.push(Span::styled("│", border));
    }
    Line::from(line)
}

/// Flattens styled lines back to text, e.g. for plain stdout output.
pub fn plain_lines(lines: &[Line<'_>]) -> Vec<String> {
    lines
        .iter()
        .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
        .collect()
}
