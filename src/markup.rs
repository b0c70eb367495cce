//! Line-oriented renderer for the markdown subset the assistant answers in.
//!
//! Each source line is classified on its own (table row, heading, list item,
//! blank, paragraph). List items and table rows accumulate into an open run
//! that is flushed as one block when a line of another kind arrives or the
//! input ends. Rendering is total: anything unrecognized becomes a paragraph.

use regex::Regex;
use std::sync::LazyLock;

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").expect("valid heading regex"));
static BULLET_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-*•]\s+(.+)").expect("valid bullet regex"));
static NUMBERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[0-9]+\.\s+(.+)").expect("valid numbered regex"));
static TABLE_ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\|(.+)\|$").expect("valid table regex"));
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid bold regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Plain(String),
    Bold(String),
}

impl Inline {
    pub fn text(&self) -> &str {
        match self {
            Inline::Plain(text) | Inline::Bold(text) => text,
        }
    }
}

pub type InlineContent = Vec<Inline>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading {
        level: u8,
        content: InlineContent,
    },
    Paragraph(InlineContent),
    /// Bullet and numbered items share one run, so `ordered` is always false.
    List {
        ordered: bool,
        items: Vec<InlineContent>,
    },
    Table {
        header: Vec<InlineContent>,
        rows: Vec<Vec<InlineContent>>,
    },
    LineBreak,
}

pub fn render(text: &str) -> Vec<Block> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut builder = BlockBuilder::default();
    for line in text.split('\n') {
        builder.push_line(line.strip_suffix('\r').unwrap_or(line));
    }
    builder.finish()
}

/// Splits `**bold**` spans out of a line. Spans are matched lazily left to
/// right and never nest; everything else is passed through verbatim.
pub fn parse_inline(text: &str) -> InlineContent {
    let mut runs = Vec::new();
    let mut last = 0;

    for caps in BOLD.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            runs.push(Inline::Plain(text[last..whole.start()].to_string()));
        }
        runs.push(Inline::Bold(inner.as_str().to_string()));
        last = whole.end();
    }

    if last < text.len() {
        runs.push(Inline::Plain(text[last..].to_string()));
    }

    runs
}

/// Concatenated text of a line with markup removed.
pub fn plain_text(content: &[Inline]) -> String {
    content.iter().map(Inline::text).collect()
}

enum Run {
    List(Vec<InlineContent>),
    Table(Vec<Vec<InlineContent>>),
}

#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<Block>,
    run: Option<Run>,
}

impl BlockBuilder {
    fn push_line(&mut self, line: &str) {
        if let Some(cells) = table_cells(line) {
            if !matches!(self.run, Some(Run::Table(_))) {
                self.close_run();
                self.run = Some(Run::Table(Vec::new()));
            }
            if !is_separator(&cells)
                && let Some(Run::Table(rows)) = &mut self.run
            {
                rows.push(cells.into_iter().map(parse_inline).collect());
            }
            return;
        }

        if matches!(self.run, Some(Run::Table(_))) {
            self.close_run();
        }

        if let Some(caps) = HEADING.captures(line) {
            self.close_run();
            let level = caps[1].len() as u8;
            self.blocks.push(Block::Heading {
                level,
                content: parse_inline(&caps[2]),
            });
        } else if let Some(item) = list_item(line) {
            match &mut self.run {
                Some(Run::List(items)) => items.push(parse_inline(item)),
                _ => self.run = Some(Run::List(vec![parse_inline(item)])),
            }
        } else {
            self.close_run();
            if line.trim().is_empty() {
                self.blocks.push(Block::LineBreak);
            } else {
                self.blocks.push(Block::Paragraph(parse_inline(line)));
            }
        }
    }

    fn close_run(&mut self) {
        match self.run.take() {
            Some(Run::List(items)) => self.blocks.push(Block::List {
                ordered: false,
                items,
            }),
            Some(Run::Table(mut rows)) => {
                if !rows.is_empty() {
                    let header = rows.remove(0);
                    self.blocks.push(Block::Table { header, rows });
                }
            }
            None => {}
        }
    }

    fn finish(mut self) -> Vec<Block> {
        self.close_run();
        self.blocks
    }
}

fn list_item(line: &str) -> Option<&str> {
    BULLET_ITEM
        .captures(line)
        .or_else(|| NUMBERED_ITEM.captures(line))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn table_cells(line: &str) -> Option<Vec<&str>> {
    if !TABLE_ROW.is_match(line) {
        return None;
    }
    let parts: Vec<&str> = line.split('|').collect();
    Some(parts[1..parts.len() - 1].iter().map(|c| c.trim()).collect())
}

/// Rows made only of dashes, colons and blanks, e.g. `|:--|--:|` or `|   |`.
fn is_separator(cells: &[&str]) -> bool {
    cells
        .iter()
        .all(|cell| cell.chars().all(|c| c == '-' || c == ':' || c.is_whitespace()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &str) -> Inline {
        Inline::Plain(text.to_string())
    }

    fn bold(text: &str) -> Inline {
        Inline::Bold(text.to_string())
    }

    fn para(text: &str) -> Block {
        Block::Paragraph(vec![plain(text)])
    }

    fn cells(values: &[&str]) -> Vec<InlineContent> {
        values.iter().map(|v| parse_inline(v)).collect()
    }

    #[test]
    fn empty_input_renders_nothing() {
        assert!(render("").is_empty());
    }

    #[test]
    fn bold_only_line() {
        assert_eq!(render("**bold**"), vec![Block::Paragraph(vec![bold("bold")])]);
    }

    #[test]
    fn heading_then_paragraph() {
        assert_eq!(
            render("# Title\nbody"),
            vec![
                Block::Heading {
                    level: 1,
                    content: vec![plain("Title")]
                },
                para("body"),
            ]
        );
    }

    #[test]
    fn heading_levels() {
        for level in 1..=6u8 {
            let line = format!("{} Level", "#".repeat(level as usize));
            assert_eq!(
                render(&line),
                vec![Block::Heading {
                    level,
                    content: vec![plain("Level")]
                }]
            );
        }
        assert_eq!(render("####### Seven"), vec![para("####### Seven")]);
        assert_eq!(render("#NoSpace"), vec![para("#NoSpace")]);
    }

    #[test]
    fn list_closes_before_blank_line_break() {
        assert_eq!(
            render("- a\n- b\n\nc"),
            vec![
                Block::List {
                    ordered: false,
                    items: vec![vec![plain("a")], vec![plain("b")]]
                },
                Block::LineBreak,
                para("c"),
            ]
        );
    }

    #[test]
    fn bullet_and_numbered_items_share_one_list() {
        assert_eq!(
            render("1. one\n* two\n  • three\n2.  four"),
            vec![Block::List {
                ordered: false,
                items: vec![
                    vec![plain("one")],
                    vec![plain("two")],
                    vec![plain("three")],
                    vec![plain("four")],
                ]
            }]
        );
    }

    #[test]
    fn heading_closes_open_list() {
        assert_eq!(
            render("- a\n## Next"),
            vec![
                Block::List {
                    ordered: false,
                    items: vec![vec![plain("a")]]
                },
                Block::Heading {
                    level: 2,
                    content: vec![plain("Next")]
                },
            ]
        );
    }

    #[test]
    fn table_with_separator() {
        assert_eq!(
            render("| a | b |\n| - | - |\n| 1 | 2 |"),
            vec![Block::Table {
                header: cells(&["a", "b"]),
                rows: vec![cells(&["1", "2"])],
            }]
        );
    }

    #[test]
    fn blank_table_row_is_consumed() {
        assert_eq!(
            render("| a | b |\n|:-:|:-:|\n|   |   |\n| 1 | 2 |"),
            vec![Block::Table {
                header: cells(&["a", "b"]),
                rows: vec![cells(&["1", "2"])],
            }]
        );
    }

    #[test]
    fn aligned_separator_is_consumed() {
        let blocks = render("|Name|Score|\n|:---|---:|\n|**Ann**|9|\n|Bob|7|");
        assert_eq!(
            blocks,
            vec![Block::Table {
                header: cells(&["Name", "Score"]),
                rows: vec![
                    vec![vec![bold("Ann")], vec![plain("9")]],
                    cells(&["Bob", "7"]),
                ],
            }]
        );
    }

    #[test]
    fn separator_only_table_emits_nothing() {
        assert!(render("|---|---|").is_empty());
        assert!(render("|   |").is_empty());
        assert!(render("| : |").is_empty());
        assert!(render("| : | : |\n|   |   |").is_empty());
        assert_eq!(render("|---|\ntext"), vec![para("text")]);
    }

    #[test]
    fn table_closes_on_non_table_line_and_at_end() {
        assert_eq!(
            render("- item\n| h |\n| r |\nafter\n| x |"),
            vec![
                Block::List {
                    ordered: false,
                    items: vec![vec![plain("item")]]
                },
                Block::Table {
                    header: cells(&["h"]),
                    rows: vec![cells(&["r"])],
                },
                para("after"),
                Block::Table {
                    header: cells(&["x"]),
                    rows: vec![],
                },
            ]
        );
    }

    #[test]
    fn list_item_after_table_starts_new_run() {
        assert_eq!(
            render("| h |\n- a"),
            vec![
                Block::Table {
                    header: cells(&["h"]),
                    rows: vec![],
                },
                Block::List {
                    ordered: false,
                    items: vec![vec![plain("a")]]
                },
            ]
        );
    }

    #[test]
    fn empty_cells_are_kept() {
        assert_eq!(
            render("| | x |"),
            vec![Block::Table {
                header: vec![vec![], vec![plain("x")]],
                rows: vec![],
            }]
        );
    }

    #[test]
    fn bold_spans_are_lazy_and_flat() {
        assert_eq!(
            parse_inline("a **b** c **d**"),
            vec![plain("a "), bold("b"), plain(" c "), bold("d")]
        );
        assert_eq!(
            parse_inline("**a** and **b**"),
            vec![bold("a"), plain(" and "), bold("b")]
        );
        assert_eq!(parse_inline("****"), vec![plain("****")]);
        assert_eq!(parse_inline("**open"), vec![plain("**open")]);
        assert_eq!(parse_inline("*em* `code`"), vec![plain("*em* `code`")]);
        assert!(parse_inline("").is_empty());
    }

    #[test]
    fn bold_inside_list_and_heading() {
        assert_eq!(
            render("- **key**: value\n### **Big** title"),
            vec![
                Block::List {
                    ordered: false,
                    items: vec![vec![bold("key"), plain(": value")]]
                },
                Block::Heading {
                    level: 3,
                    content: vec![bold("Big"), plain(" title")]
                },
            ]
        );
    }

    #[test]
    fn plain_text_maps_one_block_per_line() {
        let text = "first line\n\nsecond line\n   \nthird\n";
        let blocks = render(text);
        assert_eq!(blocks.len(), text.split('\n').count());
        assert_eq!(
            blocks,
            vec![
                para("first line"),
                Block::LineBreak,
                para("second line"),
                Block::LineBreak,
                para("third"),
                Block::LineBreak,
            ]
        );
    }

    #[test]
    fn crlf_lines_are_classified_like_lf() {
        assert_eq!(render("# T\r\nbody\r\n"), render("# T\nbody\n"));
    }

    #[test]
    fn lookalikes_fall_through_to_paragraphs() {
        assert_eq!(render("---"), vec![para("---")]);
        assert_eq!(render("-no space"), vec![para("-no space")]);
        assert_eq!(render("3.14 is pi"), vec![para("3.14 is pi")]);
        assert_eq!(render(" | not a table |"), vec![para(" | not a table |")]);
    }

    #[test]
    fn plain_text_strips_markup() {
        assert_eq!(plain_text(&parse_inline("a **b** c")), "a b c");
    }
}
