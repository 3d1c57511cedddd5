//! Terminal output for rendered search results

use crate::cache::render_cache::{RenderedView, RowKind};
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Print a rendered view to stdout
pub fn print_view(view: &RenderedView, color: bool) -> io::Result<()> {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(choice);
    write_view(&mut stdout, view)
}

/// Write rows to any color-aware writer
pub fn write_view<W: WriteColor>(out: &mut W, view: &RenderedView) -> io::Result<()> {
    let mut first_group = true;

    for row in &view.rows {
        match row.kind {
            RowKind::Table => {
                out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)).set_bold(true))?;
                write!(out, "{}", row.label)?;
                out.reset()?;
                write_detail(out, &row.detail)?;
            }
            RowKind::GroupHeader => {
                if !first_group {
                    // Blank line between tables
                    writeln!(out)?;
                }
                first_group = false;

                out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)).set_bold(true))?;
                write!(out, "{}", row.label)?;
                out.reset()?;
                out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
                writeln!(out, " ({})", row.detail)?;
                out.reset()?;
            }
            RowKind::Column => {
                write!(out, "  ")?;
                out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
                write!(out, "{}", row.label)?;
                out.reset()?;
                write_detail(out, &row.detail)?;
            }
        }
    }

    if !view.rows.is_empty() {
        writeln!(out)?;
    }
    out.set_color(ColorSpec::new().set_dimmed(true))?;
    writeln!(out, "{}", view.summary)?;
    out.reset()?;
    Ok(())
}

fn write_detail<W: WriteColor>(out: &mut W, detail: &str) -> io::Result<()> {
    if detail.is_empty() {
        writeln!(out)
    } else {
        writeln!(out, "  {}", detail)
    }
}

/// Print a status line to stderr
pub fn print_status(message: &str, color: bool) -> io::Result<()> {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stderr = StandardStream::stderr(choice);
    stderr.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
    writeln!(stderr, "{}", message)?;
    stderr.reset()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::render_cache::RenderedRow;
    use crate::catalog::types::{Generation, SearchMode};
    use termcolor::NoColor;

    fn row(kind: RowKind, label: &str, detail: &str) -> RenderedRow {
        RenderedRow {
            kind,
            item_key: label.to_string(),
            label: label.to_string(),
            detail: detail.to_string(),
        }
    }

    #[test]
    fn test_write_grouped_columns() {
        let view = RenderedView {
            mode: SearchMode::Columns,
            query: "id".to_string(),
            generation: Generation(1),
            rows: vec![
                row(RowKind::GroupHeader, "TEST.USERS", "1 matching column"),
                row(RowKind::Column, "ID", "INTEGER"),
                row(RowKind::GroupHeader, "TEST.ORDERS", "1 matching column"),
                row(RowKind::Column, "ID", "INTEGER"),
            ],
            summary: "2 columns in 2 tables".to_string(),
        };

        let mut out = NoColor::new(Vec::new());
        write_view(&mut out, &view).unwrap();
        let text = String::from_utf8(out.into_inner()).unwrap();

        assert_eq!(
            text,
            "TEST.USERS (1 matching column)\n  ID  INTEGER\n\n\
             TEST.ORDERS (1 matching column)\n  ID  INTEGER\n\n\
             2 columns in 2 tables\n"
        );
    }

    #[test]
    fn test_write_empty_view() {
        let view = RenderedView {
            mode: SearchMode::Tables,
            query: "zzz".to_string(),
            generation: Generation(1),
            rows: Vec::new(),
            summary: "0 tables".to_string(),
        };
        let mut out = NoColor::new(Vec::new());
        write_view(&mut out, &view).unwrap();
        assert_eq!(String::from_utf8(out.into_inner()).unwrap(), "0 tables\n");
    }
}
