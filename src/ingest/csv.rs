use std::io::{self, Write};
use std::mem::take;

/// Minimal CSV parser (quotes + CRLF tolerant). Blank lines are dropped.
pub fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut field = String::new();
    let mut row = Vec::new();
    let mut in_quotes = false;
    let mut chars = text.trim_start_matches('\u{feff}').chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    if matches!(chars.peek(), Some('"')) {
                        chars.next(); // escaped quote
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            ',' if !in_quotes => row.push(take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) {
                    chars.next();
                }
                row.push(take(&mut field));
                push_row(&mut rows, take(&mut row));
            }
            _ => field.push(ch),
        }
    }

    // Trailing row without a final newline, even if quotes were unterminated.
    row.push(field);
    push_row(&mut rows, row);

    rows
}

fn push_row(rows: &mut Vec<Vec<String>>, row: Vec<String>) {
    let blank = row.iter().all(|cell| cell.trim().is_empty());
    if !blank {
        rows.push(row);
    }
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write a single CSV row to any writer.
pub fn write_row<W: Write, S: AsRef<str>>(mut w: W, row: &[S]) -> io::Result<()> {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            write!(w, ",")?;
        }
        let cell = cell.as_ref();
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{cell}")?;
        }
    }
    writeln!(w)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quotes_crlf_and_skips_blank_lines() {
        let text = "Category: All categories\r\n\r\nDay,\"a, b: (India)\",c\r\n2024-01-01,<1,\"5\"\n";
        let rows = parse_rows(text);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec!["Category: All categories"]);
        assert_eq!(rows[1], vec!["Day", "a, b: (India)", "c"]);
        assert_eq!(rows[2], vec!["2024-01-01", "<1", "5"]);
    }

    #[test]
    fn writes_quoted_cells_when_needed() {
        let mut buf = Vec::new();
        write_row(&mut buf, &["Keyword", "a, \"b\"", "1.5"]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "Keyword,\"a, \"\"b\"\"\",1.5\n");
    }

    #[test]
    fn written_rows_parse_back() {
        let mut buf = Vec::new();
        write_row(&mut buf, &["x,y", "z"]).unwrap();
        let rows = parse_rows(&String::from_utf8(buf).unwrap());
        assert_eq!(rows, vec![vec!["x,y".to_string(), "z".to_string()]]);
    }
}
