//! Query shell.
//!
//! On a terminal the shell uses rustyline: keyword completion, hints from
//! earlier lines, and a history file kept across sessions. Piped input is
//! read line by line with no prompt. Either way the shell stops at `q`,
//! `quit`, or end of input, and a bad sentence prints a short message
//! without ending the session.

use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{anyhow, Result};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::{Hinter, HistoryHinter};
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tracing::{debug, warn};

use pdx_query::{format_papers, run_sentence, OutputFormat, NO_RESULTS};
use pdx_store::GraphStore;

pub const INVALID_QUERY: &str = "Invalid query. Please try again.";

/// Shell words completed alongside the query keywords.
const SHELL_WORDS: &[&str] = &["help", "q", "quit"];

enum Control {
    Continue,
    Exit,
}

/// Run the shell over `input`, writing results to `out`.
pub fn run<R: BufRead, W: Write>(store: &GraphStore, mut input: R, out: &mut W) -> Result<()> {
    loop {
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match dispatch(store, line, out)? {
            Control::Continue => {}
            Control::Exit => break,
        }
    }

    Ok(())
}

/// Run the shell on the terminal with line editing. History is loaded from
/// and saved to `history`.
pub fn run_interactive(store: &GraphStore, history: &Path) -> Result<()> {
    let mut rl: Editor<QueryHelper, DefaultHistory> =
        Editor::new().map_err(|e| anyhow!("failed to init line editor: {e}"))?;
    rl.set_helper(Some(QueryHelper {
        hinter: HistoryHinter {},
    }));
    if let Err(e) = rl.load_history(history) {
        debug!(path = %history.display(), error = %e, "no shell history loaded");
    }

    println!("paperdex query shell. Tab completes keywords. Type `help` for the grammar, `q` to quit.");

    let mut out = io::stdout();
    loop {
        let line = match rl.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Eof) => break,
            Err(ReadlineError::Interrupted) => continue,
            Err(e) => return Err(anyhow!("readline error: {e}")),
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        rl.add_history_entry(line)
            .map_err(|e| anyhow!("failed to record history: {e}"))?;

        match dispatch(store, line, &mut out)? {
            Control::Continue => {}
            Control::Exit => break,
        }
    }

    if let Some(parent) = history.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if let Err(e) = rl.save_history(history) {
        warn!(path = %history.display(), error = %e, "failed to save shell history");
    }
    Ok(())
}

fn dispatch<W: Write>(store: &GraphStore, line: &str, out: &mut W) -> Result<Control> {
    if line.eq_ignore_ascii_case("q") || line.eq_ignore_ascii_case("quit") {
        return Ok(Control::Exit);
    }
    if line.eq_ignore_ascii_case("help") {
        print_help(out)?;
        return Ok(Control::Continue);
    }

    match run_sentence(store, line) {
        Ok(rows) if rows.is_empty() => writeln!(out, "{NO_RESULTS}")?,
        Ok(rows) => write!(out, "{}", format_papers(&rows, OutputFormat::Table))?,
        Err(e) if e.is_invalid_query() => writeln!(out, "{INVALID_QUERY}")?,
        Err(e) => writeln!(out, "error: {e}")?,
    }
    Ok(Control::Continue)
}

fn print_help<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out, "get [one|all] papers [that mention [person|organisation|work] NAME ((and|or) ...)*]")?;
    writeln!(out, "keywords: {}", pdx_parser::KEYWORDS.join(", "))?;
    Ok(())
}

/// Start of the word under the cursor and the words it can complete to.
/// Matching ignores case.
fn complete_word(line: &str, pos: usize) -> (usize, Vec<&'static str>) {
    let start = line[..pos]
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map_or(0, |(i, c)| i + c.len_utf8());
    let prefix = line[start..pos].to_lowercase();

    let candidates = pdx_parser::KEYWORDS
        .iter()
        .chain(SHELL_WORDS)
        .copied()
        .filter(|word| word.starts_with(&prefix))
        .collect();
    (start, candidates)
}

struct QueryHelper {
    hinter: HistoryHinter,
}

impl Helper for QueryHelper {}

impl Highlighter for QueryHelper {}

impl Validator for QueryHelper {}

impl Hinter for QueryHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, ctx: &Context<'_>) -> Option<String> {
        self.hinter.hint(line, pos, ctx)
    }
}

impl Completer for QueryHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, words) = complete_word(line, pos);
        let pairs = words
            .into_iter()
            .map(|word| Pair {
                display: word.to_string(),
                replacement: word.to_string(),
            })
            .collect();
        Ok((start, pairs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdx_core::Config;
    use std::io::Cursor;

    fn store() -> GraphStore {
        let store = GraphStore::in_memory().unwrap();
        let paper_id = store
            .upsert_paper(&Config::default().paper("Calvert 2021", "calvert.pdf"))
            .unwrap();
        let entity_id = store.upsert_entity("Fiona Calvert", "PERSON").unwrap();
        store.link_paper_entity(paper_id, entity_id).unwrap();
        store
    }

    fn session(input: &str) -> String {
        let mut out = Vec::new();
        run(&store(), Cursor::new(input), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn prints_matching_papers() {
        let out = session("get papers that mention person Fiona Calvert\n");
        assert!(out.contains("Calvert 2021"));
        assert!(out.starts_with("paper_id"));
    }

    #[test]
    fn invalid_sentence_keeps_loop_alive() {
        let out = session("find papers\nget papers\n");
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some(INVALID_QUERY));
        assert!(out.contains("Calvert 2021"));
    }

    #[test]
    fn empty_result_message() {
        let out = session("get papers that mention person Nobody\n");
        assert_eq!(out.trim_end(), NO_RESULTS);
    }

    #[test]
    fn quit_stops_reading() {
        let out = session("\n  \nQ\nget papers\n");
        assert!(out.is_empty());
        assert!(session("quit\nget papers\n").is_empty());
    }

    #[test]
    fn help_lists_keywords() {
        let out = session("help\n");
        assert!(out.contains("keywords: get, one, all, papers"));
    }

    #[test]
    fn completes_keyword_under_cursor() {
        let line = "get papers that MEN";
        assert_eq!(complete_word(line, line.len()), (16, vec!["mention"]));

        let (start, words) = complete_word("get o", 5);
        assert_eq!(start, 4);
        assert_eq!(words, vec!["one", "organisation", "or"]);
    }

    #[test]
    fn completes_shell_words_and_first_word() {
        assert_eq!(complete_word("q", 1), (0, vec!["q", "quit"]));
        let (start, words) = complete_word("", 0);
        assert_eq!(start, 0);
        assert!(words.contains(&"get") && words.contains(&"help"));
    }

    #[test]
    fn completion_stops_at_unicode_whitespace() {
        let line = "get\u{a0}pa";
        assert_eq!(complete_word(line, line.len()), (5, vec!["papers"]));
        assert!(complete_word("get papers that mention Zed", 27).1.is_empty());
    }
}
