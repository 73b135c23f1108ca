//! # pdx-parser
//!
//! Parser for paperdex query sentences, built on a pest PEG grammar
//! (`src/query.pest`).
//!
//! ```text
//! get one papers that mention person Fiona Calvert
//! get all papers that mention organisation Acme and person Jane Doe
//! get papers
//! ```
//!
//! A sentence that does not match the grammar yields
//! [`QueryError::InvalidQuerySyntax`]; no partial query is ever returned.

pub mod ast;

use pest::error::{Error as PestError, LineColLocation};
use pest::iterators::Pair;
use pest::Parser;

use pdx_core::{EntityKind, QueryError};

use crate::ast::{Combinator, Condition, ConditionChain, Query, Quantifier};

#[derive(pest_derive::Parser)]
#[grammar = "query.pest"]
struct SentenceParser;

/// Keywords of the query language, in grammar order. Used for shell
/// completion.
pub const KEYWORDS: &[&str] = &[
    "get",
    "one",
    "all",
    "papers",
    "that",
    "mention",
    "person",
    "organisation",
    "work",
    "and",
    "or",
];

/// Parse a query sentence into a [`Query`].
///
/// # Errors
///
/// Returns [`QueryError::InvalidQuerySyntax`] if the sentence does not
/// start with `get`, lacks `papers`, or has a malformed mention clause.
pub fn parse_query(input: &str) -> Result<Query, QueryError> {
    let mut pairs =
        SentenceParser::parse(Rule::query, input).map_err(|e| syntax_error(input, e))?;
    let root = pairs
        .next()
        .ok_or_else(|| invalid(input, "empty parse".to_string()))?;

    let mut query = Query {
        quantifier: Quantifier::All,
        mentions: None,
    };

    for pair in root.into_inner() {
        match pair.as_rule() {
            Rule::quantifier => query.quantifier = build_quantifier(pair),
            Rule::mention_clause => query.mentions = Some(build_chain(input, pair)?),
            _ => {}
        }
    }

    Ok(query)
}

fn build_quantifier(pair: Pair<'_, Rule>) -> Quantifier {
    match pair.into_inner().next().map(|p| p.as_rule()) {
        Some(Rule::kw_one) => Quantifier::One,
        _ => Quantifier::All,
    }
}

fn build_chain(input: &str, pair: Pair<'_, Rule>) -> Result<ConditionChain, QueryError> {
    let mut chain: Option<ConditionChain> = None;
    let mut pending: Option<Combinator> = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::condition => {
                let condition = build_condition(inner);
                if let Some(chain) = chain.as_mut() {
                    let op = pending
                        .take()
                        .ok_or_else(|| invalid(input, "missing combinator".to_string()))?;
                    chain.push(op, condition);
                } else {
                    chain = Some(ConditionChain::new(condition));
                }
            }
            Rule::combinator => pending = Some(build_combinator(inner)),
            _ => {}
        }
    }

    chain.ok_or_else(|| invalid(input, "expected a condition after 'mention'".to_string()))
}

fn build_condition(pair: Pair<'_, Rule>) -> Condition {
    let mut kind = None;
    let mut words: Vec<&str> = Vec::new();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::entity_type => kind = EntityKind::from_keyword(inner.as_str()),
            Rule::name => words.extend(inner.into_inner().map(|w| w.as_str())),
            _ => {}
        }
    }

    Condition::new(kind, words.join(" "))
}

fn build_combinator(pair: Pair<'_, Rule>) -> Combinator {
    match pair.into_inner().next().map(|p| p.as_rule()) {
        Some(Rule::kw_or) => Combinator::Or,
        _ => Combinator::And,
    }
}

fn syntax_error(input: &str, err: PestError<Rule>) -> QueryError {
    let err = err.renamed_rules(describe_rule);
    let column = match err.line_col {
        LineColLocation::Pos((_, col)) | LineColLocation::Span((_, col), _) => col,
    };
    invalid(input, format!("{} at column {column}", err.variant.message()))
}

fn invalid(input: &str, message: String) -> QueryError {
    QueryError::InvalidQuerySyntax {
        input: input.to_string(),
        message,
    }
}

fn describe_rule(rule: &Rule) -> String {
    match rule {
        Rule::kw_get => "'get'",
        Rule::kw_one => "'one'",
        Rule::kw_all => "'all'",
        Rule::kw_papers => "'papers'",
        Rule::kw_that => "'that'",
        Rule::kw_mention => "'mention'",
        Rule::kw_and => "'and'",
        Rule::kw_or => "'or'",
        Rule::kw_person => "'person'",
        Rule::kw_organisation => "'organisation'",
        Rule::kw_work => "'work'",
        Rule::quantifier => "'one' or 'all'",
        Rule::mention_clause => "'that mention'",
        Rule::combinator => "'and' or 'or'",
        Rule::entity_type => "an entity type",
        Rule::condition | Rule::name | Rule::name_word | Rule::word => "an entity name",
        Rule::EOI => "end of query",
        _ => "input",
    }
    .to_string()
}
