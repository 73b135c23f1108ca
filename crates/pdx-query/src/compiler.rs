//! Query AST → SQL compiler.
//!
//! Every query selects `papers.*`. A mention clause joins through
//! `papers_have_entities` to `entities` and becomes the `WHERE` clause:
//! each condition is rendered in parentheses and followed by its
//! combinator, in sentence order, with no regrouping. Quantifier `one`
//! adds `LIMIT 1`.
//!
//! Two renderings are produced in the same pass:
//! - [`CompiledQuery::sql`] with `?N` placeholders, which is what runs
//! - [`CompiledQuery::to_sql_text`] with quoted literals, for display

use pdx_core::QueryError;
use pdx_parser::ast::{ChainNode, Combinator, Condition, ConditionChain, Quantifier, Query};

const SELECT: &str = "SELECT papers.* FROM papers";
const JOINS: &str = " INNER JOIN papers_have_entities ON papers_have_entities.paper_id = papers.paper_id \
INNER JOIN entities ON papers_have_entities.entity_id = entities.entity_id";

/// A compiled query: parameterized SQL plus its literal rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    /// The SQL query string with `?N` placeholders.
    pub sql: String,
    /// Bound text parameters, in placeholder order.
    pub params: Vec<String>,
    text: String,
}

impl CompiledQuery {
    /// The same query with every parameter inlined as a quoted literal.
    #[must_use]
    pub fn to_sql_text(&self) -> &str {
        &self.text
    }
}

/// Escape a value for use inside a single-quoted SQL literal.
#[must_use]
pub fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Compile a parsed query.
#[must_use]
pub fn compile(query: &Query) -> CompiledQuery {
    let mut ctx = CompileCtx::default();
    ctx.push_both(SELECT);

    if let Some(chain) = &query.mentions {
        ctx.push_both(JOINS);
        ctx.push_both(" WHERE ");
        compile_chain(chain, &mut ctx);
    }

    if query.quantifier == Quantifier::One {
        ctx.push_both(" LIMIT 1");
    }

    CompiledQuery {
        sql: ctx.sql,
        params: ctx.params,
        text: ctx.text,
    }
}

/// Parse and compile a query sentence.
///
/// # Errors
///
/// Returns [`QueryError::InvalidQuerySyntax`] if the sentence does not
/// parse.
pub fn compile_sentence(sentence: &str) -> Result<CompiledQuery, QueryError> {
    let query = pdx_parser::parse_query(sentence)?;
    Ok(compile(&query))
}

#[derive(Default)]
struct CompileCtx {
    sql: String,
    text: String,
    params: Vec<String>,
}

impl CompileCtx {
    fn push_both(&mut self, fragment: &str) {
        self.sql.push_str(fragment);
        self.text.push_str(fragment);
    }

    fn push_value(&mut self, value: &str) {
        self.params.push(value.to_string());
        self.sql.push_str(&format!("?{}", self.params.len()));
        self.text.push('\'');
        self.text.push_str(&escape_literal(value));
        self.text.push('\'');
    }
}

fn compile_chain(chain: &ConditionChain, ctx: &mut CompileCtx) {
    for node in chain.nodes() {
        match node {
            ChainNode::Condition(condition) => compile_condition(condition, ctx),
            ChainNode::Combinator(op) => compile_combinator(*op, ctx),
        }
    }
}

fn compile_condition(condition: &Condition, ctx: &mut CompileCtx) {
    ctx.push_both("(");
    if let Some(kind) = condition.kind {
        ctx.push_both("entities.entity_type = ");
        ctx.push_value(kind.code());
        ctx.push_both(" AND ");
    }
    ctx.push_both("entities.entity_name = ");
    ctx.push_value(&condition.name);
    ctx.push_both(")");
}

fn compile_combinator(op: Combinator, ctx: &mut CompileCtx) {
    ctx.push_both(" ");
    ctx.push_both(op.keyword());
    ctx.push_both(" ");
}

#[cfg(test)]
mod tests {
    use super::*;

    const FROM_JOINED: &str = "SELECT papers.* FROM papers \
INNER JOIN papers_have_entities ON papers_have_entities.paper_id = papers.paper_id \
INNER JOIN entities ON papers_have_entities.entity_id = entities.entity_id";

    #[test]
    fn compile_single_person_with_limit() {
        let q = compile_sentence("get one papers that mention person Fiona Calvert").unwrap();
        assert_eq!(
            q.to_sql_text(),
            format!(
                "{FROM_JOINED} WHERE (entities.entity_type = 'PERSON' AND \
entities.entity_name = 'Fiona Calvert') LIMIT 1"
            )
        );
        assert_eq!(
            q.sql,
            format!(
                "{FROM_JOINED} WHERE (entities.entity_type = ?1 AND \
entities.entity_name = ?2) LIMIT 1"
            )
        );
        assert_eq!(q.params, vec!["PERSON", "Fiona Calvert"]);
    }

    #[test]
    fn compile_two_conditions_with_and() {
        let q = compile_sentence(
            "get all papers that mention organisation Acme and person Jane Doe",
        )
        .unwrap();
        assert_eq!(
            q.to_sql_text(),
            format!(
                "{FROM_JOINED} WHERE (entities.entity_type = 'ORG' AND entities.entity_name = 'Acme') \
AND (entities.entity_type = 'PERSON' AND entities.entity_name = 'Jane Doe')"
            )
        );
        assert!(!q.sql.contains("LIMIT"));
        assert_eq!(q.params, vec!["ORG", "Acme", "PERSON", "Jane Doe"]);
    }

    #[test]
    fn compile_without_mentions_selects_all_papers() {
        let q = compile_sentence("get papers").unwrap();
        assert_eq!(q.sql, "SELECT papers.* FROM papers");
        assert_eq!(q.to_sql_text(), q.sql);
        assert!(q.params.is_empty());
    }

    #[test]
    fn compile_untyped_condition_and_work_code() {
        let q = compile_sentence("get papers that mention Acme or work The Tempest").unwrap();
        assert_eq!(
            q.to_sql_text(),
            format!(
                "{FROM_JOINED} WHERE (entities.entity_name = 'Acme') OR \
(entities.entity_type = 'WORK_OF_ART' AND entities.entity_name = 'The Tempest')"
            )
        );
    }

    #[test]
    fn quotes_are_doubled_in_text_form_only() {
        let q = compile_sentence("get papers that mention person O'Brien").unwrap();
        assert!(q.to_sql_text().ends_with("entities.entity_name = 'O''Brien')"));
        assert_eq!(q.params, vec!["PERSON", "O'Brien"]);
    }

    #[test]
    fn invalid_sentence_is_an_error() {
        assert!(matches!(
            compile_sentence("find papers"),
            Err(QueryError::InvalidQuerySyntax { .. })
        ));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn compilation_is_deterministic(
                name in "[A-Z][a-z']{0,8}( [A-Z][a-z']{0,8}){0,2}",
                one in any::<bool>(),
            ) {
                let quantifier = if one { "one" } else { "all" };
                let sentence = format!("get {quantifier} papers that mention person {name}");
                if let Ok(first) = compile_sentence(&sentence) {
                    let second = compile_sentence(&sentence).unwrap();
                    prop_assert_eq!(&first, &second);
                    prop_assert_eq!(first.to_sql_text(), second.to_sql_text());
                }
            }

            #[test]
            fn escaped_literal_has_no_lone_quotes(value in ".{0,30}") {
                let escaped = escape_literal(&value);
                prop_assert_eq!(escaped.matches('\'').count(), 2 * value.matches('\'').count());
                prop_assert_eq!(escaped.replace("''", "'"), value);
            }
        }
    }
}
