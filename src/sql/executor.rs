//! Statement executor: maps AST nodes onto store and index operations.
//!
//! The planner steers SELECT and DELETE between an O(1) keyed lookup, an
//! O(n) scan, and the vector-search path; INSERT/CREATE/DROP dispatch by
//! statement kind. UPDATE is recognized by the parser but not executable.

use crate::config::DEFAULT_SEARCH_LIMIT;
use crate::distance::DistanceMetric;
use crate::error::{Result, VectorDbError};
use crate::index::{FlatIndex, HnswIndex, IndexKind, VectorIndex};
use crate::record::VectorRecord;
use crate::sql::ast::{Node, NodeKind};
use crate::sql::functions::FunctionRegistry;
use crate::sql::planner::{Plan, PlanKind};
use crate::sql::result::{Column, ColumnKind, ResultSet, Value};
use crate::store::VectorStore;
use regex::Regex;
use std::collections::BTreeMap;

pub(crate) struct Executor<'a> {
    pub store: &'a dyn VectorStore,
    pub index_kind: IndexKind,
    pub metric: DistanceMetric,
    pub functions: &'a FunctionRegistry,
}

impl Executor<'_> {
    pub fn execute(&self, node: &Node, plan: &Plan) -> Result<ResultSet> {
        match node.kind {
            NodeKind::Select => self.execute_select(node, plan),
            NodeKind::Insert => self.execute_insert(node),
            NodeKind::Delete => self.execute_delete(node, plan),
            NodeKind::Create => self.execute_create(node),
            NodeKind::Drop => self.execute_drop(node),
            NodeKind::Update => Err(VectorDbError::Unsupported(
                "UPDATE statements are not implemented".to_string(),
            )),
            other => Err(VectorDbError::Unsupported(format!(
                "cannot execute node kind {other:?}"
            ))),
        }
    }

    fn execute_select(&self, node: &Node, plan: &Plan) -> Result<ResultSet> {
        let mut columns = select_columns(node);
        let is_count = node
            .children
            .iter()
            .any(|c| c.kind == NodeKind::Column && c.value == "COUNT(*)");
        if is_count {
            columns = vec![Column::new("COUNT(*)", ColumnKind::Int)];
        }

        if plan.kind == PlanKind::VectorSearch {
            if is_count {
                return Err(VectorDbError::invalid_query(
                    "COUNT(*) cannot be combined with NEAREST TO",
                ));
            }
            return self.execute_nearest(node, plan, columns);
        }

        let mut ids: Vec<String> = match plan.kind {
            PlanKind::IdLookup => {
                let id = lookup_id(plan)?;
                match self.store.get(&id) {
                    Ok(_) => vec![id],
                    Err(e) if e.is_not_found() => Vec::new(),
                    Err(e) => return Err(e),
                }
            }
            _ => {
                let all = self.store.list()?;
                match &plan.condition {
                    Some(condition) => {
                        let mut filtered = Vec::new();
                        for id in all {
                            let record = match self.store.get(&id) {
                                Ok(record) => record,
                                Err(e) => {
                                    tracing::warn!("skipping record {id}: {e}");
                                    continue;
                                }
                            };
                            if evaluate_condition(condition, &record)? {
                                filtered.push(id);
                            }
                        }
                        filtered
                    }
                    None => all,
                }
            }
        };
        ids.sort();

        if let Some(limit) = plan.limit {
            if limit > 0 && limit < ids.len() {
                ids.truncate(limit);
            }
        }

        if is_count {
            let count = self
                .functions
                .get("COUNT")
                .ok_or_else(|| VectorDbError::invalid_query("unknown function: COUNT"))?;
            let mut total = 0i64;
            for _ in &ids {
                if let Value::Int(n) = count.eval(&[Value::Str("*".to_string())])? {
                    total += n;
                }
            }
            return Ok(ResultSet {
                columns,
                rows: vec![vec![Value::Int(total)]],
            });
        }

        let mut rows = Vec::with_capacity(ids.len());
        for id in &ids {
            let Ok(record) = self.store.get(id) else {
                continue;
            };
            rows.push(materialize_row(&columns, id, &record, None));
        }
        Ok(ResultSet { columns, rows })
    }

    fn execute_nearest(
        &self,
        node: &Node,
        plan: &Plan,
        mut columns: Vec<Column>,
    ) -> Result<ResultSet> {
        let vector_node = plan
            .vector_query
            .as_ref()
            .ok_or_else(|| VectorDbError::invalid_query("missing query vector"))?;

        let query = match vector_node.kind {
            NodeKind::Identifier => self.store.get(&vector_node.value)?,
            NodeKind::Vector => {
                VectorRecord::new("query", parse_vector_literal(&vector_node.value)?)
            }
            NodeKind::Literal => VectorRecord::new(
                "query",
                parse_vector_literal(strip_quotes(&vector_node.value))?,
            ),
            _ => {
                return Err(VectorDbError::invalid_query(
                    "invalid query vector expression",
                ))
            }
        };

        // USING overrides the engine default; a bad tag is an error.
        let nearest = node
            .child_of_kind(NodeKind::NearestTo)
            .expect("vector search plan implies a NEAREST TO clause");
        let metric = match nearest.child_of_kind(NodeKind::Metric) {
            Some(m) => strip_quotes(&m.value).parse::<DistanceMetric>()?,
            None => self.metric,
        };

        let limit = plan.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);

        // Snapshot the store, skipping records that fail to load.
        let ids = self.store.list()?;
        let mut records = Vec::with_capacity(ids.len());
        for id in &ids {
            match self.store.get(id) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!("skipping record {id} in search snapshot: {e}"),
            }
        }

        let index: Box<dyn VectorIndex> = match self.index_kind {
            IndexKind::Flat => Box::new(FlatIndex::new(Some(metric))),
            IndexKind::Hnsw => Box::new(HnswIndex::with_defaults(Some(metric))),
        };
        index.build(&records)?;
        let results = index.search(&query, limit)?;
        tracing::debug!(
            "vector search over {} records via {} returned {} results",
            records.len(),
            index.name(),
            results.len()
        );

        if !columns.iter().any(|c| c.name == "distance") {
            columns.push(Column::new("distance", ColumnKind::Float));
        }

        let mut rows = Vec::with_capacity(results.len());
        for result in results {
            // A query-by-id should not return the query vector itself.
            if result.id == query.id {
                continue;
            }
            rows.push(materialize_row(
                &columns,
                &result.id,
                &result.vector,
                Some(result.distance),
            ));
        }
        Ok(ResultSet { columns, rows })
    }

    fn execute_insert(&self, node: &Node) -> Result<ResultSet> {
        node.child_of_kind(NodeKind::Table)
            .ok_or_else(|| VectorDbError::invalid_query("missing collection name"))?;

        let values_node = node
            .named_group("values")
            .filter(|v| !v.children.is_empty())
            .ok_or_else(|| VectorDbError::invalid_query("missing values"))?;
        let column_names: Vec<String> = node
            .named_group("columns")
            .map(|c| c.children.iter().map(|n| n.value.clone()).collect())
            .unwrap_or_default();

        let mut id: Option<String> = None;
        let mut vector_values: Option<Vec<f32>> = None;
        let mut metadata = BTreeMap::new();

        for (i, value_node) in values_node.children.iter().enumerate() {
            let name = column_names.get(i).cloned().unwrap_or_else(|| match i {
                0 => "id".to_string(),
                1 => "vector".to_string(),
                _ => format!("col{i}"),
            });

            if name.eq_ignore_ascii_case("id") {
                id = Some(strip_quotes(&value_node.value).to_string());
            } else if name.eq_ignore_ascii_case("vector") {
                let values = match value_node.kind {
                    NodeKind::Vector => parse_vector_literal(&value_node.value)?,
                    NodeKind::Literal => {
                        parse_vector_literal(strip_quotes(&value_node.value))?
                    }
                    _ => {
                        return Err(VectorDbError::invalid_query(
                            "vector column requires a vector literal",
                        ))
                    }
                };
                vector_values = Some(values);
            } else if name.len() > 9 && name[..9].eq_ignore_ascii_case("metadata.") {
                if value_node.kind == NodeKind::Literal {
                    metadata.insert(
                        name[9..].to_string(),
                        strip_quotes(&value_node.value).to_string(),
                    );
                }
            }
        }

        let id = id
            .filter(|s| !s.is_empty())
            .ok_or_else(|| VectorDbError::invalid_query("missing ID"))?;
        let values = vector_values
            .filter(|v| !v.is_empty())
            .ok_or_else(|| VectorDbError::invalid_query("missing vector values"))?;

        let record = VectorRecord::with_metadata(id.clone(), values, metadata);
        self.store.insert(&record)?;

        Ok(ResultSet::message(format!(
            "Inserted 1 vector with ID '{id}'"
        )))
    }

    fn execute_delete(&self, node: &Node, plan: &Plan) -> Result<ResultSet> {
        node.child_of_kind(NodeKind::Table)
            .ok_or_else(|| VectorDbError::invalid_query("missing collection name"))?;
        let condition = plan
            .condition
            .as_ref()
            .ok_or_else(|| VectorDbError::invalid_query("DELETE requires a WHERE clause"))?;

        let mut deleted = 0usize;
        if plan.kind == PlanKind::IdLookup {
            let id = lookup_id(plan)?;
            if self.store.delete(&id).is_ok() {
                deleted = 1;
            }
        } else {
            for id in self.store.list()? {
                let Ok(record) = self.store.get(&id) else {
                    continue;
                };
                if evaluate_condition(condition, &record)? && self.store.delete(&id).is_ok() {
                    deleted += 1;
                }
            }
        }

        Ok(ResultSet::message(format!("Deleted {deleted} vectors")))
    }

    fn execute_create(&self, node: &Node) -> Result<ResultSet> {
        let table = node
            .child_of_kind(NodeKind::Table)
            .ok_or_else(|| VectorDbError::invalid_query("missing collection name"))?;

        if let Some(dimension) = node.named_group("dimension") {
            let valid = dimension
                .children
                .first()
                .map_or(false, |c| {
                    c.kind == NodeKind::Literal && c.value.eq_ignore_ascii_case("INT")
                });
            if !valid {
                return Err(VectorDbError::invalid_query(
                    "invalid dimension specification",
                ));
            }
        }

        // Single implicit collection: the statement validates but is a no-op.
        Ok(ResultSet::message(format!(
            "Created collection '{}'",
            table.value
        )))
    }

    fn execute_drop(&self, node: &Node) -> Result<ResultSet> {
        let table = node
            .child_of_kind(NodeKind::Table)
            .ok_or_else(|| VectorDbError::invalid_query("missing collection name"))?;

        let mut deleted = 0usize;
        for id in self.store.list()? {
            if self.store.delete(&id).is_ok() {
                deleted += 1;
            }
        }

        Ok(ResultSet::message(format!(
            "Dropped collection '{}' ({deleted} vectors deleted)",
            table.value
        )))
    }
}

/// Extracts the literal id from an ID_LOOKUP plan's `id = <literal>` condition.
fn lookup_id(plan: &Plan) -> Result<String> {
    plan.condition
        .as_ref()
        .and_then(|c| c.children.get(1))
        .map(|lit| strip_quotes(&lit.value).to_string())
        .ok_or_else(|| VectorDbError::invalid_query("malformed id lookup"))
}

/// Result columns from the projection list. `id`, `vector`, `dimension`, and
/// `distance` are built-in; anything else renders the record id.
fn select_columns(node: &Node) -> Vec<Column> {
    node.children
        .iter()
        .filter(|c| {
            matches!(
                c.kind,
                NodeKind::Column | NodeKind::Identifier | NodeKind::Alias
            )
        })
        .map(|c| Column::new(&c.value, column_kind(&c.value)))
        .collect()
}

fn column_kind(name: &str) -> ColumnKind {
    match name {
        "dimension" => ColumnKind::Int,
        "distance" => ColumnKind::Float,
        "COUNT(*)" => ColumnKind::Int,
        _ => ColumnKind::Text,
    }
}

fn materialize_row(
    columns: &[Column],
    id: &str,
    record: &VectorRecord,
    distance: Option<f32>,
) -> Vec<Value> {
    columns
        .iter()
        .map(|col| match col.name.as_str() {
            "id" => Value::Str(id.to_string()),
            "vector" => Value::Str(format_values(record)),
            "dimension" => Value::Int(record.dimension() as i64),
            "distance" => match distance {
                Some(d) => Value::Float(d),
                None => Value::Str(id.to_string()),
            },
            _ => Value::Str(id.to_string()),
        })
        .collect()
}

fn format_values(record: &VectorRecord) -> String {
    let parts: Vec<String> = record.values.iter().map(|v| v.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

/// Strips a matching layer of surrounding single or double quotes.
fn strip_quotes(text: &str) -> &str {
    text.trim_matches(|c| c == '\'' || c == '"')
}

/// Parses a vector literal like `[1.0, 2.0, 3.0]` into finite floats.
fn parse_vector_literal(text: &str) -> Result<Vec<f32>> {
    let trimmed = text.trim().trim_start_matches('[').trim_end_matches(']');
    let mut values = Vec::new();
    for part in trimmed.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let value: f32 = part
            .parse()
            .map_err(|_| VectorDbError::invalid_query(format!("invalid vector value: {part}")))?;
        if !value.is_finite() {
            return Err(VectorDbError::invalid_query(format!(
                "non-finite vector value: {part}"
            )));
        }
        values.push(value);
    }
    Ok(values)
}

/// Left-hand side of a supported WHERE comparison.
enum Target {
    Id,
    Metadata(String),
}

/// Validates the `<id-or-metadata> <op> <literal>` shape shared by the
/// comparison operators.
fn operands(cond: &Node) -> Result<(Target, String)> {
    if cond.children.len() != 2 {
        return Err(VectorDbError::invalid_query(format!(
            "unsupported expression shape for operator {}",
            cond.value
        )));
    }
    let left = &cond.children[0];
    let right = &cond.children[1];
    if left.kind != NodeKind::Identifier || right.kind != NodeKind::Literal {
        return Err(VectorDbError::invalid_query(format!(
            "unsupported operand shape for operator {}",
            cond.value
        )));
    }

    let literal = strip_quotes(&right.value).to_string();
    if left.value.eq_ignore_ascii_case("id") {
        Ok((Target::Id, literal))
    } else if left.value.len() > 9 && left.value[..9].eq_ignore_ascii_case("metadata.") {
        Ok((Target::Metadata(left.value[9..].to_string()), literal))
    } else {
        Err(VectorDbError::invalid_query(format!(
            "unsupported column in WHERE clause: {}",
            left.value
        )))
    }
}

/// Evaluates a WHERE expression against one record.
pub(crate) fn evaluate_condition(cond: &Node, record: &VectorRecord) -> Result<bool> {
    if cond.kind != NodeKind::BinaryOp {
        return Err(VectorDbError::invalid_query(format!(
            "unsupported node kind in WHERE clause: {:?}",
            cond.kind
        )));
    }

    match cond.value.to_ascii_uppercase().as_str() {
        "AND" => {
            if !evaluate_condition(&cond.children[0], record)? {
                return Ok(false);
            }
            evaluate_condition(&cond.children[1], record)
        }
        "OR" => {
            if evaluate_condition(&cond.children[0], record)? {
                return Ok(true);
            }
            evaluate_condition(&cond.children[1], record)
        }
        "=" | "!=" | "<>" => {
            let (target, literal) = operands(cond)?;
            let matched = match target {
                Target::Id => record.id == literal,
                Target::Metadata(key) => {
                    record.metadata.get(&key).map_or(false, |v| *v == literal)
                }
            };
            if cond.value == "=" {
                Ok(matched)
            } else {
                Ok(!matched)
            }
        }
        "LIKE" => {
            let (target, pattern) = operands(cond)?;
            let regex = like_to_regex(&pattern)?;
            let matched = match target {
                Target::Id => regex.is_match(&record.id),
                Target::Metadata(key) => {
                    record.metadata.get(&key).map_or(false, |v| regex.is_match(v))
                }
            };
            Ok(matched)
        }
        other => Err(VectorDbError::invalid_query(format!(
            "unsupported operator: {other}"
        ))),
    }
}

/// Translates a SQL LIKE pattern into an anchored regex: `%` matches any
/// run, `_` any single character, and a backslash escapes the following
/// character (so `a\_b` matches only the literal `a_b`).
fn like_to_regex(pattern: &str) -> Result<Regex> {
    let mut out = String::from("^");
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) => out.push_str(&regex::escape(&escaped.to_string())),
                None => out.push_str(&regex::escape("\\")),
            },
            '%' => out.push_str(".*"),
            '_' => out.push('.'),
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out.push('$');
    Regex::new(&out)
        .map_err(|e| VectorDbError::invalid_query(format!("invalid LIKE pattern: {e}")))
}
