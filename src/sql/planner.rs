//! Query planner: classifies a parsed statement into an execution plan.
//!
//! Three plan shapes cover the engine:
//! - `ID_LOOKUP` (cost 1) — SELECT/DELETE whose WHERE is exactly `id = <literal>`;
//!   executed as a single keyed store access.
//! - `VECTOR_SEARCH` (cost 10) — any SELECT with a NEAREST TO clause.
//! - `FULL_SCAN` (cost 100) — everything else; the cost drops to `limit` when
//!   a limit exists and no predicate filters.

use crate::error::{Result, VectorDbError};
use crate::sql::ast::{Node, NodeKind};
use std::fmt;

/// Shape of an execution plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanKind {
    FullScan,
    IdLookup,
    VectorSearch,
}

impl fmt::Display for PlanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanKind::FullScan => f.write_str("FULL_SCAN"),
            PlanKind::IdLookup => f.write_str("ID_LOOKUP"),
            PlanKind::VectorSearch => f.write_str("VECTOR_SEARCH"),
        }
    }
}

/// An execution plan for one statement.
#[derive(Debug, Clone)]
pub struct Plan {
    pub kind: PlanKind,
    pub cost: f64,
    pub table: String,
    pub projection: Vec<String>,
    /// WHERE expression (for ID_LOOKUP, the `id = <literal>` node itself).
    pub condition: Option<Node>,
    pub limit: Option<usize>,
    /// Query-vector expression of a NEAREST TO clause.
    pub vector_query: Option<Node>,
    /// Distance tag for a vector search; defaults to euclidean.
    pub metric_tag: Option<String>,
}

impl Plan {
    fn new(kind: PlanKind, cost: f64, table: String) -> Self {
        Self {
            kind,
            cost,
            table,
            projection: Vec::new(),
            condition: None,
            limit: None,
            vector_query: None,
            metric_tag: None,
        }
    }
}

/// Builds a plan for a parsed statement.
pub fn create_plan(node: &Node) -> Result<Plan> {
    match node.kind {
        NodeKind::Select => plan_select(node),
        NodeKind::Delete => plan_delete(node),
        NodeKind::Insert | NodeKind::Create | NodeKind::Drop | NodeKind::Update => {
            let table = table_name(node)?;
            Ok(Plan::new(PlanKind::FullScan, 100.0, table))
        }
        other => Err(VectorDbError::invalid_query(format!(
            "cannot plan node kind {other:?}"
        ))),
    }
}

fn table_name(node: &Node) -> Result<String> {
    node.child_of_kind(NodeKind::Table)
        .map(|t| t.value.clone())
        .ok_or_else(|| VectorDbError::invalid_query("missing table name"))
}

fn parse_limit(node: &Node) -> Result<Option<usize>> {
    match node.child_of_kind(NodeKind::Limit) {
        Some(limit) => limit
            .value
            .parse::<usize>()
            .map(Some)
            .map_err(|_| VectorDbError::invalid_query("invalid LIMIT value")),
        None => Ok(None),
    }
}

/// Matches a WHERE expression of the exact shape `id = <literal>`.
fn id_equality(condition: &Node) -> bool {
    condition.kind == NodeKind::BinaryOp
        && condition.value == "="
        && condition.children.len() == 2
        && condition.children[0].kind == NodeKind::Identifier
        && condition.children[0].value.eq_ignore_ascii_case("id")
        && condition.children[1].kind == NodeKind::Literal
}

fn plan_select(node: &Node) -> Result<Plan> {
    let from = node
        .child_of_kind(NodeKind::From)
        .ok_or_else(|| VectorDbError::invalid_query("missing FROM clause"))?;
    let table = table_name(from)?;

    let mut projection: Vec<String> = node
        .children
        .iter()
        .filter(|c| matches!(c.kind, NodeKind::Column | NodeKind::Identifier | NodeKind::Alias))
        .map(|c| c.value.clone())
        .collect();
    if projection.is_empty() {
        projection.push("*".to_string());
    }

    let limit = parse_limit(node)?;
    let condition = node
        .child_of_kind(NodeKind::Where)
        .and_then(|w| w.children.first())
        .cloned();

    if let Some(nearest) = node.child_of_kind(NodeKind::NearestTo) {
        let mut plan = Plan::new(PlanKind::VectorSearch, 10.0, table);
        plan.projection = projection;
        plan.limit = limit;
        plan.condition = condition;
        plan.vector_query = nearest.children.first().cloned();
        plan.metric_tag = Some(
            nearest
                .child_of_kind(NodeKind::Metric)
                .map(|m| m.value.trim_matches(|c| c == '\'' || c == '"').to_string())
                .unwrap_or_else(|| "euclidean".to_string()),
        );
        return Ok(plan);
    }

    if let Some(ref cond) = condition {
        if id_equality(cond) {
            let mut plan = Plan::new(PlanKind::IdLookup, 1.0, table);
            plan.projection = projection;
            plan.limit = limit;
            plan.condition = condition;
            return Ok(plan);
        }
    }

    let mut plan = Plan::new(PlanKind::FullScan, 100.0, table);
    if let Some(n) = limit {
        if condition.is_none() && n > 0 {
            plan.cost = n as f64;
        }
    }
    plan.projection = projection;
    plan.limit = limit;
    plan.condition = condition;
    Ok(plan)
}

fn plan_delete(node: &Node) -> Result<Plan> {
    let table = table_name(node)?;
    let condition = node
        .child_of_kind(NodeKind::Where)
        .and_then(|w| w.children.first())
        .cloned();

    if let Some(ref cond) = condition {
        if id_equality(cond) {
            let mut plan = Plan::new(PlanKind::IdLookup, 1.0, table);
            plan.condition = condition;
            return Ok(plan);
        }
    }

    let mut plan = Plan::new(PlanKind::FullScan, 100.0, table);
    plan.condition = condition;
    Ok(plan)
}

/// Renders the plan as an indented tree for the engine's explain output.
pub fn display(plan: &Plan) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} (cost={:.2})\n", plan.kind, plan.cost));
    out.push_str(&format!("  Table: {}\n", plan.table));
    if !plan.projection.is_empty() {
        out.push_str(&format!("  Columns: {}\n", plan.projection.join(", ")));
    }
    if let Some(ref condition) = plan.condition {
        out.push_str(&format!("  Filter: {}\n", condition.unparse()));
    }
    if let Some(limit) = plan.limit {
        out.push_str(&format!("  Limit: {limit}\n"));
    }
    if plan.kind == PlanKind::VectorSearch {
        if let Some(ref vector) = plan.vector_query {
            out.push_str(&format!("  Vector: {}\n", vector.unparse()));
        }
        if let Some(ref metric) = plan.metric_tag {
            out.push_str(&format!("  Distance: {metric}\n"));
        }
    }
    out
}
