//! Abstract syntax tree for the SQL surface.
//!
//! A deliberately small, homogeneous tree: every node carries a kind tag, a
//! string value, and ordered children. Statement shape:
//!
//! ```text
//! Select
//! ├── projection nodes (Identifier | Column | Alias | expression)
//! ├── From ── Table
//! ├── NearestTo ── vector expr [── Metric]     (optional)
//! ├── Where ── expression                      (optional)
//! └── Limit                                    (optional)
//! ```

/// Kind tag of an AST node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Select,
    Insert,
    Delete,
    Create,
    Drop,
    Update,
    NearestTo,
    From,
    Where,
    Limit,
    Column,
    Alias,
    Table,
    Identifier,
    BinaryOp,
    Literal,
    Vector,
    Metric,
}

/// One node in the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub value: String,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(kind: NodeKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(kind: NodeKind, value: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            kind,
            value: value.into(),
            children,
        }
    }

    /// First direct child of the given kind.
    pub fn child_of_kind(&self, kind: NodeKind) -> Option<&Node> {
        self.children.iter().find(|c| c.kind == kind)
    }

    /// First direct child that is an Identifier with the given value
    /// (used for the parser's synthetic "columns"/"values" groupings).
    pub fn named_group(&self, name: &str) -> Option<&Node> {
        self.children
            .iter()
            .find(|c| c.kind == NodeKind::Identifier && c.value == name)
    }

    /// Renders the node back into parseable SQL. Expressions are emitted
    /// fully parenthesized, so re-parsing the output reproduces an
    /// equivalent tree.
    pub fn unparse(&self) -> String {
        match self.kind {
            NodeKind::Select => self.unparse_select(),
            NodeKind::Insert => self.unparse_insert(),
            NodeKind::Delete => self.unparse_delete(),
            NodeKind::Create => self.unparse_create(),
            NodeKind::Drop => format!("DROP COLLECTION {}", self.table_name()),
            NodeKind::Update => self.unparse_update(),
            NodeKind::BinaryOp => match self.children.len() {
                1 => format!("({}{})", self.value, self.children[0].unparse()),
                _ => format!(
                    "({} {} {})",
                    self.children[0].unparse(),
                    self.value,
                    self.children[1].unparse()
                ),
            },
            NodeKind::Alias => format!("{} AS {}", self.children[0].unparse(), self.value),
            // Literal values keep their original quoting; vectors are verbatim.
            _ => self.value.clone(),
        }
    }

    fn table_name(&self) -> &str {
        self.child_of_kind(NodeKind::Table)
            .map(|t| t.value.as_str())
            .unwrap_or("")
    }

    fn unparse_select(&self) -> String {
        let projections: Vec<String> = self
            .children
            .iter()
            .filter(|c| {
                !matches!(
                    c.kind,
                    NodeKind::From | NodeKind::NearestTo | NodeKind::Where | NodeKind::Limit
                )
            })
            .map(Node::unparse)
            .collect();

        let mut out = format!("SELECT {}", projections.join(", "));
        if let Some(from) = self.child_of_kind(NodeKind::From) {
            out.push_str(&format!(" FROM {}", from.table_name()));
        }
        if let Some(nearest) = self.child_of_kind(NodeKind::NearestTo) {
            let vector_expr = &nearest.children[0];
            if vector_expr.kind == NodeKind::Select {
                out.push_str(&format!(" NEAREST TO ({})", vector_expr.unparse()));
            } else {
                out.push_str(&format!(" NEAREST TO {}", vector_expr.unparse()));
            }
            if let Some(metric) = nearest.child_of_kind(NodeKind::Metric) {
                out.push_str(&format!(" USING {}", metric.value));
            }
        }
        if let Some(where_node) = self.child_of_kind(NodeKind::Where) {
            out.push_str(&format!(" WHERE {}", where_node.children[0].unparse()));
        }
        if let Some(limit) = self.child_of_kind(NodeKind::Limit) {
            out.push_str(&format!(" LIMIT {}", limit.value));
        }
        out
    }

    fn unparse_insert(&self) -> String {
        let mut out = format!("INSERT INTO {}", self.table_name());
        if let Some(columns) = self.named_group("columns") {
            let names: Vec<&str> = columns.children.iter().map(|c| c.value.as_str()).collect();
            out.push_str(&format!(" ({})", names.join(", ")));
        }
        if let Some(values) = self.named_group("values") {
            let rendered: Vec<String> = values.children.iter().map(Node::unparse).collect();
            out.push_str(&format!(" VALUES ({})", rendered.join(", ")));
        }
        out
    }

    fn unparse_delete(&self) -> String {
        let mut out = format!("DELETE FROM {}", self.table_name());
        if let Some(where_node) = self.child_of_kind(NodeKind::Where) {
            out.push_str(&format!(" WHERE {}", where_node.children[0].unparse()));
        }
        out
    }

    fn unparse_create(&self) -> String {
        let mut out = format!("CREATE COLLECTION {}", self.table_name());
        if self.named_group("dimension").is_some() {
            out.push_str(" (DIMENSION INT)");
        }
        out
    }

    fn unparse_update(&self) -> String {
        let mut out = format!("UPDATE {} SET ", self.table_name());
        if let Some(assignments) = self.named_group("assignments") {
            let rendered: Vec<String> = assignments
                .children
                .iter()
                .map(|a| format!("{} = {}", a.children[0].unparse(), a.children[1].unparse()))
                .collect();
            out.push_str(&rendered.join(", "));
        }
        if let Some(where_node) = self.child_of_kind(NodeKind::Where) {
            out.push_str(&format!(" WHERE {}", where_node.children[0].unparse()));
        }
        out
    }
}
