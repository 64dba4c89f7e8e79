//! SQL-like query surface over a vector store.
//!
//! [`QueryEngine`] is the public entry point: it tokenizes and parses a
//! statement, classifies it through the planner, and executes it against the
//! store (and, for NEAREST TO queries, a transient index built from a store
//! snapshot).
//!
//! ```no_run
//! use std::sync::Arc;
//! use vectorsql::distance::DistanceMetric;
//! use vectorsql::index::IndexKind;
//! use vectorsql::sql::QueryEngine;
//! use vectorsql::store::MemoryStore;
//!
//! let engine = QueryEngine::new(
//!     Arc::new(MemoryStore::new()),
//!     IndexKind::Flat,
//!     DistanceMetric::Euclidean,
//! );
//! engine.execute("INSERT INTO vectors (id, vector) VALUES ('v1', [1.0, 0.0])")?;
//! let result = engine.execute("SELECT id, distance FROM vectors NEAREST TO [1.0, 0.0] LIMIT 5")?;
//! println!("{}", result.render());
//! # Ok::<(), vectorsql::error::VectorDbError>(())
//! ```

pub mod ast;
mod executor;
pub mod functions;
pub mod parser;
pub mod planner;
pub mod result;
pub mod token;

pub use functions::{FunctionRegistry, SqlFunction};
pub use result::{Column, ColumnKind, ResultSet, Value};

use crate::distance::DistanceMetric;
use crate::error::Result;
use crate::index::IndexKind;
use crate::settings::Settings;
use crate::store::VectorStore;
use executor::Executor;
use std::sync::Arc;

/// Executes SQL statements against a vector store.
pub struct QueryEngine {
    store: Arc<dyn VectorStore>,
    index_kind: IndexKind,
    metric: DistanceMetric,
    functions: FunctionRegistry,
}

impl QueryEngine {
    /// Creates an engine with the given store, index selection, and default
    /// metric. The built-in SQL functions are registered.
    pub fn new(store: Arc<dyn VectorStore>, index_kind: IndexKind, metric: DistanceMetric) -> Self {
        Self {
            store,
            index_kind,
            metric,
            functions: FunctionRegistry::new(),
        }
    }

    /// Creates an engine configured from [`Settings`], with euclidean as the
    /// default metric.
    pub fn from_settings(store: Arc<dyn VectorStore>, settings: &Settings) -> Self {
        Self::new(store, settings.indexing.kind, DistanceMetric::Euclidean)
    }

    /// Registers an additional SQL function on this engine.
    pub fn register_function(&mut self, function: Box<dyn SqlFunction>) {
        self.functions.register(function);
    }

    /// Parses, plans, and executes one statement.
    pub fn execute(&self, sql: &str) -> Result<ResultSet> {
        let ast = parser::parse(sql)?;
        let plan = planner::create_plan(&ast)?;
        tracing::debug!("executing {} plan (cost={})", plan.kind, plan.cost);

        let executor = Executor {
            store: self.store.as_ref(),
            index_kind: self.index_kind,
            metric: self.metric,
            functions: &self.functions,
        };
        executor.execute(&ast, &plan)
    }

    /// Returns the human-readable execution plan for a statement without
    /// running it.
    pub fn explain(&self, sql: &str) -> Result<String> {
        let ast = parser::parse(sql)?;
        let plan = planner::create_plan(&ast)?;
        Ok(planner::display(&plan))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VectorDbError;
    use crate::store::MemoryStore;

    fn engine(kind: IndexKind) -> QueryEngine {
        QueryEngine::new(Arc::new(MemoryStore::new()), kind, DistanceMetric::Euclidean)
    }

    fn populated_engine(kind: IndexKind) -> QueryEngine {
        let engine = engine(kind);
        for (id, values) in [
            ("vec1", vec![1.0, 0.0, 0.0]),
            ("vec2", vec![0.0, 1.0, 0.0]),
            ("vec3", vec![0.0, 0.0, 1.0]),
            ("vec4", vec![1.0, 1.0, 0.0]),
            ("vec5", vec![0.5, 0.5, 0.5]),
        ] {
            engine
                .execute(&format!(
                    "INSERT INTO vectors (id, vector) VALUES ('{id}', [{}])",
                    values
                        .iter()
                        .map(|v| v.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
                .unwrap();
        }
        engine
    }

    #[test]
    fn test_insert_and_select_ids() {
        let engine = populated_engine(IndexKind::Flat);
        let rs = engine.execute("SELECT id FROM vectors").unwrap();
        assert_eq!(rs.rows.len(), 5);
        // ids come back sorted
        assert_eq!(rs.rows[0][0], Value::Str("vec1".into()));
        assert_eq!(rs.rows[4][0], Value::Str("vec5".into()));
    }

    #[test]
    fn test_select_dimension_column() {
        let engine = populated_engine(IndexKind::Flat);
        let rs = engine
            .execute("SELECT id, dimension FROM vectors WHERE id = 'vec1'")
            .unwrap();
        assert_eq!(rs.rows.len(), 1);
        assert_eq!(rs.rows[0][1], Value::Int(3));
    }

    #[test]
    fn test_id_lookup_missing_is_empty() {
        let engine = populated_engine(IndexKind::Flat);
        let rs = engine
            .execute("SELECT id FROM vectors WHERE id = 'missing'")
            .unwrap();
        assert!(rs.rows.is_empty());
    }

    #[test]
    fn test_select_with_limit() {
        let engine = populated_engine(IndexKind::Flat);
        let rs = engine.execute("SELECT id FROM vectors LIMIT 2").unwrap();
        assert_eq!(rs.rows.len(), 2);
    }

    #[test]
    fn test_count_star() {
        let engine = populated_engine(IndexKind::Flat);
        let rs = engine.execute("SELECT COUNT(*) FROM vectors").unwrap();
        assert_eq!(rs.columns[0].name, "COUNT(*)");
        assert_eq!(rs.rows, vec![vec![Value::Int(5)]]);
    }

    #[test]
    fn test_count_with_filter() {
        let engine = populated_engine(IndexKind::Flat);
        let rs = engine
            .execute("SELECT COUNT(*) FROM vectors WHERE id LIKE 'vec%'")
            .unwrap();
        assert_eq!(rs.rows, vec![vec![Value::Int(5)]]);
    }

    #[test]
    fn test_count_with_nearest_rejected() {
        let engine = populated_engine(IndexKind::Flat);
        let err = engine
            .execute("SELECT COUNT(*) FROM vectors NEAREST TO [1.0, 0.0, 0.0]")
            .unwrap_err();
        assert!(matches!(err, VectorDbError::InvalidQuery(_)));
    }

    #[test]
    fn test_nearest_search_flat() {
        let engine = populated_engine(IndexKind::Flat);
        let rs = engine
            .execute("SELECT id, distance FROM vectors NEAREST TO [1.0, 0.0, 0.0] LIMIT 3")
            .unwrap();
        assert_eq!(rs.rows.len(), 3);
        assert_eq!(rs.rows[0][0], Value::Str("vec1".into()));
        assert_eq!(rs.rows[0][1], Value::Float(0.0));
    }

    #[test]
    fn test_nearest_search_hnsw() {
        let engine = populated_engine(IndexKind::Hnsw);
        let rs = engine
            .execute("SELECT id, distance FROM vectors NEAREST TO [1.0, 0.0, 0.0] LIMIT 3")
            .unwrap();
        assert_eq!(rs.rows.len(), 3);
        assert_eq!(rs.rows[0][0], Value::Str("vec1".into()));
    }

    #[test]
    fn test_nearest_adds_distance_column() {
        let engine = populated_engine(IndexKind::Flat);
        let rs = engine
            .execute("SELECT id FROM vectors NEAREST TO [1.0, 0.0, 0.0] LIMIT 2")
            .unwrap();
        assert!(rs.columns.iter().any(|c| c.name == "distance"));
        assert_eq!(rs.rows[0].len(), 2);
    }

    #[test]
    fn test_nearest_with_metric() {
        let engine = populated_engine(IndexKind::Flat);
        let rs = engine
            .execute(
                "SELECT id, distance FROM vectors NEAREST TO [1.0, 0.0, 0.0] USING cosine LIMIT 1",
            )
            .unwrap();
        assert_eq!(rs.rows[0][0], Value::Str("vec1".into()));
        assert_eq!(rs.rows[0][1], Value::Float(0.0));
    }

    #[test]
    fn test_nearest_with_unknown_metric() {
        let engine = populated_engine(IndexKind::Flat);
        let err = engine
            .execute("SELECT id FROM vectors NEAREST TO [1.0, 0.0, 0.0] USING hamming")
            .unwrap_err();
        assert!(matches!(err, VectorDbError::UnknownMetric(_)));
    }

    #[test]
    fn test_nearest_to_stored_id_excludes_self() {
        let engine = populated_engine(IndexKind::Flat);
        let rs = engine
            .execute("SELECT id, distance FROM vectors NEAREST TO vec1 LIMIT 5")
            .unwrap();
        assert!(rs.rows.iter().all(|row| row[0] != Value::Str("vec1".into())));
    }

    #[test]
    fn test_nearest_default_limit() {
        let engine = engine(IndexKind::Flat);
        for i in 0..25 {
            engine
                .execute(&format!(
                    "INSERT INTO vectors (id, vector) VALUES ('v{i:02}', [{}.0, 0.0])",
                    i
                ))
                .unwrap();
        }
        let rs = engine
            .execute("SELECT id FROM vectors NEAREST TO [0.0, 0.0]")
            .unwrap();
        assert_eq!(rs.rows.len(), 10);
    }

    #[test]
    fn test_insert_duplicate_id() {
        let engine = populated_engine(IndexKind::Flat);
        let err = engine
            .execute("INSERT INTO vectors (id, vector) VALUES ('vec1', [1.0, 2.0, 3.0])")
            .unwrap_err();
        assert!(matches!(err, VectorDbError::VectorAlreadyExists(_)));
    }

    #[test]
    fn test_insert_missing_id_or_vector() {
        let engine = engine(IndexKind::Flat);
        assert!(engine
            .execute("INSERT INTO vectors (vector) VALUES ([1.0, 2.0])")
            .is_err());
        assert!(engine
            .execute("INSERT INTO vectors (id) VALUES ('v1')")
            .is_err());
    }

    #[test]
    fn test_insert_without_column_list() {
        let engine = engine(IndexKind::Flat);
        let rs = engine
            .execute("INSERT INTO vectors VALUES ('v1', [1.0, 2.0])")
            .unwrap();
        assert_eq!(
            rs.rows[0][0],
            Value::Str("Inserted 1 vector with ID 'v1'".into())
        );
        let count = engine.execute("SELECT COUNT(*) FROM vectors").unwrap();
        assert_eq!(count.rows[0][0], Value::Int(1));
    }

    #[test]
    fn test_insert_vector_as_string_literal() {
        let engine = engine(IndexKind::Flat);
        engine
            .execute("INSERT INTO vectors (id, vector) VALUES ('v1', '[1.0, 2.0]')")
            .unwrap();
        let rs = engine
            .execute("SELECT dimension FROM vectors WHERE id = 'v1'")
            .unwrap();
        assert_eq!(rs.rows[0][0], Value::Int(2));
    }

    #[test]
    fn test_insert_with_metadata_column() {
        let engine = engine(IndexKind::Flat);
        engine
            .execute(
                "INSERT INTO vectors (id, vector, metadata.category) VALUES ('vec10', [1.0, 2.0, 3.0], 'image')",
            )
            .unwrap();
        let rs = engine
            .execute("SELECT id FROM vectors WHERE metadata.category = 'image'")
            .unwrap();
        assert_eq!(rs.rows, vec![vec![Value::Str("vec10".into())]]);
    }

    #[test]
    fn test_delete_requires_where() {
        let engine = populated_engine(IndexKind::Flat);
        let err = engine.execute("DELETE FROM vectors").unwrap_err();
        assert!(matches!(err, VectorDbError::InvalidQuery(_)));
    }

    #[test]
    fn test_delete_by_id_then_recount() {
        let engine = engine(IndexKind::Flat);
        engine
            .execute("INSERT INTO vectors (id, vector) VALUES ('v1', [1.0, 2.0])")
            .unwrap();

        let rs = engine
            .execute("DELETE FROM vectors WHERE id = 'v1'")
            .unwrap();
        assert_eq!(rs.rows[0][0], Value::Str("Deleted 1 vectors".into()));

        let count = engine.execute("SELECT COUNT(*) FROM vectors").unwrap();
        assert_eq!(count.rows[0][0], Value::Int(0));

        // Deleting again affects zero rows without erroring.
        let rs = engine
            .execute("DELETE FROM vectors WHERE id = 'v1'")
            .unwrap();
        assert_eq!(rs.rows[0][0], Value::Str("Deleted 0 vectors".into()));
    }

    #[test]
    fn test_delete_with_like() {
        let engine = populated_engine(IndexKind::Flat);
        let rs = engine
            .execute("DELETE FROM vectors WHERE id LIKE 'vec%'")
            .unwrap();
        assert_eq!(rs.rows[0][0], Value::Str("Deleted 5 vectors".into()));
    }

    #[test]
    fn test_create_and_drop() {
        let engine = populated_engine(IndexKind::Flat);
        let rs = engine.execute("CREATE COLLECTION vectors").unwrap();
        assert_eq!(rs.rows[0][0], Value::Str("Created collection 'vectors'".into()));

        let rs = engine
            .execute("CREATE COLLECTION vectors (DIMENSION INT)")
            .unwrap();
        assert_eq!(rs.rows[0][0], Value::Str("Created collection 'vectors'".into()));

        let rs = engine.execute("DROP COLLECTION vectors").unwrap();
        assert_eq!(
            rs.rows[0][0],
            Value::Str("Dropped collection 'vectors' (5 vectors deleted)".into())
        );
        let count = engine.execute("SELECT COUNT(*) FROM vectors").unwrap();
        assert_eq!(count.rows[0][0], Value::Int(0));
    }

    #[test]
    fn test_update_is_unsupported() {
        let engine = populated_engine(IndexKind::Flat);
        let err = engine
            .execute("UPDATE vectors SET id = 'x' WHERE id = 'vec1'")
            .unwrap_err();
        assert!(matches!(err, VectorDbError::Unsupported(_)));
    }

    #[test]
    fn test_select_missing_from() {
        let engine = populated_engine(IndexKind::Flat);
        let err = engine.execute("SELECT id").unwrap_err();
        assert!(matches!(err, VectorDbError::InvalidQuery(_)));
    }

    #[test]
    fn test_parse_error_surface() {
        let engine = engine(IndexKind::Flat);
        let err = engine.execute("SELECT FROM WHERE").unwrap_err();
        assert!(matches!(err, VectorDbError::Parse(_)));
    }

    #[test]
    fn test_explain_select() {
        let engine = populated_engine(IndexKind::Flat);
        let text = engine
            .explain("SELECT id FROM vectors WHERE id = 'vec1'")
            .unwrap();
        assert!(text.contains("ID_LOOKUP"));

        let text = engine
            .explain("SELECT id FROM vectors NEAREST TO [1.0] USING manhattan LIMIT 2")
            .unwrap();
        assert!(text.contains("VECTOR_SEARCH"));
        assert!(text.contains("manhattan"));
    }

    #[test]
    fn test_from_settings_uses_configured_index() {
        let settings = crate::settings::Settings::default();
        let engine = QueryEngine::from_settings(Arc::new(MemoryStore::new()), &settings);
        engine
            .execute("INSERT INTO vectors (id, vector) VALUES ('v1', [1.0, 0.0])")
            .unwrap();
        let rs = engine
            .execute("SELECT id FROM vectors NEAREST TO [1.0, 0.0] LIMIT 1")
            .unwrap();
        assert_eq!(rs.rows[0][0], Value::Str("v1".into()));
    }

    #[test]
    fn test_custom_function_registration() {
        struct Dim;
        impl SqlFunction for Dim {
            fn name(&self) -> &str {
                "DIM"
            }
            fn eval(&self, _args: &[Value]) -> crate::error::Result<Value> {
                Ok(Value::Int(3))
            }
        }

        let mut engine = engine(IndexKind::Flat);
        engine.register_function(Box::new(Dim));
        assert!(engine.functions.get("dim").is_some());
    }
}
