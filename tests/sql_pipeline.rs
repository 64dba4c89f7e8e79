//! End-to-end SQL pipeline tests: tokenizer → parser → planner → executor
//! against both store variants and both index kinds.

use std::collections::BTreeMap;
use std::sync::Arc;
use vectorsql::distance::DistanceMetric;
use vectorsql::index::IndexKind;
use vectorsql::sql::{QueryEngine, Value};
use vectorsql::store::{FileStore, MemoryStore, VectorStore};
use vectorsql::record::VectorRecord;

fn memory_engine(kind: IndexKind) -> QueryEngine {
    QueryEngine::new(Arc::new(MemoryStore::new()), kind, DistanceMetric::Euclidean)
}

fn insert_axis_vectors(engine: &QueryEngine) {
    for (id, values) in [
        ("vec1", "[1.0, 0.0, 0.0]"),
        ("vec2", "[0.0, 1.0, 0.0]"),
        ("vec3", "[0.0, 0.0, 1.0]"),
        ("vec4", "[1.0, 1.0, 0.0]"),
        ("vec5", "[0.5, 0.5, 0.5]"),
    ] {
        engine
            .execute(&format!(
                "INSERT INTO vectors (id, vector) VALUES ('{id}', {values})"
            ))
            .unwrap();
    }
}

#[test]
fn flat_search_returns_exact_neighbors() {
    let engine = memory_engine(IndexKind::Flat);
    for (id, values) in [
        ("v1", "[1.0, 0.0, 0.0]"),
        ("v2", "[2.0, 0.0, 0.0]"),
        ("v3", "[3.0, 0.0, 0.0]"),
    ] {
        engine
            .execute(&format!(
                "INSERT INTO vectors (id, vector) VALUES ('{id}', {values})"
            ))
            .unwrap();
    }

    let rs = engine
        .execute("SELECT id, distance FROM vectors NEAREST TO [0.0, 0.0, 0.0] LIMIT 2")
        .unwrap();
    assert_eq!(rs.rows.len(), 2);
    assert_eq!(rs.rows[0][0], Value::Str("v1".into()));
    assert_eq!(rs.rows[0][1], Value::Float(1.0));
    assert_eq!(rs.rows[1][0], Value::Str("v2".into()));
    assert_eq!(rs.rows[1][1], Value::Float(2.0));
}

#[test]
fn hnsw_search_orders_all_results() {
    let engine = memory_engine(IndexKind::Hnsw);
    for (id, values) in [
        ("v1", "[1.0, 0.0, 0.0]"),
        ("v2", "[2.0, 0.0, 0.0]"),
        ("v3", "[3.0, 0.0, 0.0]"),
    ] {
        engine
            .execute(&format!(
                "INSERT INTO vectors (id, vector) VALUES ('{id}', {values})"
            ))
            .unwrap();
    }

    let rs = engine
        .execute("SELECT id, distance FROM vectors NEAREST TO [0.0, 0.0, 0.0] LIMIT 3")
        .unwrap();
    assert_eq!(rs.rows.len(), 3);
    assert_eq!(rs.rows[0][0], Value::Str("v1".into()));
    assert_eq!(rs.rows[1][0], Value::Str("v2".into()));
    assert_eq!(rs.rows[2][0], Value::Str("v3".into()));
    let distances: Vec<f32> = rs
        .rows
        .iter()
        .map(|row| match row[1] {
            Value::Float(d) => d,
            _ => panic!("distance column should be a float"),
        })
        .collect();
    assert!(distances.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn nearest_pipeline_finds_closest_of_five() {
    for kind in [IndexKind::Flat, IndexKind::Hnsw] {
        let engine = memory_engine(kind);
        insert_axis_vectors(&engine);

        let rs = engine
            .execute("SELECT id, distance FROM vectors NEAREST TO [1.0, 0.0, 0.0] LIMIT 3")
            .unwrap();
        assert_eq!(rs.rows.len(), 3, "{kind} search should honor the limit");
        assert_eq!(
            rs.rows[0][0],
            Value::Str("vec1".into()),
            "{kind} search should rank the exact match first"
        );
        assert_eq!(rs.rows[0][1], Value::Float(0.0));
    }
}

#[test]
fn metadata_filter_selects_tagged_record() {
    let store = Arc::new(MemoryStore::new());
    let mut metadata = BTreeMap::new();
    metadata.insert("category".to_string(), "image".to_string());
    store
        .insert(&VectorRecord::with_metadata(
            "vec10",
            vec![1.0, 2.0, 3.0],
            metadata,
        ))
        .unwrap();
    store
        .insert(&VectorRecord::new("vec11", vec![3.0, 2.0, 1.0]))
        .unwrap();

    let engine = QueryEngine::new(store, IndexKind::Flat, DistanceMetric::Euclidean);
    let rs = engine
        .execute("SELECT id FROM vectors WHERE metadata.category = 'image'")
        .unwrap();
    assert_eq!(rs.rows, vec![vec![Value::Str("vec10".into())]]);
}

#[test]
fn delete_then_recount_is_safe_to_repeat() {
    let engine = memory_engine(IndexKind::Flat);
    engine
        .execute("INSERT INTO vectors (id, vector) VALUES ('v1', [1.0, 2.0])")
        .unwrap();

    let rs = engine.execute("DELETE FROM vectors WHERE id = 'v1'").unwrap();
    assert_eq!(rs.rows[0][0], Value::Str("Deleted 1 vectors".into()));

    let count = engine.execute("SELECT COUNT(*) FROM vectors").unwrap();
    assert_eq!(count.rows[0][0], Value::Int(0));

    let rs = engine.execute("DELETE FROM vectors WHERE id = 'v1'").unwrap();
    assert_eq!(rs.rows[0][0], Value::Str("Deleted 0 vectors".into()));
}

#[test]
fn acceptance_queries_run_against_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::open(dir.path()).unwrap());
    let engine = QueryEngine::new(store, IndexKind::Hnsw, DistanceMetric::Euclidean);
    insert_axis_vectors(&engine);

    // Point and scan reads
    let rs = engine.execute("SELECT id, dimension FROM vectors").unwrap();
    assert_eq!(rs.rows.len(), 5);

    let rs = engine
        .execute("SELECT id FROM vectors WHERE id = 'vec2'")
        .unwrap();
    assert_eq!(rs.rows, vec![vec![Value::Str("vec2".into())]]);

    let rs = engine
        .execute("SELECT id FROM vectors WHERE id LIKE 'vec%'")
        .unwrap();
    assert_eq!(rs.rows.len(), 5);

    let rs = engine.execute("SELECT COUNT(*) FROM vectors").unwrap();
    assert_eq!(rs.rows[0][0], Value::Int(5));

    // Vector search with explicit metric
    let rs = engine
        .execute("SELECT id, distance FROM vectors NEAREST TO [1.0, 0.0, 0.0] USING euclidean LIMIT 3")
        .unwrap();
    assert_eq!(rs.rows.len(), 3);
    assert_eq!(rs.rows[0][0], Value::Str("vec1".into()));

    // Deletes and collection management
    let rs = engine
        .execute("DELETE FROM vectors WHERE id = 'vec5'")
        .unwrap();
    assert_eq!(rs.rows[0][0], Value::Str("Deleted 1 vectors".into()));

    engine.execute("CREATE COLLECTION vectors (DIMENSION INT)").unwrap();
    let rs = engine.execute("DROP COLLECTION vectors").unwrap();
    assert_eq!(
        rs.rows[0][0],
        Value::Str("Dropped collection 'vectors' (4 vectors deleted)".into())
    );

    // Everything is gone from disk too
    let survivors: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("vec"))
        .collect();
    assert!(survivors.is_empty());
}

#[test]
fn file_store_pipeline_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = Arc::new(FileStore::open(dir.path()).unwrap());
        let engine = QueryEngine::new(store, IndexKind::Flat, DistanceMetric::Euclidean);
        insert_axis_vectors(&engine);
    }

    let store = Arc::new(FileStore::open(dir.path()).unwrap());
    let engine = QueryEngine::new(store, IndexKind::Flat, DistanceMetric::Euclidean);

    let count = engine.execute("SELECT COUNT(*) FROM vectors").unwrap();
    assert_eq!(count.rows[0][0], Value::Int(5));

    // The query vector itself is excluded, so a LIMIT 3 search over the
    // stored id yields two other rows.
    let rs = engine
        .execute("SELECT id, distance FROM vectors NEAREST TO vec1 LIMIT 3")
        .unwrap();
    assert_eq!(rs.rows.len(), 2);
    assert!(rs.rows.iter().all(|row| row[0] != Value::Str("vec1".into())));
}

#[test]
fn like_filters_compose_with_and_or() {
    let engine = memory_engine(IndexKind::Flat);
    insert_axis_vectors(&engine);

    let rs = engine
        .execute("SELECT id FROM vectors WHERE id LIKE 'vec%' AND id != 'vec3'")
        .unwrap();
    assert_eq!(rs.rows.len(), 4);

    let rs = engine
        .execute("SELECT id FROM vectors WHERE id = 'vec1' OR id = 'vec3'")
        .unwrap();
    assert_eq!(rs.rows.len(), 2);
}
