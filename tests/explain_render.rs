//! Explain output and text rendering through the public surface.

use std::sync::Arc;
use vectorsql::distance::DistanceMetric;
use vectorsql::index::IndexKind;
use vectorsql::sql::QueryEngine;
use vectorsql::store::MemoryStore;

fn engine() -> QueryEngine {
    let engine = QueryEngine::new(
        Arc::new(MemoryStore::new()),
        IndexKind::Flat,
        DistanceMetric::Euclidean,
    );
    for (id, values) in [("alpha", "[1.0, 0.0]"), ("beta", "[0.0, 1.0]")] {
        engine
            .execute(&format!(
                "INSERT INTO vectors (id, vector) VALUES ('{id}', {values})"
            ))
            .unwrap();
    }
    engine
}

#[test]
fn explain_id_lookup() {
    let text = engine()
        .explain("SELECT id FROM vectors WHERE id = 'alpha'")
        .unwrap();
    assert!(text.starts_with("ID_LOOKUP (cost=1.00)"));
    assert!(text.contains("Table: vectors"));
    assert!(text.contains("Filter: (id = 'alpha')"));
}

#[test]
fn explain_full_scan_with_limit_reduction() {
    let text = engine().explain("SELECT id FROM vectors LIMIT 3").unwrap();
    assert!(text.starts_with("FULL_SCAN (cost=3.00)"));
    assert!(text.contains("Limit: 3"));

    let text = engine()
        .explain("SELECT id FROM vectors WHERE id LIKE 'a%' LIMIT 3")
        .unwrap();
    assert!(text.starts_with("FULL_SCAN (cost=100.00)"));
}

#[test]
fn explain_vector_search() {
    let text = engine()
        .explain("SELECT id, distance FROM vectors NEAREST TO [1.0, 0.0] USING cosine LIMIT 2")
        .unwrap();
    assert!(text.starts_with("VECTOR_SEARCH (cost=10.00)"));
    assert!(text.contains("Columns: id, distance"));
    assert!(text.contains("Vector: [1.0, 0.0]"));
    assert!(text.contains("Distance: cosine"));
    assert!(text.contains("Limit: 2"));
}

#[test]
fn explain_delete_variants() {
    let engine = engine();
    let text = engine
        .explain("DELETE FROM vectors WHERE id = 'alpha'")
        .unwrap();
    assert!(text.starts_with("ID_LOOKUP"));

    let text = engine
        .explain("DELETE FROM vectors WHERE metadata.kind = 'tmp'")
        .unwrap();
    assert!(text.starts_with("FULL_SCAN"));
}

#[test]
fn explain_does_not_execute() {
    let engine = engine();
    engine
        .explain("DELETE FROM vectors WHERE id = 'alpha'")
        .unwrap();
    // The record is still there.
    let rs = engine
        .execute("SELECT id FROM vectors WHERE id = 'alpha'")
        .unwrap();
    assert_eq!(rs.rows.len(), 1);
}

#[test]
fn render_select_output() {
    let rs = engine()
        .execute("SELECT id, dimension FROM vectors")
        .unwrap();
    let text = rs.render();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].contains("id"));
    assert!(lines[0].contains("dimension"));
    assert!(lines[2].contains("alpha"));
    assert!(lines[3].contains("beta"));
}

#[test]
fn render_message_output() {
    let rs = engine()
        .execute("DELETE FROM vectors WHERE id = 'beta'")
        .unwrap();
    let text = rs.render();
    assert!(text.contains("result"));
    assert!(text.contains("Deleted 1 vectors"));
}

#[test]
fn render_search_output_includes_distance() {
    let rs = engine()
        .execute("SELECT id FROM vectors NEAREST TO [1.0, 0.0] LIMIT 1")
        .unwrap();
    let text = rs.render();
    assert!(text.contains("distance"));
    assert!(text.contains("alpha"));
}
