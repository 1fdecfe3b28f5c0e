//! Whole-pipeline checks of the Sankey builder on generated tables

use std::collections::{BTreeMap, HashSet};

use spotify_dashboard::{
    SankeyError, SankeyOptions, Table, Value, code_labels, make_sankey, stack_columns,
};

/// Deterministic table of `rows` songs with a few categorical columns
fn generated_table(rows: usize, seed: u64) -> Table {
    let keys = ["a", "a#", "b", "c", "c#", "d"];
    let modes = ["major", "minor"];
    let mut state = seed;
    let mut next = || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 33) as usize
    };

    let data = (0..rows)
        .map(|_| {
            vec![
                Value::Int(2015 + (next() % 9) as i64),
                Value::from(keys[next() % keys.len()]),
                Value::from(modes[next() % modes.len()]),
                Value::Int((next() % 1000) as i64),
            ]
        })
        .collect();
    Table::from_rows(["released_year", "key", "mode", "streams"], data).unwrap()
}

#[test]
fn test_counts_are_conserved_per_hop() {
    let table = generated_table(500, 7);
    let columns = ["released_year", "key", "mode"];
    let spec = make_sankey(&table, &columns, None, &SankeyOptions::default()).unwrap();

    // every row contributes one unit to each of the two hops
    assert_eq!(spec.total_value(), 1000.0);
}

#[test]
fn test_weights_match_manual_sum() {
    let table = generated_table(300, 11);
    let edges = stack_columns(&table, &["key", "mode"], "streams").unwrap();

    let mut expected: BTreeMap<(Value, Value), f64> = BTreeMap::new();
    for row in table.rows() {
        *expected
            .entry((row[1].clone(), row[2].clone()))
            .or_insert(0.0) += row[3].as_f64().unwrap();
    }

    assert_eq!(edges.len(), expected.len());
    for edge in &edges.edges {
        assert_eq!(
            expected[&(edge.source.clone(), edge.target.clone())],
            edge.weight
        );
    }
}

#[test]
fn test_codes_form_a_bijection() {
    let table = generated_table(200, 3);
    let edges = stack_columns(&table, &["released_year", "key", "mode"], "streams").unwrap();
    let codes = code_labels(&edges);

    let distinct: HashSet<&Value> = codes.labels.iter().collect();
    assert_eq!(distinct.len(), codes.labels.len());

    for (link, edge) in codes.links.iter().zip(&edges.edges) {
        assert_eq!(codes.label(link.source), Some(&edge.source));
        assert_eq!(codes.label(link.target), Some(&edge.target));
        assert_eq!(link.weight, edge.weight);
    }
}

#[test]
fn test_row_order_does_not_change_the_diagram() {
    let table = generated_table(250, 42);
    let mut reversed_rows = table.rows().to_vec();
    reversed_rows.reverse();
    let reversed = Table::from_rows(table.columns().to_vec(), reversed_rows).unwrap();

    let columns = ["released_year", "mode"];
    let options = SankeyOptions::default();
    assert_eq!(
        make_sankey(&table, &columns, None, &options).unwrap(),
        make_sankey(&reversed, &columns, None, &options).unwrap()
    );
}

#[test]
fn test_shared_label_across_columns_gets_one_node() {
    let table = Table::from_rows(
        ["from", "to"],
        vec![
            vec!["x".into(), "y".into()],
            vec!["y".into(), "z".into()],
        ],
    )
    .unwrap();
    let spec = make_sankey(&table, &["from", "to"], None, &SankeyOptions::default()).unwrap();

    assert_eq!(spec.nodes, vec!["x", "y", "z"]);
    assert_eq!(spec.links[0].target, spec.links[1].source);
}

#[test]
fn test_boundaries() {
    let table = generated_table(10, 1);
    let options = SankeyOptions::default();

    assert!(matches!(
        make_sankey(&table, &[], None, &options),
        Err(SankeyError::InsufficientColumns(0))
    ));
    assert!(matches!(
        make_sankey(&table, &["key"], None, &options),
        Err(SankeyError::InsufficientColumns(1))
    ));
    assert!(matches!(
        make_sankey(&table, &["key", "genre"], None, &options),
        Err(SankeyError::ColumnNotFound(name)) if name == "genre"
    ));

    let empty = Table::new(["key", "mode"]).unwrap();
    let spec = make_sankey(&empty, &["key", "mode"], None, &options).unwrap();
    assert!(spec.is_empty());
}
