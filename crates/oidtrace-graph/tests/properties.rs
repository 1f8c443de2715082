use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use oidtrace_graph::{AnalysisConfig, BuildSource, GraphSession};
use oidtrace_store::{InMemoryObjectStore, Record, Value};
use oidtrace_types::Oid;
use proptest::prelude::*;

const MAX_NODES: u64 = 12;
const MAX_EDGES: usize = 30;

/// Attribute names the scorer treats differently, plus neutral ones.
const ATTR_NAMES: &[&str] = &["ids", "refs", "_tree", "_firstbucket", "child", "parent"];
const IDENTIFIERS: &[&str] = &["site", "ldapauth", "IIntIds"];

#[derive(Clone, Debug)]
struct Graph {
    nodes: u64,
    /// Per node: identifier choice (`None` or an index into `IDENTIFIERS`).
    identifiers: Vec<Option<usize>>,
    /// (source, target, attribute name index)
    edges: Vec<(u64, u64, usize)>,
}

fn graph_strategy() -> impl Strategy<Value = Graph> {
    (1..=MAX_NODES).prop_flat_map(|nodes| {
        (
            prop::collection::vec(prop::option::weighted(0.3, 0..IDENTIFIERS.len()), nodes as usize),
            prop::collection::vec((0..nodes, 0..nodes, 0..ATTR_NAMES.len()), 0..=MAX_EDGES),
        )
            .prop_map(move |(identifiers, edges)| Graph {
                nodes,
                identifiers,
                edges,
            })
    })
}

/// Lay a graph out as records. A name already taken on a source sends the
/// reference into an unnamed list instead.
fn build_store(graph: &Graph) -> Arc<InMemoryObjectStore> {
    let mut records: BTreeMap<u64, Record> = (0..graph.nodes)
        .map(|n| {
            let mut record = Record::new(format!("Node{n}"));
            if let Some(i) = graph.identifiers[n as usize] {
                record = record.with_identifier(IDENTIFIERS[i]);
            }
            (n, record)
        })
        .collect();

    for (source, target, name) in &graph.edges {
        let record = records.get_mut(source).expect("source node exists");
        let name = ATTR_NAMES[*name];
        if record.attrs.contains_key(name) {
            let spill = record
                .attrs
                .entry("spill".to_string())
                .or_insert_with(|| Value::List(Vec::new()));
            if let Value::List(items) = spill {
                items.push(Value::Ref(Oid::from_u64(*target)));
            }
        } else {
            record.attrs.insert(name.to_string(), Value::Ref(Oid::from_u64(*target)));
        }
    }

    let store = Arc::new(InMemoryObjectStore::new(Oid::from_u64(0)));
    store
        .commit(records.into_iter().map(|(n, r)| (Oid::from_u64(n), r)))
        .expect("records encode");
    store
}

fn built_session(store: Arc<InMemoryObjectStore>) -> GraphSession {
    let mut session = GraphSession::from_store(store, AnalysisConfig::without_cache());
    session.build().expect("in-memory build succeeds");
    session
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 96,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn back_references_are_the_transpose(graph in graph_strategy()) {
        let session = built_session(build_store(&graph));
        let maps = session.maps().unwrap();

        for (source, targets) in maps.forward() {
            prop_assert!(!targets.is_empty());
            for target in targets {
                prop_assert!(maps.back_references(target).contains(source));
                prop_assert!(maps.oids().contains(target));
            }
            prop_assert!(maps.oids().contains(source));
        }
        for (target, sources) in maps.backward() {
            for source in sources {
                prop_assert!(maps.references(source).contains(target));
            }
        }
        prop_assert!(maps.oids().contains(&session.root_oid()));
    }

    #[test]
    fn cache_reload_matches_walk(graph in graph_strategy()) {
        let dir = tempfile::tempdir().unwrap();
        let config = AnalysisConfig {
            cache_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let store = build_store(&graph);

        let mut walked = GraphSession::from_store(store.clone(), config.clone());
        prop_assert_eq!(walked.build().unwrap(), BuildSource::Scratch);
        let mut reloaded = GraphSession::from_store(store, config);
        prop_assert_eq!(reloaded.build().unwrap(), BuildSource::Cache);

        prop_assert_eq!(walked.maps().unwrap(), reloaded.maps().unwrap());
    }

    #[test]
    fn paths_are_cycle_free_chains_of_back_references(graph in graph_strategy()) {
        let mut session = built_session(build_store(&graph));
        let oids: Vec<Oid> = session.oids().unwrap().iter().copied().collect();

        for oid in oids {
            let path = session.get_oid_path(oid).unwrap();
            prop_assert_eq!(path[0], oid);

            let unique: HashSet<&Oid> = path.iter().collect();
            prop_assert_eq!(unique.len(), path.len());

            for step in path.windows(2) {
                prop_assert!(session.get_back_references(step[0]).unwrap().contains(&step[1]));
            }

            let ids = session.get_id_path(oid).unwrap();
            prop_assert_eq!(ids.len(), path.len());
        }
    }

    #[test]
    fn first_step_has_minimal_score(graph in graph_strategy()) {
        let store = build_store(&graph);
        let oids: Vec<Oid> = built_session(store.clone()).oids().unwrap().iter().copied().collect();

        for oid in oids {
            // A fresh session per query so no cached path decides the first step.
            let mut session = built_session(store.clone());
            let path = session.get_oid_path(oid).unwrap();
            let candidates: Vec<Oid> = session
                .get_back_references(oid)
                .unwrap()
                .iter()
                .copied()
                .filter(|c| *c != oid)
                .collect();

            if candidates.is_empty() {
                prop_assert_eq!(path.len(), 1);
                continue;
            }
            prop_assert!(path.len() > 1);
            let mut scored = Vec::new();
            for c in candidates {
                let score = session.score(c, oid).unwrap();
                prop_assert!(score <= 100);
                scored.push((score, c));
            }
            let best = scored.iter().min().map(|(_, c)| *c);
            prop_assert_eq!(Some(path[1]), best);

            // The suffix is served back unchanged.
            let suffix = session.get_oid_path(path[1]).unwrap();
            prop_assert_eq!(&suffix[..], &path[1..]);
        }
    }

    #[test]
    fn scores_are_repeatable(graph in graph_strategy()) {
        let store = build_store(&graph);
        let mut first = built_session(store.clone());
        let mut second = built_session(store);
        let edges: Vec<(Oid, Oid)> = first.maps().unwrap().edges().collect();

        for (source, target) in edges {
            let a = first.score(source, target).unwrap();
            prop_assert_eq!(a, first.score(source, target).unwrap());
            prop_assert_eq!(a, second.score(source, target).unwrap());
        }
    }
}
