use rand::{rngs::StdRng, SeedableRng};
use std::collections::BTreeMap;
use tempfile::NamedTempFile;
use tempograph::{
    batch::{generate_actions, Operation},
    csr::edge_list_to_csr,
    snapshot::{read_action_stream, read_graph_snapshot, write_action_stream, write_graph_snapshot},
    Batch, BatchSession, CsrFields, EdgeList, GraphConfig,
};

const NV: usize = 200;

fn create_initial_graph() -> EdgeList {
    let (mut sources, mut destinations, mut weights) = (vec![], vec![], vec![]);
    for s in 0..NV as i64 {
        for k in 1..=(s % 7) {
            sources.push(s);
            destinations.push((s * 13 + k * 29) % NV as i64);
            weights.push(k);
        }
    }
    EdgeList::new(sources, destinations).with_weights(weights)
}

#[test]
fn test_replay_matches_reference() {
    let list = create_initial_graph();
    let graph_file = NamedTempFile::new().unwrap();
    write_graph_snapshot(graph_file.path(), &edge_list_to_csr(NV, &list).unwrap()).unwrap();

    let mut rng = StdRng::seed_from_u64(2021);
    let actions_file = NamedTempFile::new().unwrap();
    write_action_stream(actions_file.path(), &generate_actions(NV, 5000, 0.25, &mut rng)).unwrap();

    let csr = read_graph_snapshot(graph_file.path()).unwrap();
    let actions = read_action_stream(actions_file.path()).unwrap();
    assert_eq!(actions.len(), 5000);

    let mut reference: BTreeMap<(i64, i64), i64> = BTreeMap::new();
    for ((&s, &d), &w) in list
        .sources
        .iter()
        .zip(list.destinations.iter())
        .zip(list.weights.as_ref().unwrap().iter())
    {
        reference.insert((s, d), w);
    }
    for a in actions.iter() {
        match a.operation {
            Operation::Insert => {
                reference.insert((a.source, a.destination), a.weight);
            }
            Operation::Delete => {
                reference.remove(&(a.source, a.destination));
            }
        }
    }

    let graph = csr.to_graph(GraphConfig::new(NV).num_etypes(1).initial_blocks(16), 0, 0).unwrap();
    let mut session = BatchSession::new(&graph);
    let mut chunks = actions.chunks(512).peekable();
    while let Some(chunk) = chunks.next() {
        let batch = Batch::new(chunk.to_vec()).keep_alive(chunks.peek().is_some());
        session.receive(&batch).unwrap();
    }
    assert!(!session.is_open());
    assert_eq!(session.totals().applied(), 5000);
    assert_eq!(graph.total_edges(), reference.len());

    let sorted = graph.to_sorted_csr(CsrFields::all()).unwrap();
    assert_eq!(sorted.num_edges(), reference.len());
    let extracted: BTreeMap<(i64, i64), i64> = (0..NV)
        .flat_map(|v| sorted.row(v).map(move |i| (v, i)))
        .map(|(v, i)| ((v as i64, sorted.ind()[i]), sorted.weight().unwrap()[i]))
        .collect();
    assert_eq!(extracted, reference);

    let unsorted = graph.to_unsorted_csr(CsrFields::none()).unwrap();
    assert_eq!(unsorted.off(), sorted.off());
    for v in 0..NV {
        let mut row = unsorted.neighbors(v).to_vec();
        row.sort();
        assert_eq!(row, sorted.neighbors(v));
    }
}

#[test]
fn test_snapshot_round_trip_through_store() {
    let list = create_initial_graph();
    let graph = tempograph::csr::edge_list_to_graph(GraphConfig::new(NV).num_etypes(1), &list, 7).unwrap();
    let csr = graph.to_sorted_csr(CsrFields::weights()).unwrap();
    let file = NamedTempFile::new().unwrap();
    write_graph_snapshot(file.path(), &csr).unwrap();
    let read = read_graph_snapshot(file.path()).unwrap();
    assert_eq!(read.off(), csr.off());
    assert_eq!(read.ind(), csr.ind());
    assert_eq!(read.weight(), csr.weight());
    assert_eq!(graph.stats().num_edges(), csr.num_edges());
}
