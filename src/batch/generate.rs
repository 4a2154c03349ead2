use super::{Batch, BatchAction};
use crate::types::{Timestamp, VId};
use rand::Rng;

/// A random action stream over `nv` vertices with uniform endpoints and weight 1.
///
/// Roughly `delete_ratio` of the actions delete an edge inserted earlier in
/// the stream. Action `i` carries time `i + 1`.
pub fn generate_actions<R: Rng>(nv: usize, count: usize, delete_ratio: f64, rng: &mut R) -> Vec<BatchAction> {
    let mut actions: Vec<BatchAction> = Vec::with_capacity(count);
    let mut inserted: Vec<usize> = Vec::new();
    if nv == 0 {
        return actions;
    }
    let delete_ratio = delete_ratio.max(0.0).min(1.0);
    for i in 0..count {
        let time = i as Timestamp + 1;
        if !inserted.is_empty() && rng.gen_bool(delete_ratio) {
            let target = actions[inserted[rng.gen_range(0..inserted.len())]];
            actions.push(BatchAction::delete(target.source, target.destination, time));
        } else {
            inserted.push(actions.len());
            actions.push(BatchAction::insert(
                rng.gen_range(0..nv) as VId,
                rng.gen_range(0..nv) as VId,
                1,
                time,
            ));
        }
    }
    actions
}

/// `num_batches` batches of `batch_size` random insertions, followed by the
/// terminal empty batch.
pub fn random_batches<R: Rng>(nv: usize, batch_size: usize, num_batches: usize, rng: &mut R) -> Vec<Batch> {
    let mut batches: Vec<Batch> = (0..num_batches)
        .map(|b| {
            let actions = generate_actions(nv, batch_size, 0.0, &mut *rng)
                .into_iter()
                .map(|a| BatchAction {
                    time: (b * batch_size) as Timestamp + a.time,
                    ..a
                })
                .collect();
            Batch::new(actions)
        })
        .collect();
    batches.push(Batch::last());
    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_generate_actions() {
        let mut rng = StdRng::seed_from_u64(7);
        let actions = generate_actions(10, 500, 0.3, &mut rng);
        assert_eq!(actions.len(), 500);
        assert!(!actions[0].is_delete());
        let deletes = actions.iter().filter(|a| a.is_delete()).count();
        assert!(deletes > 50 && deletes < 250);
        for (i, a) in actions.iter().enumerate() {
            assert_eq!(a.time, i as Timestamp + 1);
            assert!((0..10).contains(&a.source) && (0..10).contains(&a.destination));
            if a.is_delete() {
                assert!(actions[..i]
                    .iter()
                    .any(|b| !b.is_delete() && (b.source, b.destination) == (a.source, a.destination)));
            }
        }
        assert!(generate_actions(0, 5, 0.0, &mut rng).is_empty());
    }

    #[test]
    fn test_random_batches() {
        let mut rng = StdRng::seed_from_u64(1);
        let batches = random_batches(100, 8, 3, &mut rng);
        assert_eq!(batches.len(), 4);
        assert!(batches[..3].iter().all(|b| b.keep_alive && b.actions.len() == 8));
        assert_eq!(batches[3], Batch::last());
        assert_eq!(batches[2].actions[7].time, 24);
    }
}
