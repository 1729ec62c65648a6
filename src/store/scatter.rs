use std::collections::HashMap;

use glam::Vec3;
#[cfg(feature = "parallel")]
use parking_lot::Mutex;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::core::types::NodeId;

/// Copies every entry of `source` into `destination`.
///
/// The key space `[0, key_space)` is split into batches of `batch_size`
/// keys. Each batch looks up its keys in `source` and scatters the hits into
/// `destination`. Returns once every batch has finished, with the number of
/// entries copied.
pub(crate) fn scatter_copy(
    source: &HashMap<NodeId, Vec3>,
    destination: &mut HashMap<NodeId, Vec3>,
    key_space: usize,
    batch_size: usize,
) -> usize {
    if source.is_empty() {
        return 0;
    }
    let batch_size = batch_size.max(1);
    let batch_count = key_space.div_ceil(batch_size);

    #[cfg(feature = "parallel")]
    {
        let destination = Mutex::new(destination);
        (0..batch_count).into_par_iter().for_each(|batch| {
            let hits = collect_batch(source, batch, batch_size, key_space);
            if !hits.is_empty() {
                destination.lock().extend(hits);
            }
        });
    }

    #[cfg(not(feature = "parallel"))]
    for batch in 0..batch_count {
        destination.extend(collect_batch(source, batch, batch_size, key_space));
    }

    source.len()
}

fn collect_batch(
    source: &HashMap<NodeId, Vec3>,
    batch: usize,
    batch_size: usize,
    key_space: usize,
) -> Vec<(NodeId, Vec3)> {
    let start = batch * batch_size;
    let end = (start + batch_size).min(key_space);
    (start..end)
        .filter_map(|key| {
            let node = NodeId(key as u16);
            source.get(&node).map(|&position| (node, position))
        })
        .collect()
}
