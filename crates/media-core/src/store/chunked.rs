use bytes::Bytes;

use super::PayloadUnit;

/// Split `data` into consecutive `chunk_size` slices; the tail may be shorter
pub(super) fn split(data: &Bytes, chunk_size: usize) -> Vec<PayloadUnit> {
    (0..data.len())
        .step_by(chunk_size)
        .map(|start| {
            let end = (start + chunk_size).min(data.len());
            PayloadUnit::raw(data.slice(start..end))
        })
        .collect()
}
